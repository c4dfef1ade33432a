use sea_query::Iden;

#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    Role,
    EmailVerified,
    IsActive,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Subscriptions {
    Table,
    Id,
    UserId,
    Tier,
    Status,
    CurrentPeriodEnd,
}

#[derive(Iden, Clone, Copy)]
pub enum Academies {
    Table,
    Id,
    Name,
    Description,
    Country,
    State,
    City,
    Address,
    Phone,
    Email,
    Website,
    LogoUrl,
    FoundedYear,
    IsVerified,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Tournaments {
    Table,
    Id,
    Name,
    Year,
    Description,
    Location,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Players {
    Table,
    Id,
    FirstName,
    LastName,
    DateOfBirth,
    Position,
    PreferredFoot,
    HeightCm,
    WeightKg,
    Country,
    State,
    City,
    School,
    Bio,
    VerificationStatus,
    ProfilePhotoUrl,
    ThumbnailUrl,
    TournamentId,
    AcademyId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Matches {
    Table,
    Id,
    TournamentId,
    AcademyId,
    Title,
    MatchDate,
    Location,
    Stage,
    HomeTeam,
    AwayTeam,
    HomeScore,
    AwayScore,
    MatchNumber,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum MatchPlayers {
    Table,
    Id,
    MatchId,
    PlayerId,
    Team,
    JerseyNumber,
    Position,
    IsStarter,
    MinutesPlayed,
    Goals,
    Assists,
    YellowCards,
    RedCards,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum MatchVideos {
    Table,
    Id,
    MatchId,
    VideoKey,
    ThumbnailUrl,
    DurationSeconds,
    FileSizeBytes,
    Status,
    PriceCents,
    Currency,
    ViewCount,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum PlayerHighlights {
    Table,
    Id,
    PlayerId,
    MatchId,
    HighlightType,
    ThumbnailUrl,
    Title,
    Description,
    TimestampInMatch,
    Status,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum ContactRequests {
    Table,
    Id,
    UserId,
    PlayerId,
    Message,
    Status,
    FollowUpAt,
    CreatedAt,
    UpdatedAt,
}
