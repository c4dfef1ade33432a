use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{AccessError, HighlightType};

/// One line-up entry of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchParticipation {
    pub is_starter: bool,
    pub minutes_played: Option<i64>,
}

/// Approved highlights of a player sharing the same raw type value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightTally {
    pub highlight_type: String,
    pub count: i64,
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn find_match_participation_by_player(
        &self,
        player_id: &str,
    ) -> anyhow::Result<Vec<MatchParticipation>>;

    async fn find_approved_highlights_by_player(
        &self,
        player_id: &str,
    ) -> anyhow::Result<Vec<HighlightTally>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlayerStats {
    pub season: String,
    pub matches_played: i64,
    pub matches_started: i64,
    pub minutes_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub shooting: i64,
    pub dribbling: i64,
    pub passing: i64,
    pub heading: i64,
    pub speed: i64,
    pub defending: i64,
    pub tackling: i64,
    pub saves: i64,
    pub distribution: i64,
    pub positioning: i64,
    pub vision: i64,
    pub other: i64,
    pub total_highlights: i64,
}

impl PlayerStats {
    fn counter_mut(&mut self, highlight_type: HighlightType) -> &mut i64 {
        match highlight_type {
            HighlightType::Goal => &mut self.goals,
            HighlightType::Assist => &mut self.assists,
            HighlightType::Dribbling => &mut self.dribbling,
            HighlightType::Defending => &mut self.defending,
            HighlightType::Tackling => &mut self.tackling,
            HighlightType::Passing => &mut self.passing,
            HighlightType::Shooting => &mut self.shooting,
            HighlightType::Heading => &mut self.heading,
            HighlightType::Speed => &mut self.speed,
            HighlightType::Save => &mut self.saves,
            HighlightType::Distribution => &mut self.distribution,
            HighlightType::Positioning => &mut self.positioning,
            HighlightType::Vision => &mut self.vision,
            HighlightType::Other => &mut self.other,
        }
    }
}

/// Season label such as `2025-26`. A new season starts in August.
pub fn season_label(today: NaiveDate) -> String {
    let start = if today.month() >= 8 {
        today.year()
    } else {
        today.year() - 1
    };

    format!("{}-{:02}", start, (start + 1).rem_euclid(100))
}

/// Merges line-up rows and approved highlight tallies.
///
/// Returns `None` when there is nothing to report. Type matching ignores
/// case; values outside the fixed set only count toward the total.
pub fn aggregate(
    participation: &[MatchParticipation],
    highlights: &[HighlightTally],
    today: NaiveDate,
) -> Option<PlayerStats> {
    let total_highlights: i64 = highlights.iter().map(|tally| tally.count).sum();

    if participation.is_empty() && total_highlights == 0 {
        return None;
    }

    let mut stats = PlayerStats {
        season: season_label(today),
        matches_played: participation.len() as i64,
        matches_started: participation.iter().filter(|p| p.is_starter).count() as i64,
        minutes_played: participation.iter().filter_map(|p| p.minutes_played).sum(),
        total_highlights,
        ..Default::default()
    };

    for tally in highlights {
        match tally.highlight_type.to_lowercase().parse::<HighlightType>() {
            Ok(highlight_type) => *stats.counter_mut(highlight_type) += tally.count,
            Err(_) => tracing::debug!(
                highlight_type = %tally.highlight_type,
                "Highlight type outside the fixed set"
            ),
        }
    }

    Some(stats)
}

/// Loads both aggregations for a player concurrently and merges them.
pub async fn compute_stats<S>(
    source: &S,
    player_id: &str,
    today: NaiveDate,
) -> Result<Option<PlayerStats>, AccessError>
where
    S: StatsSource + ?Sized,
{
    let (participation, highlights) = futures::try_join!(
        source.find_match_participation_by_player(player_id),
        source.find_approved_highlights_by_player(player_id),
    )
    .map_err(AccessError::TransientStore)?;

    Ok(aggregate(&participation, &highlights, today))
}
