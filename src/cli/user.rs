use unicorn_sport::{Config, auth::Role, query};
use unicorn_sport_access::{SubscriptionStatus, Tier};

pub async fn set_role(config: &Config, email: &str, role: Role) -> anyhow::Result<()> {
    let pool = unicorn_sport::create_pool(&config.database.url, 1).await?;
    let email = email.trim().to_lowercase();

    let Some(user) = query::user::find_by_email(&pool, &email).await? else {
        tracing::error!("user {email} not found");
        return Ok(());
    };

    query::user::update_access(&pool, &user.id, None, Some(role), query::now()).await?;

    tracing::info!("{email} is now {role}");

    Ok(())
}

/// Grants a tier without going through checkout. The next webhook for the
/// account still overrides it.
pub async fn set_tier(config: &Config, email: &str, tier: Tier) -> anyhow::Result<()> {
    let pool = unicorn_sport::create_pool(&config.database.url, 1).await?;
    let email = email.trim().to_lowercase();

    let Some(user) = query::user::find_by_email(&pool, &email).await? else {
        tracing::error!("user {email} not found");
        return Ok(());
    };

    query::subscription::upsert_tier(
        &pool,
        &user.id,
        tier,
        SubscriptionStatus::Active,
        query::now(),
    )
    .await?;

    tracing::info!("{email} is now on the {tier} tier");

    Ok(())
}
