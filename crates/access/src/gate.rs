use crate::{
    AccessError, Capability, ResolvedSubscription, StoredTier, SubscriptionSource,
    SubscriptionStatus, resolve_subscription,
};

/// Everything the gate needs to know about the requester.
///
/// Built once per request and passed by reference; the gate never reaches
/// into request state on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessContext {
    pub user_id: Option<String>,
    pub subscription: ResolvedSubscription,
}

impl AccessContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn member(user_id: impl Into<String>, subscription: ResolvedSubscription) -> Self {
        Self {
            user_id: Some(user_id.into()),
            subscription,
        }
    }

    /// Resolves the subscription of `user_id`, or builds an anonymous context.
    pub async fn load<S>(source: &S, user_id: Option<&str>) -> Result<Self, AccessError>
    where
        S: SubscriptionSource + ?Sized,
    {
        let Some(user_id) = user_id else {
            return Ok(Self::anonymous());
        };

        let subscription = resolve_subscription(source, user_id).await?;

        Ok(Self::member(user_id, subscription))
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn check(&self, capability: Capability) -> Result<(), AccessError> {
        check(self, capability)
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.check(capability).is_ok()
    }

    /// Capabilities currently granted, in ladder order.
    pub fn granted(&self) -> Vec<Capability> {
        use strum::VariantArray;

        Capability::VARIANTS
            .iter()
            .copied()
            .filter(|capability| self.allows(*capability))
            .collect()
    }
}

/// Boolean form of the gate for a tier and status pair.
pub fn allow(tier: &StoredTier, status: SubscriptionStatus, capability: Capability) -> bool {
    evaluate(tier, status, capability).is_ok()
}

/// Full gate: identity first, then subscription status, then tier rank.
pub fn check(context: &AccessContext, capability: Capability) -> Result<(), AccessError> {
    if context.is_anonymous() && capability.requires_identity() {
        tracing::debug!(%capability, "Anonymous request denied");
        return Err(AccessError::AuthenticationRequired);
    }

    let result = evaluate(
        &context.subscription.tier,
        context.subscription.status,
        capability,
    );

    if let Err(denial) = &result {
        tracing::info!(
            user_id = context.user_id.as_deref().unwrap_or("anonymous"),
            tier = %context.subscription.tier,
            status = %context.subscription.status,
            %capability,
            reason = %denial,
            "Access denied"
        );
    }

    result
}

fn evaluate(
    tier: &StoredTier,
    status: SubscriptionStatus,
    capability: Capability,
) -> Result<(), AccessError> {
    let required_tier = capability.minimum_tier();

    if !status.is_active() && required_tier.rank() > 0 {
        return Err(AccessError::SubscriptionInactive {
            current_tier: tier.clone(),
            status,
        });
    }

    if tier.rank() < required_tier.rank() {
        return Err(AccessError::InsufficientTier {
            current_tier: tier.clone(),
            required_tier,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use strum::VariantArray;

    use super::*;
    use crate::Tier;

    fn member(tier: &str, status: SubscriptionStatus) -> AccessContext {
        AccessContext::member(
            "user-1",
            ResolvedSubscription::new(StoredTier::parse(tier), status),
        )
    }

    #[test]
    fn higher_tiers_keep_every_lower_capability() {
        for low in Tier::VARIANTS {
            for high in Tier::VARIANTS.iter().filter(|t| t.rank() > low.rank()) {
                for capability in Capability::VARIANTS {
                    if allow(&(*low).into(), SubscriptionStatus::Active, *capability) {
                        assert!(
                            allow(&(*high).into(), SubscriptionStatus::Active, *capability),
                            "{capability} allowed at {low} but not at {high}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn inactive_status_denies_every_paid_capability() {
        let paid = Capability::VARIANTS
            .iter()
            .filter(|c| c.minimum_tier().rank() > 0);

        for capability in paid {
            for status in SubscriptionStatus::VARIANTS
                .iter()
                .filter(|s| !s.is_active())
            {
                for tier in Tier::VARIANTS {
                    assert!(!allow(&(*tier).into(), *status, *capability));
                }
            }
        }
    }

    #[test]
    fn scout_cannot_contact_players() {
        let err = member("scout", SubscriptionStatus::Active)
            .check(Capability::ContactPlayer)
            .unwrap_err();

        match err {
            AccessError::InsufficientTier {
                current_tier,
                required_tier,
            } => {
                assert_eq!(current_tier.as_str(), "scout");
                assert_eq!(required_tier, Tier::Pro);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn past_due_pro_is_inactive_not_insufficient() {
        let err = member("pro", SubscriptionStatus::PastDue)
            .check(Capability::ViewFullMatch)
            .unwrap_err();

        assert!(matches!(
            err,
            AccessError::SubscriptionInactive {
                status: SubscriptionStatus::PastDue,
                ..
            }
        ));
    }

    #[test]
    fn anonymous_needs_to_authenticate_for_paid_actions() {
        let anonymous = AccessContext::anonymous();

        assert!(matches!(
            anonymous.check(Capability::SavePlayer),
            Err(AccessError::AuthenticationRequired)
        ));
        assert!(anonymous.allows(Capability::ViewHighlights));
        assert!(anonymous.allows(Capability::BrowsePlayers));
    }

    #[test]
    fn unknown_tier_is_denied_everything() {
        let context = member("gold", SubscriptionStatus::Active);

        for capability in Capability::VARIANTS {
            assert!(!context.allows(*capability), "{capability}");
        }
    }

    #[test]
    fn inactive_member_keeps_the_free_set() {
        let context = member("club", SubscriptionStatus::Cancelled);

        assert_eq!(
            context.granted(),
            vec![Capability::ViewHighlights, Capability::BrowsePlayers]
        );
    }

    #[test]
    fn gate_is_a_pure_function() {
        let context = member("scout", SubscriptionStatus::Active);

        let first = context.allows(Capability::ViewFullMatch);
        let second = context.allows(Capability::ViewFullMatch);

        assert!(first);
        assert_eq!(first, second);
    }
}
