use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// Paid plans, ordered from the cheapest to the most complete.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Scout,
    Pro,
    Club,
}

impl Tier {
    pub const fn rank(self) -> i8 {
        match self {
            Tier::Free => 0,
            Tier::Scout => 1,
            Tier::Pro => 2,
            Tier::Club => 3,
        }
    }

    /// Every capability unlocked at this tier, lower tiers included.
    pub fn capabilities(self) -> Vec<Capability> {
        Capability::VARIANTS
            .iter()
            .copied()
            .filter(|capability| capability.minimum_tier().rank() <= self.rank())
            .collect()
    }

    /// Tiers that can be bought through checkout.
    pub fn is_paid(self) -> bool {
        self != Tier::Free
    }
}

/// Tier value exactly as stored on a subscription row.
///
/// Anything outside the ladder ranks below free and is denied everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredTier {
    Known(Tier),
    Unrecognized(String),
}

impl StoredTier {
    pub fn parse(raw: &str) -> Self {
        raw.parse::<Tier>()
            .map(StoredTier::Known)
            .unwrap_or_else(|_| StoredTier::Unrecognized(raw.to_owned()))
    }

    pub fn rank(&self) -> i8 {
        match self {
            StoredTier::Known(tier) => tier.rank(),
            StoredTier::Unrecognized(_) => -1,
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            StoredTier::Known(tier) => Some(*tier),
            StoredTier::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StoredTier::Known(tier) => tier.as_ref(),
            StoredTier::Unrecognized(raw) => raw,
        }
    }
}

impl Default for StoredTier {
    fn default() -> Self {
        StoredTier::Known(Tier::Free)
    }
}

impl From<Tier> for StoredTier {
    fn from(value: Tier) -> Self {
        StoredTier::Known(value)
    }
}

impl fmt::Display for StoredTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StoredTier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewHighlights,
    BrowsePlayers,
    ViewFullMatch,
    SavePlayer,
    AdvancedSearch,
    ContactPlayer,
    BulkAccess,
}

impl Capability {
    pub const fn minimum_tier(self) -> Tier {
        match self {
            Capability::ViewHighlights | Capability::BrowsePlayers => Tier::Free,
            Capability::ViewFullMatch | Capability::SavePlayer | Capability::AdvancedSearch => {
                Tier::Scout
            }
            Capability::ContactPlayer => Tier::Pro,
            Capability::BulkAccess => Tier::Club,
        }
    }

    /// Capabilities above the free set need a signed-in user.
    pub const fn requires_identity(self) -> bool {
        self.minimum_tier().rank() > 0
    }
}
