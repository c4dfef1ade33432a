use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// Semantic tag of a highlight clip.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum HighlightType {
    Goal,
    Assist,
    Dribbling,
    Defending,
    Tackling,
    Passing,
    Shooting,
    Heading,
    Speed,
    Save,
    Distribution,
    Positioning,
    Vision,
    Other,
}

impl HighlightType {
    pub fn label(self) -> &'static str {
        match self {
            HighlightType::Goal => "Goal",
            HighlightType::Assist => "Assist",
            HighlightType::Dribbling => "Dribbling",
            HighlightType::Defending => "Defending",
            HighlightType::Tackling => "Tackling",
            HighlightType::Passing => "Passing",
            HighlightType::Shooting => "Shooting",
            HighlightType::Heading => "Heading",
            HighlightType::Speed => "Speed",
            HighlightType::Save => "Save",
            HighlightType::Distribution => "Distribution",
            HighlightType::Positioning => "Positioning",
            HighlightType::Vision => "Vision",
            HighlightType::Other => "Other",
        }
    }

    /// Positions this kind of clip is usually recorded for.
    pub fn suggested_positions(self) -> &'static [&'static str] {
        match self {
            HighlightType::Goal => &["forward", "midfielder", "winger"],
            HighlightType::Assist => &["midfielder", "winger", "forward"],
            HighlightType::Dribbling => &["winger", "midfielder", "forward"],
            HighlightType::Defending => &["defender", "defensive_midfielder"],
            HighlightType::Tackling => &["defender", "midfielder"],
            HighlightType::Passing => &["midfielder", "defender"],
            HighlightType::Shooting => &["forward", "midfielder"],
            HighlightType::Heading => &["defender", "forward"],
            HighlightType::Speed => &["winger", "fullback", "forward"],
            HighlightType::Save | HighlightType::Distribution => &["goalkeeper"],
            HighlightType::Positioning => &["defender", "midfielder"],
            HighlightType::Vision => &["midfielder", "playmaker"],
            HighlightType::Other => &[],
        }
    }
}

/// Moderation state of a highlight. Only approved clips are public.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
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
pub enum HighlightStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

impl HighlightStatus {
    pub fn is_public(self) -> bool {
        self == HighlightStatus::Approved
    }
}
