use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier prefix shared by every interview-round stage.
pub const INTERVIEW_ROUND_PREFIX: &str = "interview_round_";

/// The closed set of standard pipeline stages.
///
/// Interview rounds live outside this enum because their count is unbounded;
/// see [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardStage {
    Wishlist,
    RecruiterReachout,
    SelfReview,
    HrShortlist,
    HmShortlist,
    Offer,
}

impl StandardStage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Wishlist,
            Self::RecruiterReachout,
            Self::SelfReview,
            Self::HrShortlist,
            Self::HmShortlist,
            Self::Offer,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Wishlist => "wishlist",
            Self::RecruiterReachout => "recruiter_reachout",
            Self::SelfReview => "self_review",
            Self::HrShortlist => "hr_shortlist",
            Self::HmShortlist => "hm_shortlist",
            Self::Offer => "offer",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Wishlist => "Wishlist",
            Self::RecruiterReachout => "Recruiter Reachout",
            Self::SelfReview => "Self Review",
            Self::HrShortlist => "HR Shortlist",
            Self::HmShortlist => "Hiring Manager Shortlist",
            Self::Offer => "Offer",
        }
    }

    fn from_id(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|stage| stage.id() == raw)
    }
}

/// Coarse grouping of stages consumed by list filtering and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Active,
    Offer,
    Archived,
}

impl Milestone {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Offer => "offer",
            Self::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "offer" => Some(Self::Offer),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Validation errors raised by the stage registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("unrecognized stage identifier '{0}'")]
    InvalidStage(String),
    #[error("interview round number must be positive, got {0}")]
    InvalidRound(u32),
}

/// A validated stage value: a member of the fixed standard set or a numbered
/// interview round.
///
/// The persisted representation is the identifier string (`"hr_shortlist"`,
/// `"interview_round_2"`); `Stage` serializes to and from exactly that form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Standard(StandardStage),
    InterviewRound(u32),
}

impl Stage {
    /// The single validation authority for raw stage strings.
    pub fn parse(raw: &str) -> Result<Self, StageError> {
        if let Some(stage) = StandardStage::from_id(raw) {
            return Ok(Self::Standard(stage));
        }
        if let Some(round) = parse_interview_round(raw) {
            return Ok(Self::InterviewRound(round));
        }
        Err(StageError::InvalidStage(raw.to_string()))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    /// Builds an interview-round stage, rejecting round 0.
    pub fn interview_round(round: u32) -> Result<Self, StageError> {
        if round == 0 {
            return Err(StageError::InvalidRound(round));
        }
        Ok(Self::InterviewRound(round))
    }

    pub const fn wishlist() -> Self {
        Self::Standard(StandardStage::Wishlist)
    }

    pub const fn interview_round_number(&self) -> Option<u32> {
        match self {
            Self::InterviewRound(round) => Some(*round),
            Self::Standard(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Standard(stage) => stage.label().to_string(),
            Self::InterviewRound(round) => format!("Interview Round {round}"),
        }
    }

    /// Milestone of the stage alone; archival is layered on by the
    /// application record.
    pub const fn milestone(&self) -> Milestone {
        match self {
            Self::Standard(StandardStage::Offer) => Milestone::Offer,
            _ => Milestone::Active,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(stage) => f.write_str(stage.id()),
            Self::InterviewRound(round) => write!(f, "{INTERVIEW_ROUND_PREFIX}{round}"),
        }
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}

/// Extracts the round number from an `interview_round_<n>` identifier.
///
/// Only the canonical decimal form is accepted: no sign, no leading zeros,
/// so that `format_interview_round(parse_interview_round(s)) == s` holds for
/// every accepted input.
pub fn parse_interview_round(raw: &str) -> Option<u32> {
    let digits = raw.strip_prefix(INTERVIEW_ROUND_PREFIX)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Produces the `interview_round_<n>` identifier for a positive round.
pub fn format_interview_round(round: u32) -> Result<String, StageError> {
    if round == 0 {
        return Err(StageError::InvalidRound(round));
    }
    Ok(format!("{INTERVIEW_ROUND_PREFIX}{round}"))
}
