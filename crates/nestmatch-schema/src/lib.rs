use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod question_presets;

pub use question_presets::*;

/// A single survey answer. Survey options carry either a label-like string
/// (`"Early"`) or a score (`5`); both survive serialization untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(i64),
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Field name -> answer, keyed by the `field` of each answered question.
pub type SurveyAnswerMap = BTreeMap<String, AnswerValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyOption {
    pub label: String,
    pub value: AnswerValue,
}

impl SurveyOption {
    pub fn new(label: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<SurveyOption>,
    /// Key under which the answer is recorded. Older scripts call it `mlField`.
    #[serde(alias = "mlField")]
    pub field: String,
}

impl SurveyQuestion {
    pub fn option_for(&self, value: &AnswerValue) -> Option<&SurveyOption> {
        self.options.iter().find(|option| &option.value == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Choices offered with an assistant question. Cleared once answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SurveyOption>>,
}

impl ChatMessage {
    pub fn is_awaiting_reply(&self) -> bool {
        self.role == Role::Assistant && self.options.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// Payload shipped to the remote storage/scoring endpoint once a survey
/// completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub identity: Identity,
    pub responses: SurveyAnswerMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diet {
    Omnivore,
    Vegetarian,
    Vegan,
    Pescatarian,
}

impl Diet {
    pub const ALL: [Diet; 4] = [
        Diet::Omnivore,
        Diet::Vegetarian,
        Diet::Vegan,
        Diet::Pescatarian,
    ];

    pub fn is_plant_based(self) -> bool {
        matches!(self, Diet::Vegetarian | Diet::Vegan)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Diet::Omnivore => "Omnivore",
            Diet::Vegetarian => "Vegetarian",
            Diet::Vegan => "Vegan",
            Diet::Pescatarian => "Pescatarian",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sociability {
    Quiet,
    Balanced,
    Outgoing,
}

impl Sociability {
    pub const ALL: [Sociability; 3] = [
        Sociability::Quiet,
        Sociability::Balanced,
        Sociability::Outgoing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sociability::Quiet => "Quiet",
            Sociability::Balanced => "Balanced",
            Sociability::Outgoing => "Outgoing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SharingComfort {
    Low,
    Medium,
    High,
}

impl SharingComfort {
    pub const ALL: [SharingComfort; 3] = [
        SharingComfort::Low,
        SharingComfort::Medium,
        SharingComfort::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SharingComfort::Low => "Low",
            SharingComfort::Medium => "Medium",
            SharingComfort::High => "High",
        }
    }
}

/// Enriched lifestyle profile: the raw sleep answer plus four inferred traits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitVector {
    pub sleep: String,
    pub eating: Diet,
    /// 1 (messy) ..= 5 (very tidy)
    pub cleanliness: u8,
    pub sociability: Sociability,
    pub sharing: SharingComfort,
}

impl TraitVector {
    /// Keys written by enrichment on top of the caller's profile.
    pub const DERIVED_FIELDS: [&'static str; 4] = ["eating", "cleanliness", "sociability", "sharing"];
}
