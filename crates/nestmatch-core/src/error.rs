//! Error types for the survey and inference layers.
//!
//! Every session operation validates before it mutates, so any of these
//! errors leaves the session exactly as it was.

use nestmatch_schema::AnswerValue;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplerError {
    #[error("invalid distribution: {reason}")]
    InvalidDistribution { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("survey script has no questions")]
    Empty,

    #[error("duplicate field in survey script: {field}")]
    DuplicateField { field: String },

    #[error("question {id} has no options")]
    NoOptions { id: String },

    #[error("question {id} repeats option value {value}")]
    DuplicateOptionValue { id: String, value: AnswerValue },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    /// The value is not one of the current question's options. Re-prompt.
    #[error("invalid option {value} for question {question_id}")]
    InvalidOption {
        question_id: String,
        value: AnswerValue,
    },

    /// Input arrived while a transition was in flight or after completion.
    #[error("not accepting input: {reason}")]
    NotAcceptingInput { reason: &'static str },

    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: &'static str },

    #[error("survey session already started")]
    AlreadyStarted,
}

impl SurveyError {
    pub(crate) fn not_accepting(reason: &'static str) -> Self {
        Self::NotAcceptingInput { reason }
    }

    pub(crate) fn invalid_operation(reason: &'static str) -> Self {
        Self::InvalidOperation { reason }
    }

    /// `start()` on a started session counts as an invalid operation.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation { .. } | Self::AlreadyStarted)
    }
}
