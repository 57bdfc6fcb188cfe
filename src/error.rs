use thiserror::Error;

use crate::envelope::EnvelopeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("red packet {id} not found")]
    NotFound { id: EnvelopeId },

    #[error("red packet {id} has no shares left")]
    Depleted { id: EnvelopeId },
}

impl GameError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        GameError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
