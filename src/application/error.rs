//! Application-level errors (wraps domain errors)

use std::fmt::Debug;
use thiserror::Error;

use crate::domain::{ComposeError, ComposeErrorKind};

/// Application errors erase the domain's id types and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{message}")]
    Compose {
        kind: ComposeErrorKind,
        message: String,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl<I: Debug, G: Debug> From<ComposeError<I, G>> for ApplicationError {
    fn from(e: ComposeError<I, G>) -> Self {
        Self::Compose {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
