//! Domain-level errors (no external dependencies)

use std::fmt::Debug;
use thiserror::Error;

/// Composition failures. Every variant aborts the whole call; no partial forest is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError<I: Debug, G: Debug> {
    #[error("duplicate identifier: {0:?}")]
    DuplicateIdentifier(I),

    #[error("cycle detected in hierarchy at node: {0:?}")]
    CycleDetected(I),

    #[error("unknown group key requested: {0:?}")]
    UnknownGroupKeyRequested(G),

    #[error("node {id:?} lies deeper than the maximum depth of {max_depth}")]
    DepthExceeded { id: I, max_depth: usize },

    #[error("node {id:?} references parent {parent_id:?} from another group")]
    CrossGroupParent { id: I, parent_id: I },
}

/// Payload-free classification of a `ComposeError`, for layers that erase the id types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeErrorKind {
    DuplicateIdentifier,
    CycleDetected,
    UnknownGroupKeyRequested,
    DepthExceeded,
    CrossGroupParent,
}

impl<I: Debug, G: Debug> ComposeError<I, G> {
    pub fn kind(&self) -> ComposeErrorKind {
        match self {
            Self::DuplicateIdentifier(_) => ComposeErrorKind::DuplicateIdentifier,
            Self::CycleDetected(_) => ComposeErrorKind::CycleDetected,
            Self::UnknownGroupKeyRequested(_) => ComposeErrorKind::UnknownGroupKeyRequested,
            Self::DepthExceeded { .. } => ComposeErrorKind::DepthExceeded,
            Self::CrossGroupParent { .. } => ComposeErrorKind::CrossGroupParent,
        }
    }
}

/// Result type for composition operations.
pub type ComposeResult<T, I, G> = Result<T, ComposeError<I, G>>;
