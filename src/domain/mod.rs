//! Domain layer: records, arenas and the tree composer
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod composer;
pub mod entities;
pub mod error;
pub mod inspect;

pub use arena::{GroupArena, Slot};
pub use composer::{compose, select_groups, GroupReport, TreeComposer};
pub use entities::*;
pub use error::{ComposeError, ComposeErrorKind, ComposeResult};
pub use inspect::{ForestStats, TreeIter};
