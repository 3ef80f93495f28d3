//! Application layer: services around the composer
//!
//! This layer adds caching and presentation on top of the pure domain logic.

pub mod cache;
pub mod error;
pub mod render;

pub use cache::{fingerprint, CacheStats, Fingerprint, ForestCache};
pub use error::{ApplicationError, ApplicationResult};
pub use render::{render_forest, to_tree_string};
