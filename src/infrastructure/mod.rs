//! Infrastructure layer: record sources and I/O errors
//!
//! This layer reads flat record sets from files or stdin for the CLI.

pub mod error;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use traits::{parse_records, source_for, FileSource, Record, RecordSource, StaticSource, StdinSource};
