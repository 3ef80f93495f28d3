//! I/O boundary traits for testability
//!
//! The composer only sees already-loaded records; these traits abstract where
//! the CLI obtains them, so command logic can be tested with in-memory sources.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::Node;
use crate::infrastructure::{InfraError, InfraResult};

/// Record shape accepted by the command-line front end.
pub type Record = Node<i64, String, Value>;

/// Source of one complete flat record set.
pub trait RecordSource {
    /// Human-readable origin used in error messages.
    fn origin(&self) -> String;

    /// Read the raw JSON document.
    fn read_raw(&self) -> io::Result<String>;

    /// Read and parse all records at once.
    fn load(&self) -> InfraResult<Vec<Record>> {
        let raw = self
            .read_raw()
            .map_err(|e| InfraError::io(format!("read {}", self.origin()), e))?;
        parse_records(&raw, &self.origin())
    }
}

/// Parse a JSON array of records.
#[instrument(level = "debug", skip(raw), fields(bytes = raw.len()))]
pub fn parse_records(raw: &str, origin: &str) -> InfraResult<Vec<Record>> {
    let records: Vec<Record> = serde_json::from_str(raw).map_err(|source| InfraError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    debug!(count = records.len(), "loaded records");
    Ok(records)
}

/// Records from a JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RecordSource for FileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn read_raw(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Records from standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl RecordSource for StdinSource {
    fn origin(&self) -> String {
        "<stdin>".to_string()
    }

    fn read_raw(&self) -> io::Result<String> {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    }
}

/// Records held in memory.
#[derive(Debug, Clone)]
pub struct StaticSource {
    content: String,
}

impl StaticSource {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl RecordSource for StaticSource {
    fn origin(&self) -> String {
        "<memory>".to_string()
    }

    fn read_raw(&self) -> io::Result<String> {
        Ok(self.content.clone())
    }
}

/// File source if a path is given, otherwise stdin. `-` also means stdin.
pub fn source_for(path: Option<&Path>) -> Box<dyn RecordSource> {
    match path {
        Some(p) if p != Path::new("-") => Box::new(FileSource::new(p)),
        _ => Box::new(StdinSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_parses_records() {
        let source = StaticSource::new(
            r#"[{"id": 1, "groupKey": "g", "order": 2, "payload": {"name": "Home"}},
                {"id": 2, "parentId": 1, "groupKey": "g"}]"#,
        );
        let records = source.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload["name"], "Home");
        assert_eq!(records[1].parent_id, Some(1));
        assert_eq!(records[1].payload, Value::Null);
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = StaticSource::new("{not json").load().unwrap_err();
        assert!(matches!(err, InfraError::Parse { .. }));
        assert!(err.to_string().contains("<memory>"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FileSource::new("/nonexistent/records.json").load().unwrap_err();
        assert!(matches!(err, InfraError::Io { .. }));
    }
}
