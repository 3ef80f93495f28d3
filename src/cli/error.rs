//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::ComposeErrorKind;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::NOINPUT,
                InfraError::Parse { .. } => crate::exitcode::DATAERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Compose { kind, .. } => match kind {
                        ComposeErrorKind::UnknownGroupKeyRequested => crate::exitcode::USAGE,
                        _ => crate::exitcode::DATAERR,
                    },
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Serialization(_) => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComposeError;

    #[test]
    fn test_cycle_maps_to_dataerr() {
        let app: ApplicationError = ComposeError::<i64, String>::CycleDetected(3).into();
        assert_eq!(CliError::from(app).exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn test_unknown_group_maps_to_usage() {
        let app: ApplicationError =
            ComposeError::<i64, String>::UnknownGroupKeyRequested("x".into()).into();
        assert_eq!(CliError::from(app).exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn test_config_maps_to_config() {
        let err = CliError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }
}
