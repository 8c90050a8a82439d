//! Error types for the sqlload CLI

use sqlload_ingest::LoadError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Loading, script execution or connectivity failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Connection parameters or flags are invalid
    #[error("Configuration error: {0}. Check the connection flags or SQLLOAD_* environment variables.")]
    Config(String),

    /// Input file or stdin could not be read
    #[error("Unable to read input '{path}': {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the input data itself was rejected
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Load(e) if e.is_data_error())
    }

    /// Create an input error for `path`
    pub fn input(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Input {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_is_transparent() {
        let err = CliError::from(LoadError::EmptyHeader);
        assert_eq!(err.to_string(), LoadError::EmptyHeader.to_string());
    }

    #[test]
    fn test_data_errors_are_distinguished() {
        assert!(CliError::from(LoadError::EmptyHeader).is_data_error());
        assert!(!CliError::from(LoadError::config("bad separator")).is_data_error());
        assert!(!CliError::config("bad dsn").is_data_error());
    }

    #[test]
    fn test_input_error_names_path() {
        let err = CliError::input(
            "data.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        );
        assert!(err.to_string().contains("'data.csv'"));
    }
}
