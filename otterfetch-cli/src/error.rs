//! CLI-local errors and their exit codes.
//!
//! These cover everything that fails before the download workflow starts;
//! failures inside the workflow carry their own codes through
//! `otterfetch::DownloadError`.

use std::fmt;

/// Exit code when the tool is invoked without arguments.
pub const EXIT_USAGE: i32 = 1;

/// Errors raised by argument and environment validation.
#[derive(Debug)]
pub enum CliError {
    /// No object id was supplied.
    MissingObjectId,

    /// The DEVELOPER_ID environment variable is unset or empty.
    MissingDeveloperId,

    /// The expected-size argument is not a positive integer within bounds.
    InvalidSize(String),
}

impl CliError {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::MissingObjectId => 3,
            CliError::MissingDeveloperId => 4,
            CliError::InvalidSize(_) => 8,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::MissingObjectId => {
                write!(f, "Object UUID is missing. Please provide it with the -u flag.")
            }
            CliError::MissingDeveloperId => {
                write!(
                    f,
                    "DEVELOPER_ID environment variable missing. Please set it accordingly."
                )
            }
            CliError::InvalidSize(raw) => {
                write!(
                    f,
                    "Invalid size argument: {}. Expected a byte count between 1 and 10485760.",
                    raw
                )
            }
        }
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::MissingObjectId.exit_code(), 3);
        assert_eq!(CliError::MissingDeveloperId.exit_code(), 4);
        assert_eq!(CliError::InvalidSize("x".to_string()).exit_code(), 8);
    }

    #[test]
    fn test_messages_name_the_remedy() {
        assert!(CliError::MissingObjectId.to_string().contains("-u flag"));
        assert!(CliError::MissingDeveloperId
            .to_string()
            .contains("DEVELOPER_ID"));
        assert!(CliError::InvalidSize("abc".to_string())
            .to_string()
            .contains("abc"));
    }
}
