//! CLI error handling

use std::fmt;

use dlsim_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(dlsim_errors::ConfigError),
    /// Engine error
    Engine(dlsim_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Engine(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<dlsim_errors::ConfigError> for CliError {
    fn from(e: dlsim_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<dlsim_errors::Error> for CliError {
    fn from(e: dlsim_errors::Error) -> Self {
        CliError::Engine(e)
    }
}

impl From<dlsim_errors::SimulationError> for CliError {
    fn from(e: dlsim_errors::SimulationError) -> Self {
        CliError::Engine(e.into())
    }
}

impl From<dlsim_errors::UsageError> for CliError {
    fn from(e: dlsim_errors::UsageError) -> Self {
        CliError::Engine(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
