//! CLI error handling

use std::fmt;

use pinstall_errors::UserFacingError;
use pinstall_events::FailureContext;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(pinstall_errors::Error),
    /// Operations error
    Ops(pinstall_errors::Error),
    /// Install published, but some packages failed
    Incomplete { failed: usize },
    /// I/O error
    Io(std::io::Error),
}

impl CliError {
    /// Structured form for JSON output
    pub fn failure_context(&self) -> FailureContext {
        match self {
            CliError::Config(e) | CliError::Ops(e) => FailureContext::from_error(e),
            CliError::Incomplete { .. } => FailureContext::new(
                Some("install.incomplete"),
                self.to_string(),
                None::<String>,
                true,
            ),
            CliError::Io(e) => FailureContext::new(Some("error.io"), e.to_string(), None::<String>, false),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e.user_message()),
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Incomplete { failed } => {
                write!(f, "{failed} package(s) failed to install")
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) | CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Incomplete { .. } => None,
        }
    }
}

impl From<pinstall_errors::Error> for CliError {
    fn from(e: pinstall_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinstall_errors::{Error, InstallError};

    #[test]
    fn test_ops_error_includes_code_and_hint() {
        let err = CliError::from(Error::from(InstallError::PackagesFailed {
            count: 1,
            packages: "acme/broken".to_string(),
        }));
        let text = err.to_string();
        assert!(text.contains("acme/broken"));
        assert!(text.contains("Code: install.packages_failed"));
        assert!(text.contains("--keep-going"));
    }

    #[test]
    fn test_incomplete_failure_context() {
        let context = CliError::Incomplete { failed: 2 }.failure_context();
        assert_eq!(context.code.as_deref(), Some("install.incomplete"));
        assert!(context.message.starts_with('2'));
    }
}
