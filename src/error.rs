//! Error types shared by the stores, the plugin loader and the external
//! interpreter fallback.

use std::io;
use std::path::PathBuf;

/// Errors produced by the shell core.
///
/// None of these terminate the shell: every caller reports them inline and
/// carries on with a default value.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("failed to read {path}: {source}")]
    StoreRead { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    StoreWrite { path: PathBuf, source: io::Error },

    #[error("malformed {path}: {source}")]
    StoreFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("config error: {0}")]
    Config(String),

    #[error("interpreter executable not found at '{0}'")]
    InterpreterNotFound(PathBuf),

    #[error("plugin {name}: {reason}")]
    Plugin { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ShellError {
    pub(crate) fn plugin(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Plugin {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_not_found_display() {
        let e = ShellError::InterpreterNotFound(PathBuf::from("/no/such/pwsh"));
        assert_eq!(
            format!("{e}"),
            "interpreter executable not found at '/no/such/pwsh'"
        );
    }

    #[test]
    fn plugin_error_display() {
        let e = ShellError::plugin("weather", "missing entry point");
        assert_eq!(format!("{e}"), "plugin weather: missing entry point");
    }

    #[test]
    fn io_error_converts() {
        let e: ShellError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(format!("{e}"), "I/O error: boom");
    }
}
