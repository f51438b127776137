use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors surfaced by the build core.
///
/// `Graph` and `Internal` short-circuit before any worker runs and are never
/// recoverable. `Tool` and `Io` inside a worker become a failed step and
/// cancel the build; subsequent workers observe the cancellation and report
/// `Cancelled`.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("graph error: {0}")]
    Graph(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    #[error("build cancelled: {0}")]
    Cancelled(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl BuildError {
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph(message.into())
    }

    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_path_context() {
        let err = BuildError::io(
            "/tmp/missing",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("/tmp/missing"));
    }

    #[test]
    fn test_tool_error_rendering() {
        let err = BuildError::tool("javac", "2 error(s)");
        assert_eq!(err.to_string(), "javac: 2 error(s)");
    }

    #[test]
    fn test_cancelled_detection() {
        assert!(BuildError::Cancelled("first cause".into()).is_cancelled());
        assert!(!BuildError::graph("cycle").is_cancelled());
    }
}
