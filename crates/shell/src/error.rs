use aussie_os_vfs::VfsError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShellError {
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Vfs(#[from] VfsError),
    #[error("{0}")]
    Failed(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl ShellError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::CommandNotFound(_) => 127,
            ShellError::Usage(_) => 2,
            ShellError::Vfs(_) | ShellError::Failed(_) => 1,
            ShellError::Fatal(_) => 128,
        }
    }

    /// Text written to stderr when `command` fails with this error.
    pub fn render(&self, command: &str) -> String {
        match self {
            ShellError::CommandNotFound(_) | ShellError::Fatal(_) => self.to_string(),
            _ => format!("{}: {}", command, self),
        }
    }
}
