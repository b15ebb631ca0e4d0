use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("no VCS repository found from path: {0}")]
    NoRepository(String),

    #[error("VCS executable '{0}' could not be located")]
    ExecutableNotFound(String),

    #[error("command '{command}' (in {dir}) failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        dir: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("malformed VCS output: {0}")]
    MalformedOutput(String),

    #[error("{operation} is not supported by {vcs}")]
    Unsupported {
        vcs: &'static str,
        operation: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type VcsResult<T> = Result<T, VcsError>;
