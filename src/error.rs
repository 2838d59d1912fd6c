use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GifError {
    #[error("`{0}` not found in PATH")]
    MissingTool(&'static str),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("{tool} exited with {status}")]
    ExternalProcessFailure { tool: String, status: ExitStatus },
}
