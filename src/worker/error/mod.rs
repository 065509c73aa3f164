use crate::utils::CompressorError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Background run failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Run(#[from] CompressorError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            WorkerError::TaskFailed("run panicked".to_string())
        } else {
            WorkerError::TaskFailed(format!("run was cancelled: {}", err))
        }
    }
}
