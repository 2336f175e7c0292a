use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("symbol parser timed out after {0:?}")]
    Timeout(Duration),
    #[error("symbol parser protocol error: {0}")]
    Protocol(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
