use std::path::PathBuf;

/// Error taxonomy for a build. Every variant but `Repeated` can occur during
/// a live build; `Repeated` is synthesized only by a second call to
/// `Builder::finish` replaying the first call's outcome.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("symbol parser error: {0}")]
    Parser(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("metadata error: {0}")]
    Metadata(String),
    #[error("tombstone error: {0}")]
    Tombstone(String),
    #[error("{0}")]
    Repeated(String),
}

pub type Result<T> = std::result::Result<T, BuildError>;
