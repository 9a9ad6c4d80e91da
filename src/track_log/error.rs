use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackLogError {
    #[error("track log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackLogError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        TrackLogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
