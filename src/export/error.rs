use thiserror::Error;

use crate::track_log::TrackLogError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Log(#[from] TrackLogError),
    #[error("track log is empty")]
    EmptyLog,
    #[error("failed to store {name}: {source}")]
    Sink {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
