mod error;
mod rows;
mod track_log;

pub use error::TrackLogError;
pub use rows::{RawRow, RawRows};
pub use track_log::TrackLog;

use crate::fix::Fix;

/// Write side of a track log as seen by the sampler.
pub trait TrackStore: Send + Sync {
    fn append(&self, fix: &Fix) -> Result<(), TrackLogError>;

    /// Last persisted data row, `None` when empty or unreadable.
    fn last_record(&self) -> Option<RawRow>;
}
