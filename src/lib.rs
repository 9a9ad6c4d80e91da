//! Records timestamped GPS fixes into an append-only CSV track log, projects
//! the track onto a plane for display, and exports it as GPX.

pub mod config;
pub mod console;
pub mod export;
pub mod fix;
pub mod projection;
pub mod render;
pub mod sampler;
pub mod track_log;

pub use export::{export_track, DirectorySink, ExportError, ExportSink, GpxDocument};
pub use fix::{Fix, GeoPoint};
pub use projection::{project_track, ProjectedTrack, ViewTransform, Viewport};
pub use sampler::{Sampler, SamplerState, SensorFeed};
pub use track_log::{TrackLog, TrackLogError, TrackStore};
