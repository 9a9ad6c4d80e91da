mod error;
mod feed;
mod sampler;

pub use error::SamplerError;
pub use feed::{
    pressure_to_altitude, AltitudeMode, AltitudeSource, BarometricAltitude, GpsAltitude,
    PositionReading, SensorFeed,
};
pub use sampler::{tick, Sampler, SamplerState, SamplerStatus, TickOutcome, DEFAULT_PERIOD};
