use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::error::SamplerError;
use super::feed::{AltitudeSource, SensorFeed};
use crate::fix::{same_record, Fix};
use crate::track_log::TrackStore;

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(2000);

/// How often `start` re-checks a stopping worker before spawning a new one.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SamplerState {
    Idle,
    Running,
    StopRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Appended(Fix),
    /// Candidate equals the last persisted row.
    Duplicate,
    /// No position, or no altitude, has been pushed yet.
    MissingSensorData,
    /// The append failed; already logged.
    Failed,
}

#[derive(Debug, Clone)]
pub struct SamplerStatus {
    pub state: SamplerState,
    pub last_fix: Option<Fix>,
    pub appended: u64,
    pub duplicates: u64,
    pub failed: u64,
}

#[derive(Debug)]
struct Shared {
    status: SamplerStatus,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

/// Periodically turns the latest sensor readings into track log rows.
///
/// At most one worker exists at a time. `stop` only asks the worker to finish
/// its current tick; `start` after a `stop` waits until that worker has
/// reached `Idle` before spawning the next one, so the store never sees two
/// writers.
pub struct Sampler {
    period: Duration,
    feed: SensorFeed,
    altitude: Arc<dyn AltitudeSource>,
    store: Arc<dyn TrackStore>,
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
}

impl Sampler {
    pub fn new(
        store: Arc<dyn TrackStore>,
        feed: SensorFeed,
        altitude: Arc<dyn AltitudeSource>,
        period: Duration,
    ) -> Self {
        Self {
            period,
            feed,
            altitude,
            store,
            shared: Arc::new(StdMutex::new(Shared {
                status: SamplerStatus {
                    state: SamplerState::Idle,
                    last_fix: None,
                    appended: 0,
                    duplicates: 0,
                    failed: 0,
                },
            })),
            worker: None,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.shared.lock().unwrap().status.state
    }

    pub fn status(&self) -> SamplerStatus {
        self.shared.lock().unwrap().status.clone()
    }

    /// Starts sampling. No-op while already running; after a `stop` this
    /// first waits for the previous worker to reach `Idle`.
    pub async fn start(&mut self) -> Result<(), SamplerError> {
        if self.state() == SamplerState::Running {
            log::debug!("Sampler already running");
            return Ok(());
        }

        self.wait_idle().await?;

        let (stop_tx, stop_rx) = oneshot::channel();
        self.shared.lock().unwrap().status.state = SamplerState::Running;

        let join = tokio::spawn(run_sampler_loop(
            self.shared.clone(),
            self.feed.clone(),
            self.altitude.clone(),
            self.store.clone(),
            self.period,
            stop_rx,
        ));
        self.worker = Some(WorkerHandle {
            stop_tx: Some(stop_tx),
            join,
        });

        log::info!("Sampler started (period {:?})", self.period);
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), SamplerError> {
        self.start().await
    }

    /// Requests the current tick to be the last one. Does not wait.
    pub fn stop(&mut self) {
        {
            let mut locked = self.shared.lock().unwrap();
            if locked.status.state != SamplerState::Running {
                return;
            }
            locked.status.state = SamplerState::StopRequested;
        }

        if let Some(stop_tx) = self.worker.as_mut().and_then(|w| w.stop_tx.take()) {
            let _ = stop_tx.send(());
        }
        log::info!("Sampler stop requested");
    }

    /// Waits, polling at a fixed interval, until no worker is running.
    /// Only returns once the worker has been asked to stop.
    pub async fn wait_idle(&mut self) -> Result<(), SamplerError> {
        let Some(worker) = self.worker.take() else {
            self.shared.lock().unwrap().status.state = SamplerState::Idle;
            return Ok(());
        };

        while self.state() != SamplerState::Idle {
            if worker.join.is_finished() {
                // Worker ended without reaching its own Idle transition.
                self.shared.lock().unwrap().status.state = SamplerState::Idle;
                break;
            }
            sleep(IDLE_POLL_INTERVAL).await;
        }

        worker.join.await?;
        Ok(())
    }

    /// Stops and waits for the worker to finish.
    pub async fn shutdown(&mut self) -> Result<(), SamplerError> {
        self.stop();
        self.wait_idle().await
    }
}

/// One sampling step: build a candidate from the feed, drop it if it repeats
/// the last persisted row, append it otherwise.
pub fn tick(
    feed: &SensorFeed,
    altitude: &dyn AltitudeSource,
    store: &dyn TrackStore,
) -> TickOutcome {
    let Some(position) = feed.position() else {
        return TickOutcome::MissingSensorData;
    };
    let Some(elevation) = altitude.altitude(feed, &position) else {
        return TickOutcome::MissingSensorData;
    };

    let fix = Fix::new(
        position.timestamp,
        position.latitude,
        position.longitude,
        elevation,
    );

    if let Some(last) = store.last_record() {
        if same_record(&last.text, &fix.to_record()) {
            return TickOutcome::Duplicate;
        }
    }

    match store.append(&fix) {
        Ok(()) => TickOutcome::Appended(fix),
        Err(e) => {
            log::error!("Failed to append fix: {}", e);
            TickOutcome::Failed
        }
    }
}

async fn run_sampler_loop(
    shared: Arc<StdMutex<Shared>>,
    feed: SensorFeed,
    altitude: Arc<dyn AltitudeSource>,
    store: Arc<dyn TrackStore>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let outcome = {
            let feed = feed.clone();
            let altitude = altitude.clone();
            let store = store.clone();
            tokio::task::spawn_blocking(move || tick(&feed, altitude.as_ref(), store.as_ref()))
                .await
        };

        let stop_requested = {
            let mut locked = shared.lock().unwrap();
            match outcome {
                Ok(TickOutcome::Appended(fix)) => {
                    locked.status.appended += 1;
                    locked.status.last_fix = Some(fix);
                }
                Ok(TickOutcome::Duplicate) => {
                    log::debug!("Skipping duplicate sample");
                    locked.status.duplicates += 1;
                }
                Ok(TickOutcome::MissingSensorData) => log::debug!("No sensor data yet"),
                Ok(TickOutcome::Failed) => locked.status.failed += 1,
                Err(e) => {
                    log::error!("Sampler tick panicked: {}", e);
                    locked.status.failed += 1;
                }
            }
            locked.status.state == SamplerState::StopRequested
        };
        if stop_requested {
            break;
        }

        let should_stop = tokio::select! {
            _ = sleep(period) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }
    }

    shared.lock().unwrap().status.state = SamplerState::Idle;
    log::info!("Sampler idle");
}
