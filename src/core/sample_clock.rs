//! Periodic network throughput sampler
//!
//! A `SampleClock` owns one worker thread while running. The worker owns
//! the `SampleState` and receives control messages over a channel; the
//! synchronous first reading in `start` happens before the worker exists
//! and its state is moved into the thread.

use super::sample_state::SampleState;
use super::subscribers::{SubscriptionId, Subscribers};
use arc_swap::ArcSwapOption;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, trace, warn};
use netmon_core::{BoxedInterfaceProvider, InterfaceProvider};
use netmon_types::SpeedSample;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Errors returned by [`SampleClock`] control calls
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("sample interval must be positive, got {0} ms")]
    InvalidInterval(i32),
    #[error("failed to spawn sampler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

fn interval_from_ms(interval_ms: i32) -> Result<Duration, ClockError> {
    if interval_ms <= 0 {
        return Err(ClockError::InvalidInterval(interval_ms));
    }
    Ok(Duration::from_millis(interval_ms as u64))
}

/// Messages delivered to the worker thread
enum Control {
    SetInterval(Duration),
    Stop,
}

/// Everything one tick needs, shared between the caller and the worker
#[derive(Clone)]
struct Sampler {
    provider: Arc<Mutex<BoxedInterfaceProvider>>,
    subscribers: Arc<Subscribers<SpeedSample>>,
    latest: Arc<ArcSwapOption<SpeedSample>>,
}

impl Sampler {
    fn tick(&self, state: &mut SampleState) {
        let counters = {
            let mut provider = self.provider.lock().unwrap_or_else(PoisonError::into_inner);
            match provider.read_counters() {
                Ok(counters) => counters,
                Err(e) => {
                    // Leave the baseline alone, the next tick retries
                    warn!("Error reading network stats: {}", e);
                    return;
                }
            }
        };

        let now = Instant::now();
        match state.advance(counters, now) {
            Some(sample) => {
                trace!(
                    "Sample: down {:.1} B/s, up {:.1} B/s",
                    sample.download_bytes_per_sec,
                    sample.upload_bytes_per_sec
                );
                self.latest.store(Some(Arc::new(sample)));
                self.subscribers.emit(&sample);
            }
            None => trace!("Tick produced no sample (baseline or zero elapsed)"),
        }
    }

    fn run(self, mut state: SampleState, mut period: Duration, control: Receiver<Control>) {
        let mut next_tick = Instant::now() + period;

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match control.recv_timeout(timeout) {
                Ok(Control::SetInterval(new_period)) => {
                    // Keep the phase: the next tick is one new period after the last one
                    let last_tick = next_tick.checked_sub(period).unwrap_or_else(Instant::now);
                    period = new_period;
                    next_tick = last_tick + period;
                    debug!("Sampler interval changed to {:?}", period);
                }
                Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    self.tick(&mut state);

                    next_tick += period;
                    let now = Instant::now();
                    if next_tick <= now {
                        // Fell behind, don't burst to catch up
                        next_tick = now + period;
                    }
                }
            }
        }

        debug!("Sampler thread exiting");
    }
}

/// Handle to a running worker
struct Worker {
    control: Sender<Control>,
    handle: JoinHandle<()>,
    thread_id: ThreadId,
    interval: Duration,
}

impl Worker {
    /// Stop the worker and wait for it, unless called from the worker itself
    fn shutdown(self) {
        let _ = self.control.send(Control::Stop);
        if std::thread::current().id() == self.thread_id {
            // Called from a subscriber; the loop exits once the callback returns
            return;
        }
        if let Err(e) = self.handle.join() {
            warn!("Sampler thread panicked: {:?}", e);
        }
    }
}

/// Periodic sampler of network interface counters
///
/// Emits one [`SpeedSample`] per tick to every subscriber, except on the
/// first tick after [`SampleClock::start`], which only records a baseline.
pub struct SampleClock {
    sampler: Sampler,
    worker: Mutex<Option<Worker>>,
}

impl SampleClock {
    pub fn new(provider: BoxedInterfaceProvider) -> Self {
        info!("Creating sample clock with provider '{}'", provider.metadata().id);
        Self {
            sampler: Sampler {
                provider: Arc::new(Mutex::new(provider)),
                subscribers: Arc::new(Subscribers::new()),
                latest: Arc::new(ArcSwapOption::empty()),
            },
            worker: Mutex::new(None),
        }
    }

    /// Start sampling every `interval_ms` milliseconds.
    ///
    /// Stops any running timer first, resets the baseline and takes the
    /// baseline reading synchronously before returning. That reading never
    /// produces a sample.
    pub fn start(&self, interval_ms: i32) -> Result<(), ClockError> {
        let interval = interval_from_ms(interval_ms)?;
        self.stop();

        let mut state = SampleState::new();
        self.sampler.tick(&mut state);

        let (tx, rx) = channel::unbounded();
        let sampler = self.sampler.clone();
        let handle = std::thread::Builder::new()
            .name("netmon-sampler".to_string())
            .spawn(move || sampler.run(state, interval, rx))?;

        let worker = Worker {
            control: tx,
            thread_id: handle.thread().id(),
            handle,
            interval,
        };

        let previous = self.lock_worker().replace(worker);
        if let Some(previous) = previous {
            // A concurrent start won the race; only the latest one survives
            previous.shutdown();
        }

        info!("Sample clock started at {:?}", interval);
        Ok(())
    }

    /// Stop sampling. No tick fires after this returns.
    ///
    /// Safe to call when already stopped. When called from a subscriber the
    /// worker is told to exit but not joined.
    pub fn stop(&self) {
        let worker = self.lock_worker().take();
        if let Some(worker) = worker {
            worker.shutdown();
            info!("Sample clock stopped");
        }
    }

    /// Change the period of a running clock without resetting its baseline.
    ///
    /// Does nothing if the clock is stopped.
    pub fn set_interval(&self, interval_ms: i32) -> Result<(), ClockError> {
        let interval = interval_from_ms(interval_ms)?;
        let mut guard = self.lock_worker();
        match guard.as_mut() {
            Some(worker) => {
                if worker.interval != interval {
                    worker.interval = interval;
                    let _ = worker.control.send(Control::SetInterval(interval));
                }
            }
            None => debug!("set_interval({} ms) ignored, clock not running", interval_ms),
        }
        Ok(())
    }

    /// True while a worker thread is alive to take ticks
    pub fn is_running(&self) -> bool {
        self.lock_worker()
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Current interval, or None when stopped
    pub fn interval(&self) -> Option<Duration> {
        self.lock_worker().as_ref().map(|w| w.interval)
    }

    /// Most recent sample emitted by this clock
    pub fn latest(&self) -> Option<SpeedSample> {
        self.sampler.latest.load_full().map(|s| *s)
    }

    /// Register a callback invoked on the sampler thread for every sample
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SpeedSample) + Send + Sync + 'static,
    {
        self.sampler.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.sampler.subscribers.unsubscribe(id)
    }

    fn lock_worker(&self) -> std::sync::MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SampleClock {
    fn drop(&mut self) {
        self.stop();
    }
}
