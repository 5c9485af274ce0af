use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::NavSessionConfig;
use crate::error::NavResult;
use crate::position_feed::{PositionFix, PositionSource};
use crate::session::{BoatState, NavStatus, NavigationSession};
use crate::signal::SignalOutput;
use crate::waypoint::Waypoint;

/// Callback invoked with every tick's status, on the tick thread.
pub type StatusObserver = Box<dyn FnMut(&NavStatus) + Send>;

struct Ticker {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives a [`NavigationSession`] from a background thread at the
/// configured tick period.
///
/// Commands and the tick serialize on the session mutex. `stop` joins the
/// tick thread before tearing the session down, so no tick can run after it
/// returns.
pub struct Navigator<S: SignalOutput + 'static> {
    session: Arc<Mutex<NavigationSession<S>>>,
    observer: Arc<Mutex<Option<StatusObserver>>>,
    ticker: Option<Ticker>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: SignalOutput + 'static> Navigator<S> {
    pub fn new(signal: S) -> Self {
        Self {
            session: Arc::new(Mutex::new(NavigationSession::new(signal))),
            observer: Arc::new(Mutex::new(None)),
            ticker: None,
        }
    }

    /// Register a status callback. Replaces any previous one.
    pub fn on_status(&mut self, observer: impl FnMut(&NavStatus) + Send + 'static) {
        *lock(&self.observer) = Some(Box::new(observer));
    }

    pub fn start(
        &mut self,
        initial: impl Into<PositionFix>,
        source: Option<Box<dyn PositionSource>>,
        config: NavSessionConfig,
    ) -> NavResult<()> {
        let period = config.tick_period();
        lock(&self.session).start(initial, source, config)?;

        let (shutdown, shutdown_rx) = mpsc::channel::<()>();
        let session = Arc::clone(&self.session);
        let observer = Arc::clone(&self.observer);

        let handle = thread::spawn(move || {
            let mut next = Instant::now() + period;
            loop {
                let wait = next.saturating_duration_since(Instant::now());
                match shutdown_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // shutdown requested or navigator dropped
                    _ => break,
                }
                next += period;

                let status = match lock(&session).tick() {
                    Ok(status) => status,
                    Err(e) => {
                        debug!("Tick thread exiting: {}", e);
                        break;
                    }
                };
                if let Some(observer) = lock(&observer).as_mut() {
                    observer(&status);
                }
            }
        });

        info!("Tick thread started, period {} ms", period.as_millis());
        self.ticker = Some(Ticker { shutdown, handle });
        Ok(())
    }

    /// Stop ticking and end the session. Idempotent.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.shutdown.send(());
            if ticker.handle.join().is_err() {
                warn!("Tick thread panicked");
            }
        }
        lock(&self.session).stop();
    }

    pub fn set_target(&self, target: Option<Waypoint>) -> NavResult<()> {
        lock(&self.session).set_target(target)
    }

    pub fn clear_route(&self) -> NavResult<()> {
        lock(&self.session).clear_route()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.session).is_active()
    }

    /// Status of the most recent tick.
    pub fn status(&self) -> Option<NavStatus> {
        lock(&self.session).last_status().cloned()
    }

    pub fn boat(&self) -> BoatState {
        lock(&self.session).boat().clone()
    }

    /// Run `f` against the session under its lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&NavigationSession<S>) -> R) -> R {
        f(&lock(&self.session))
    }
}

impl<S: SignalOutput + 'static> Drop for Navigator<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
