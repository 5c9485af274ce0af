use std::sync::{Arc, Mutex};

use crate::error::SignalError;
use crate::signal::SignalOutput;

#[derive(Clone, Debug, PartialEq)]
pub enum SignalEvent {
    Start,
    Update(f64, f64),
    Stop,
}

impl SignalEvent {
    pub fn is_update(&self) -> bool {
        matches!(self, SignalEvent::Update(..))
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, SignalEvent::Stop)
    }
}

/// Records every call. Clones share the log so a test can keep a handle
/// after moving the signal into a session.
#[derive(Clone, Debug, Default)]
pub struct RecordingSignal {
    events: Arc<Mutex<Vec<SignalEvent>>>,
    failing: bool,
}

impl RecordingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but rejects every update.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<SignalEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, filter: fn(&SignalEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| filter(e)).count()
    }

    pub fn last_update(&self) -> Option<(f64, f64)> {
        self.events.lock().unwrap().iter().rev().find_map(|e| match e {
            SignalEvent::Update(ch1, ch2) => Some((*ch1, *ch2)),
            _ => None,
        })
    }
}

impl SignalOutput for RecordingSignal {
    fn start(&mut self) -> Result<(), SignalError> {
        self.events.lock().unwrap().push(SignalEvent::Start);
        Ok(())
    }

    fn update(&mut self, ch1_ms: f64, ch2_ms: f64) -> Result<(), SignalError> {
        self.events
            .lock()
            .unwrap()
            .push(SignalEvent::Update(ch1_ms, ch2_ms));
        if self.failing {
            return Err(SignalError::Unavailable("mock output unplugged".to_string()));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.events.lock().unwrap().push(SignalEvent::Stop);
    }
}
