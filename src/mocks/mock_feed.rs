use std::sync::{Arc, Mutex};

use crate::error::FeedError;
use crate::position_feed::{FixSink, PositionFix, PositionSource, SubscriptionId};

#[derive(Debug, Default)]
struct FeedState {
    next_id: u64,
    live: Vec<(SubscriptionId, FixSink)>,
    last_issued: Option<FixSink>,
    unsubscribed: Vec<SubscriptionId>,
    refuse: bool,
}

/// Position source driven by hand from the test body.
#[derive(Clone, Debug, Default)]
pub struct ManualFeed {
    state: Arc<Mutex<FeedState>>,
}

impl ManualFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// A feed whose `subscribe` always fails.
    pub fn refusing() -> Self {
        let feed = Self::default();
        feed.state.lock().unwrap().refuse = true;
        feed
    }

    /// Deliver to every live subscriber. True if any accepted the fix.
    pub fn push(&self, fix: PositionFix) -> bool {
        let state = self.state.lock().unwrap();
        let mut accepted = false;
        for (_, sink) in &state.live {
            accepted |= sink.push(fix);
        }
        accepted
    }

    /// Deliver through the most recently issued sink even if it has been
    /// unsubscribed, like a callback already in flight during teardown.
    pub fn push_stale(&self, fix: PositionFix) -> bool {
        let state = self.state.lock().unwrap();
        state.last_issued.as_ref().is_some_and(|sink| sink.push(fix))
    }

    pub fn subscriptions(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.state.lock().unwrap().unsubscribed.clone()
    }
}

impl PositionSource for ManualFeed {
    fn subscribe(&mut self, sink: FixSink) -> Result<SubscriptionId, FeedError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse {
            return Err(FeedError::Unavailable("mock feed refused subscription".to_string()));
        }
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.live.push((id, sink.clone()));
        state.last_issued = Some(sink);
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let mut state = self.state.lock().unwrap();
        state.live.retain(|(live, _)| *live != id);
        state.unsubscribed.push(id);
    }
}
