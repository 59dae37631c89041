//! Hot-plug detection.
//!
//! [`HotplugDetector`] polls an [`InputSource`] on a fixed interval, diffs
//! the attached-device set against the previous poll, and reports each
//! transition exactly once. The callback runs synchronously on the polling
//! thread; session creation and destruction therefore happen in lockstep
//! with the poll loop, and a slow callback simply delays the next poll.

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::warn;

use crate::guid::Guid;
use crate::source::InputSource;

/// One attach-set transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotplugEvent {
    Added(Guid),
    Removed(Guid),
}

/// Watches an input source for device attach and detach.
pub struct HotplugDetector {
    running: Mutex<bool>,
    wake: Condvar,
}

impl HotplugDetector {
    pub fn new() -> Self {
        Self {
            running: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    /// Runs the poll loop on the calling thread until [`stop`] is called.
    ///
    /// Within one poll, all [`HotplugEvent::Added`] events are emitted
    /// before any [`HotplugEvent::Removed`]; order inside each group follows
    /// the identifier ordering. On exit, every identifier still attached
    /// receives a final `Removed`, so each successful add is paired with
    /// exactly one remove even on shutdown.
    ///
    /// [`stop`]: HotplugDetector::stop
    pub fn run(
        &self,
        source: &dyn InputSource,
        poll_interval: Duration,
        mut on_event: impl FnMut(HotplugEvent),
    ) {
        *self.lock_running() = true;

        let mut attached = BTreeSet::new();
        loop {
            let candidates: BTreeSet<Guid> = match source.enumerate() {
                Ok(ids) => ids.into_iter().collect(),
                Err(err) => {
                    // An enumeration failure counts as "no devices this
                    // poll"; the loop itself keeps going.
                    warn!(%err, "enumeration failed");
                    BTreeSet::new()
                }
            };

            for &id in candidates.difference(&attached) {
                on_event(HotplugEvent::Added(id));
            }
            for &id in attached.difference(&candidates) {
                on_event(HotplugEvent::Removed(id));
            }
            attached = candidates;

            // Block for the poll interval, or until a stop request arrives,
            // whichever comes first.
            let (running, _) = self
                .wake
                .wait_timeout_while(self.lock_running(), poll_interval, |running| *running)
                .unwrap_or_else(PoisonError::into_inner);
            if !*running {
                break;
            }
        }

        // Pair every earlier add with its remove, even on shutdown.
        for &id in &attached {
            on_event(HotplugEvent::Removed(id));
        }
    }

    /// Requests loop exit and wakes the interval wait. Safe to call from any
    /// thread, including a signal handler context.
    pub fn stop(&self) {
        *self.lock_running() = false;
        self.wake.notify_all();
    }

    fn lock_running(&self) -> MutexGuard<'_, bool> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HotplugDetector {
    fn default() -> Self {
        Self::new()
    }
}
