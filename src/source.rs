//! Input-source contract and the data-ready signal.
//!
//! The core never talks to a device API directly; it goes through
//! [`InputSource`] and [`DeviceHandle`], which a backend implements over the
//! real input stack. The contract is deliberately narrow: enumerate matching
//! devices, open one, negotiate its report layout, arm a wake-up signal, and
//! read the current state on demand.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use thiserror::Error;

use crate::guid::Guid;
use crate::report::RawControllerState;

/// Auto-reset wake-up signal shared between a device backend and the session
/// listener blocked on it.
///
/// Semantics mirror a Win32 auto-reset event: [`raise`](Signal::raise) wakes
/// one [`wait`](Signal::wait), and a raise with no waiter stays latched until
/// the next wait. Session teardown raises the same signal the backend uses
/// for data-ready; the listener tells the two apart through its stop flag.
#[derive(Clone, Debug, Default)]
pub struct Signal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches the signal and wakes one blocked waiter.
    pub fn raise(&self) {
        let (raised, wake) = &*self.inner;
        *raised.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wake.notify_one();
    }

    /// Blocks until the signal is raised, then consumes it.
    pub fn wait(&self) {
        let (raised, wake) = &*self.inner;
        let mut guard = raised.lock().unwrap_or_else(PoisonError::into_inner);
        while !*guard {
            guard = wake.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
        *guard = false;
    }
}

/// Device open or setup failed. No session is created and nothing stays
/// half-acquired when one of these surfaces.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to open device: {0}")]
    Open(String),
    #[error("failed to negotiate report layout: {0}")]
    Layout(String),
    #[error("failed to arm data-ready notification: {0}")]
    Notification(String),
    #[error("failed to acquire device: {0}")]
    Acquire(String),
}

/// A single state read failed. Transient: the listener logs it and keeps
/// waiting, the previous state stays in place.
#[derive(Debug, Error)]
#[error("device read failed: {0}")]
pub struct ReadError(pub String);

/// One enumeration pass failed. The detector treats it as an empty poll.
#[derive(Debug, Error)]
#[error("device enumeration failed: {0}")]
pub struct EnumerationError(pub String);

/// Enumerates and opens devices matching the target product signature.
pub trait InputSource: Send + Sync {
    /// Lists the instance identifiers of all currently attached matching
    /// devices. Best effort; order does not matter.
    fn enumerate(&self) -> Result<Vec<Guid>, EnumerationError>;

    /// Opens the device with the given instance identifier.
    fn open(&self, id: Guid) -> Result<Box<dyn DeviceHandle>, AcquisitionError>;
}

/// One opened device. Dropping the handle releases it; [`DeviceSession`]
/// guarantees the listener has fully exited first by moving the handle into
/// the listener thread.
///
/// [`DeviceSession`]: crate::session::DeviceSession
pub trait DeviceHandle: Send {
    /// Negotiates the raw report layout the device delivers.
    fn set_report_layout(&mut self) -> Result<(), AcquisitionError>;

    /// Arms `signal` to be raised whenever a new report arrives.
    fn set_event_notification(&mut self, signal: Signal) -> Result<(), AcquisitionError>;

    /// Starts report delivery. Called once, after layout negotiation and
    /// notification setup.
    fn acquire(&mut self) -> Result<(), AcquisitionError>;

    /// Returns the most recent complete state snapshot.
    fn read_state(&mut self) -> Result<RawControllerState, ReadError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn raise_before_wait_is_latched() {
        let signal = Signal::new();
        signal.raise();
        // Must return immediately instead of blocking.
        signal.wait();
    }

    #[test]
    fn wait_consumes_the_signal() {
        let signal = Signal::new();
        signal.raise();
        signal.wait();

        let woke = Arc::new(AtomicBool::new(false));
        let waiter = std::thread::spawn({
            let signal = signal.clone();
            let woke = Arc::clone(&woke);
            move || {
                signal.wait();
                woke.store(true, Ordering::SeqCst);
            }
        });

        // The earlier raise was consumed, so the waiter stays blocked until
        // we raise again.
        std::thread::sleep(Duration::from_millis(50));
        assert!(!woke.load(Ordering::SeqCst));
        signal.raise();
        waiter.join().unwrap();
        assert!(woke.load(Ordering::SeqCst));
    }
}
