//! Per-device session lifecycle.
//!
//! A [`DeviceSession`] is the live binding between one physical controller
//! and one virtual pad: the acquired device handle, the plugged bus target,
//! and the listener thread that drains reports from the former into the
//! latter. Sessions move through `Created → Acquired → Listening → Closed`;
//! `Closed` is terminal.
//!
//! Creation is all-or-nothing: if any acquisition step fails, everything
//! obtained so far is released on the way out and the caller gets no handle.
//! Teardown is cooperative and idempotent, and the listener always exits
//! before the device handle is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bus::{BusError, BusTarget, VirtualBus};
use crate::codec;
use crate::guid::Guid;
use crate::report::RawControllerState;
use crate::source::{AcquisitionError, DeviceHandle, InputSource, Signal};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("failed to spawn listener thread: {0}")]
    Spawn(std::io::Error),
}

/// Live binding between one controller and one virtual pad.
#[derive(Debug)]
pub struct DeviceSession {
    id: Guid,
    stop: Arc<AtomicBool>,
    signal: Signal,
    listener: Option<JoinHandle<()>>,
}

impl DeviceSession {
    /// Acquires the device `id` from `source`, plugs a virtual pad into
    /// `bus` and starts the listener.
    ///
    /// On failure at any step, resources acquired so far are dropped before
    /// returning and the identifier is not considered active.
    pub fn create(
        source: &dyn InputSource,
        bus: &dyn VirtualBus,
        id: Guid,
    ) -> Result<Self, SessionError> {
        let mut handle = source.open(id)?;
        handle.set_report_layout()?;

        let signal = Signal::new();
        handle.set_event_notification(signal.clone())?;

        let target = bus.plug_target()?;
        handle.acquire()?;

        let stop = Arc::new(AtomicBool::new(false));
        let listener = std::thread::Builder::new()
            .name(format!("listener-{id}"))
            .spawn({
                let stop = Arc::clone(&stop);
                let signal = signal.clone();
                move || listen(handle, target, signal, stop, id)
            })
            .map_err(SessionError::Spawn)?;

        debug!(%id, "session created");
        Ok(Self {
            id,
            stop,
            signal,
            listener: Some(listener),
        })
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    /// Stops the listener and waits for it to exit.
    ///
    /// The device handle and the virtual pad are owned by the listener
    /// thread, so both are released only after its loop has fully exited —
    /// a read can never race the release. Calling this twice is harmless.
    pub fn shutdown(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        self.stop.store(true, Ordering::SeqCst);
        // Wake the blocked wait; the stop flag tells it apart from data.
        self.signal.raise();
        if listener.join().is_err() {
            warn!(id = %self.id, "listener thread panicked");
        }
        info!(id = %self.id, "session closed");
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Listener loop: block until woken, read, filter, translate, push.
fn listen(
    mut handle: Box<dyn DeviceHandle>,
    mut target: Box<dyn BusTarget>,
    signal: Signal,
    stop: Arc<AtomicBool>,
    id: Guid,
) {
    let mut last: Option<RawControllerState> = None;

    loop {
        signal.wait();
        if stop.load(Ordering::SeqCst) {
            // Stop requested: exit without any further device I/O.
            break;
        }

        let mut state = match handle.read_state() {
            Ok(state) => state,
            Err(err) => {
                // Transient. Keep the previous state so the next good read
                // is compared against the last one that reached the bus.
                warn!(%id, %err, "state read failed");
                continue;
            }
        };

        // Deadzone first, so rest jitter inside the band compares equal.
        codec::apply_deadzone(&mut state);
        if last == Some(state) {
            continue;
        }

        let report = codec::translate(&state);
        if let Err(err) = target.update(&report) {
            warn!(%id, %err, "report push failed");
        }
        last = Some(state);
    }
    // `handle` and `target` drop here, after the loop: the device release
    // and the pad unplug happen strictly after the last read.
}
