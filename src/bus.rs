//! Virtual-bus contract.
//!
//! The bus presents emulated standard gamepads to the rest of the operating
//! environment. The core only ever plugs targets in and pushes reports;
//! allocation, driver I/O and serialization live in the backend.

use thiserror::Error;

use crate::gamepad::GamepadReport;

#[derive(Debug, Error)]
pub enum BusError {
    /// Connecting to the bus driver failed. Fatal at process start; never
    /// retried.
    #[error("virtual bus connection failed: {0}")]
    Connect(String),
    /// Allocating or attaching a target failed. Aborts session creation.
    #[error("virtual pad plug-in failed: {0}")]
    Plug(String),
    /// A report push failed. Logged by the listener; the report is dropped,
    /// not retried or queued.
    #[error("virtual pad update failed: {0}")]
    Update(String),
}

/// A bus that can expose virtual gamepads.
pub trait VirtualBus: Send + Sync {
    /// Allocates one virtual pad and attaches it to the bus. Dropping the
    /// returned target detaches and frees it.
    fn plug_target(&self) -> Result<Box<dyn BusTarget>, BusError>;
}

/// One attached virtual pad.
pub trait BusTarget: Send {
    /// Pushes a new report to the virtual pad.
    fn update(&mut self, report: &GamepadReport) -> Result<(), BusError>;
}
