//! Bridges Nintendo Switch Online N64 controllers to virtual Xbox 360
//! gamepads.
//!
//! The crate is split into a portable core and platform backends:
//!
//! - [`guid`], [`report`], [`gamepad`] — the identifier and report types
//!   flowing through the bridge.
//! - [`codec`] — deadzone snapping and raw-to-gamepad translation.
//! - [`source`] / [`bus`] — the contracts a platform backend fills in:
//!   where controller reports come from and where translated reports go.
//! - [`session`] — one attached controller end to end: acquisition,
//!   listener thread, teardown.
//! - [`detector`] — the hot-plug poll loop driving session lifetimes.
//! - [`backends`] — concrete `source`/`bus` implementations.
//!
//! The core never touches a platform API directly, so everything above
//! `backends` builds and tests on any platform.

pub mod backends;
pub mod bus;
pub mod codec;
pub mod detector;
pub mod gamepad;
pub mod guid;
pub mod report;
pub mod session;
pub mod source;

pub use detector::{HotplugDetector, HotplugEvent};
pub use guid::Guid;
pub use session::DeviceSession;
