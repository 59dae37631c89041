//! Backends implementing the external-interface contracts.
//!
//! - [`hid`] — the [`InputSource`](crate::source::InputSource) over the
//!   system HID stack (cross-platform).
//! - [`windows`] — the [`VirtualBus`](crate::bus::VirtualBus) over the
//!   ViGEmBus driver (Windows only).
//!
//! The core never depends on a concrete backend; everything above this
//! module works against the `source` and `bus` traits.

pub mod hid;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;
