#![cfg(target_os = "windows")]

//! Windows virtual-bus backend.
//!
//! Hosts the ViGEmBus implementation of the
//! [`VirtualBus`](crate::bus::VirtualBus) contract. Requires the ViGEmBus
//! kernel driver to be installed.

pub mod vigem;

pub use vigem::VigemBus;
