#![cfg(target_os = "windows")]

//! ViGEmBus virtual-bus backend.
//!
//! Implements [`VirtualBus`]/[`BusTarget`] over the `vigem-client` crate.
//! ViGEmBus is Nefarius' virtual gamepad bus driver; every target plugged
//! here shows up to the system as a wired Xbox 360 controller.
//!
//! The wrapped driver client must not see interleaved calls from different
//! threads, so the facade owns one lock that every plug, update and unplug
//! goes through — session listeners on different devices serialize here and
//! nowhere else.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use vigem_client::{Client, TargetId, XButtons, XGamepad, Xbox360Wired};

use crate::bus::{BusError, BusTarget, VirtualBus};
use crate::gamepad::GamepadReport;

/// [`VirtualBus`] over a connected ViGEmBus driver client.
pub struct VigemBus {
    client: Arc<Client>,
    lock: Arc<Mutex<()>>,
}

impl VigemBus {
    /// Connects to the ViGEmBus driver. Failure here is fatal to the
    /// caller; there is no retry.
    pub fn connect() -> Result<Self, BusError> {
        let client = Client::connect().map_err(|err| BusError::Connect(err.to_string()))?;
        debug!("connected to ViGEmBus");
        Ok(Self {
            client: Arc::new(client),
            lock: Arc::new(Mutex::new(())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VirtualBus for VigemBus {
    fn plug_target(&self) -> Result<Box<dyn BusTarget>, BusError> {
        let mut pad = Xbox360Wired::new(Arc::clone(&self.client), TargetId::XBOX360_WIRED);
        {
            let _guard = self.lock();
            pad.plugin().map_err(|err| BusError::Plug(err.to_string()))?;
            pad.wait_ready()
                .map_err(|err| BusError::Plug(err.to_string()))?;
        }
        Ok(Box::new(VigemTarget {
            pad,
            lock: Arc::clone(&self.lock),
        }))
    }
}

/// One plugged-in virtual Xbox 360 pad. Unplugs itself on drop.
struct VigemTarget {
    pad: Xbox360Wired<Arc<Client>>,
    lock: Arc<Mutex<()>>,
}

impl BusTarget for VigemTarget {
    fn update(&mut self, report: &GamepadReport) -> Result<(), BusError> {
        let gamepad = XGamepad {
            buttons: XButtons {
                raw: report.buttons,
            },
            left_trigger: report.left_trigger,
            right_trigger: report.right_trigger,
            thumb_lx: report.thumb_lx,
            thumb_ly: report.thumb_ly,
            thumb_rx: report.thumb_rx,
            thumb_ry: report.thumb_ry,
        };
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.pad
            .update(&gamepad)
            .map_err(|err| BusError::Update(err.to_string()))
    }
}

impl Drop for VigemTarget {
    fn drop(&mut self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = self.pad.unplug() {
            warn!(%err, "failed to unplug virtual pad");
        }
    }
}
