//! HID-backed input source for the NSO N64 controller.
//!
//! Implements [`InputSource`]/[`DeviceHandle`] over `hidapi`. Enumeration
//! filters on the controller's product signature (VID `0x057e`,
//! PID `0x2019`) and synthesizes a DirectInput-style instance GUID per
//! attached interface.
//!
//! hidapi delivers reports through blocking reads rather than a data-ready
//! event, so each acquired handle runs a small internal report pump: a
//! thread that blocks on the read, parses and stores the newest snapshot,
//! and raises the armed [`Signal`]. From the session's point of view the
//! handle behaves exactly like an event-notified device.
//!
//! Calls through the shared `HidApi` instance must not interleave; the
//! source owns the one lock that serializes them. Per-device reads go
//! through their own `HidDevice` handles, which hidapi allows concurrently.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use hidapi::{HidApi, HidDevice};
use tracing::{debug, warn};

use crate::guid::Guid;
use crate::report::{RawControllerState, BUTTON_SLOTS, POV_CENTERED};
use crate::source::{
    AcquisitionError, DeviceHandle, EnumerationError, InputSource, ReadError, Signal,
};

/// USB vendor id of Nintendo.
pub const VENDOR_ID: u16 = 0x057e;
/// Product id of the NSO N64 wireless controller.
pub const PRODUCT_ID: u16 = 0x2019;

/// Pump read timeout in milliseconds; bounds how long handle teardown can
/// block on joining the pump.
const PUMP_READ_TIMEOUT_MS: i32 = 250;

/// Simple-mode input report id.
const REPORT_ID: u8 = 0x3f;
/// Report id + 2 button bytes + hat byte + four u16 little-endian axes.
const REPORT_LEN: usize = 12;

/// [`InputSource`] over the system HID stack.
pub struct HidSource {
    api: Mutex<HidApi>,
    /// Instance GUID → platform path, rebuilt on every enumeration.
    paths: Mutex<HashMap<Guid, CString>>,
}

impl HidSource {
    pub fn new() -> Result<Self, hidapi::HidError> {
        Ok(Self {
            api: Mutex::new(HidApi::new()?),
            paths: Mutex::new(HashMap::new()),
        })
    }

    fn lock_api(&self) -> MutexGuard<'_, HidApi> {
        self.api.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_paths(&self) -> MutexGuard<'_, HashMap<Guid, CString>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for HidSource {
    fn enumerate(&self) -> Result<Vec<Guid>, EnumerationError> {
        let mut api = self.lock_api();
        api.refresh_devices()
            .map_err(|err| EnumerationError(err.to_string()))?;

        let mut paths = self.lock_paths();
        paths.clear();
        let mut ids = Vec::new();
        for info in api.device_list() {
            if info.vendor_id() != VENDOR_ID || info.product_id() != PRODUCT_ID {
                continue;
            }
            let id = instance_guid(info.path());
            paths.insert(id, info.path().to_owned());
            ids.push(id);
        }
        Ok(ids)
    }

    fn open(&self, id: Guid) -> Result<Box<dyn DeviceHandle>, AcquisitionError> {
        let path = self
            .lock_paths()
            .get(&id)
            .cloned()
            .ok_or_else(|| AcquisitionError::Open(format!("{id} is not attached")))?;
        let device = self
            .lock_api()
            .open_path(&path)
            .map_err(|err| AcquisitionError::Open(err.to_string()))?;
        debug!(%id, "opened hid device");
        Ok(Box::new(HidHandle {
            id,
            device: Some(device),
            signal: None,
            shared: Arc::new(PumpShared {
                stop: AtomicBool::new(false),
                state: Mutex::new(None),
            }),
            pump: None,
        }))
    }
}

/// Synthesizes a DirectInput-style instance GUID for one attached interface.
///
/// `data1` carries the product signature the way DirectInput product GUIDs
/// lay it out (`pppp` high, `vvvv` low); the remaining bytes hash the
/// platform path, so the identifier is unique per interface and stable
/// between polls while the device stays attached.
fn instance_guid(path: &CStr) -> Guid {
    let primary = fnv1a(path.to_bytes());
    let secondary = fnv1a(&primary.to_le_bytes());
    Guid::new(
        u32::from(PRODUCT_ID) << 16 | u32::from(VENDOR_ID),
        (primary >> 48) as u16,
        (primary >> 32) as u16,
        secondary.to_be_bytes(),
    )
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// One opened controller, pumping reports into the armed signal.
struct HidHandle {
    id: Guid,
    /// Present until `acquire` hands the device to the pump thread.
    device: Option<HidDevice>,
    signal: Option<Signal>,
    shared: Arc<PumpShared>,
    pump: Option<JoinHandle<()>>,
}

struct PumpShared {
    stop: AtomicBool,
    state: Mutex<Option<RawControllerState>>,
}

impl DeviceHandle for HidHandle {
    fn set_report_layout(&mut self) -> Result<(), AcquisitionError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| AcquisitionError::Layout("device already acquired".into()))?;
        // Switch protocol subcommand 0x03: select input report mode 0x3f
        // ("simple HID"), with a neutral rumble payload.
        let packet: [u8; 12] = [
            0x01, 0x00, 0x00, 0x01, 0x40, 0x40, 0x00, 0x01, 0x40, 0x40, 0x03, REPORT_ID,
        ];
        device
            .write(&packet)
            .map_err(|err| AcquisitionError::Layout(err.to_string()))?;
        Ok(())
    }

    fn set_event_notification(&mut self, signal: Signal) -> Result<(), AcquisitionError> {
        self.signal = Some(signal);
        Ok(())
    }

    fn acquire(&mut self) -> Result<(), AcquisitionError> {
        let device = self
            .device
            .take()
            .ok_or_else(|| AcquisitionError::Acquire("device already acquired".into()))?;
        let signal = self
            .signal
            .clone()
            .ok_or_else(|| AcquisitionError::Acquire("no data-ready signal armed".into()))?;
        let shared = Arc::clone(&self.shared);
        let id = self.id;
        let pump = std::thread::Builder::new()
            .name(format!("hid-pump-{id}"))
            .spawn(move || pump_reports(device, shared, signal, id))
            .map_err(|err| AcquisitionError::Acquire(err.to_string()))?;
        self.pump = Some(pump);
        Ok(())
    }

    fn read_state(&mut self) -> Result<RawControllerState, ReadError> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ok_or_else(|| ReadError("no report received yet".into()))
    }
}

impl Drop for HidHandle {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(pump) = self.pump.take() {
            // Bounded by the pump's read timeout.
            let _ = pump.join();
        }
    }
}

fn pump_reports(device: HidDevice, shared: Arc<PumpShared>, signal: Signal, id: Guid) {
    let mut buf = [0u8; 64];
    let mut failing = false;
    while !shared.stop.load(Ordering::SeqCst) {
        match device.read_timeout(&mut buf, PUMP_READ_TIMEOUT_MS) {
            // Timeout: nothing arrived, check the stop flag and keep going.
            Ok(0) => continue,
            Ok(len) => {
                failing = false;
                match parse_report(&buf[..len]) {
                    Some(state) => {
                        *shared.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
                        signal.raise();
                    }
                    None => debug!(%id, len, "ignoring unrecognized report"),
                }
            }
            Err(err) => {
                // Report a failing device once, not once per retry.
                if !failing {
                    warn!(%id, %err, "hid read failed");
                    failing = true;
                }
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
        }
    }
}

/// Parses one simple-mode input report.
///
/// Layout (12 bytes):
/// - `[0]` report id `0x3f`
/// - `[1..3]` button bits, little-endian, bit index matching
///   [`N64Button`](crate::report::N64Button) slot order
/// - `[3]` hat: `0..=7` clockwise from up, anything else centered
/// - `[4..12]` four u16 little-endian axes: stick X, stick Y, rotation X,
///   rotation Y
fn parse_report(data: &[u8]) -> Option<RawControllerState> {
    if data.len() < REPORT_LEN || data[0] != REPORT_ID {
        return None;
    }

    let bits = u16::from_le_bytes([data[1], data[2]]);
    let mut buttons = [false; BUTTON_SLOTS];
    for (slot, pressed) in buttons.iter_mut().enumerate() {
        *pressed = bits & (1 << slot) != 0;
    }

    let axis = |offset: usize| i32::from(u16::from_le_bytes([data[offset], data[offset + 1]]));
    Some(RawControllerState {
        pov: match data[3] {
            direction @ 0..=7 => i32::from(direction) * 4_500,
            _ => POV_CENTERED,
        },
        stick_x: axis(4),
        stick_y: axis(6),
        rot_x: axis(8),
        rot_y: axis(10),
        buttons,
    })
}
