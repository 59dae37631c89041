//! Raw controller report model.
//!
//! [`RawControllerState`] is the fixed-layout snapshot delivered by the input
//! source, before any translation. The listener compares consecutive
//! snapshots with `==` (after the deadzone pass) to skip no-change reports,
//! so every field that can jitter must live in this struct.

/// POV reading meaning "no direction pressed".
pub const POV_CENTERED: i32 = -1;

/// Number of digital button slots in the raw report.
pub const BUTTON_SLOTS: usize = 16;

/// Source button slots, in raw report wire order.
///
/// Slots 11, 14 and 15 exist in the report but carry no control on this
/// controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum N64Button {
    B = 0,
    A = 1,
    CUp = 2,
    CLeft = 3,
    LeftBumper = 4,
    RightBumper = 5,
    Z = 6,
    CDown = 7,
    CRight = 8,
    Start = 9,
    Zr = 10,
    Home = 12,
    Circle = 13,
}

/// One controller's current state, in raw device units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawControllerState {
    /// D-pad angle in centidegrees (0 = up, clockwise), or [`POV_CENTERED`].
    pub pov: i32,
    /// Primary analog stick.
    pub stick_x: i32,
    pub stick_y: i32,
    /// Rotation axis pair. The codec ignores these, but they take part in
    /// the no-change comparison like every other field.
    pub rot_x: i32,
    pub rot_y: i32,
    /// Digital button slots, indexed by [`N64Button`].
    pub buttons: [bool; BUTTON_SLOTS],
}

impl RawControllerState {
    pub fn pressed(&self, button: N64Button) -> bool {
        self.buttons[button as usize]
    }
}

impl Default for RawControllerState {
    /// Everything at rest: POV centered, axes at zero, no buttons held.
    fn default() -> Self {
        Self {
            pov: POV_CENTERED,
            stick_x: 0,
            stick_y: 0,
            rot_x: 0,
            rot_y: 0,
            buttons: [false; BUTTON_SLOTS],
        }
    }
}
