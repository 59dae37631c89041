//! Raw-to-normalized report translation.
//!
//! Everything in this module is pure: one [`RawControllerState`] in, one
//! [`GamepadReport`] out, no I/O and no hidden state. The one mutating entry
//! point, [`apply_deadzone`], exists so the listener can snap jittery stick
//! readings *before* comparing the snapshot against the previous one —
//! deadzone snapping is what makes the no-change filter suppress rest noise.

use crate::gamepad::{buttons, GamepadReport};
use crate::report::{N64Button, RawControllerState};

// Primary-stick deadzones, raw units. A reading strictly inside a band is
// snapped to the band midpoint.
const X_DEADZONE: (i32, i32) = (31_700, 32_000);
const Y_DEADZONE: (i32, i32) = (29_600, 29_900);

// Primary-stick calibration ranges, raw units.
const X_RANGE: (i32, i32) = (9_800, 54_300);
const Y_RANGE: (i32, i32) = (6_700, 51_800);

/// Radius the emulated C-button stick is stretched to.
const C_STICK_RADIUS: f32 = 32_767.0;

/// Source slot to destination bit, one entry per bound button.
///
/// `LEFT_THUMB`, `RIGHT_THUMB` and `Y` have no source control and are never
/// driven. Z is absent here because it drives the left trigger instead.
const BUTTON_MAP: [(N64Button, u16); 8] = [
    (N64Button::A, buttons::A),
    (N64Button::B, buttons::B),
    (N64Button::Zr, buttons::X),
    (N64Button::LeftBumper, buttons::LEFT_SHOULDER),
    (N64Button::RightBumper, buttons::RIGHT_SHOULDER),
    (N64Button::Start, buttons::START),
    (N64Button::Home, buttons::GUIDE),
    (N64Button::Circle, buttons::BACK),
];

/// Snaps primary-stick readings inside their deadzone band to the band
/// midpoint. Idempotent; must run before the snapshot is compared against
/// the previously read one.
pub fn apply_deadzone(state: &mut RawControllerState) {
    state.stick_x = snap(state.stick_x, X_DEADZONE);
    state.stick_y = snap(state.stick_y, Y_DEADZONE);
}

fn snap(value: i32, (start, end): (i32, i32)) -> i32 {
    if value > start && value < end {
        (start + end) / 2
    } else {
        value
    }
}

/// Translates one raw snapshot into a normalized gamepad report.
pub fn translate(state: &RawControllerState) -> GamepadReport {
    let (thumb_rx, thumb_ry) = c_stick(
        c_axis(
            state.pressed(N64Button::CLeft),
            state.pressed(N64Button::CRight),
        ),
        c_axis(
            state.pressed(N64Button::CDown),
            state.pressed(N64Button::CUp),
        ),
    );

    let mut mask = pov_bits(state.pov);
    for (button, bit) in BUTTON_MAP {
        if state.pressed(button) {
            mask |= bit;
        }
    }

    GamepadReport {
        buttons: mask,
        // Z is digital on the source device: full pull or nothing.
        left_trigger: if state.pressed(N64Button::Z) { 255 } else { 0 },
        right_trigger: 0,
        thumb_lx: scale_axis(state.stick_x, X_RANGE),
        // Raw Y grows downward; the virtual pad expects up-positive.
        thumb_ly: -scale_axis(state.stick_y, Y_RANGE),
        thumb_rx,
        thumb_ry,
    }
}

/// Maps a raw axis value onto the signed 16-bit output domain.
///
/// Clamps below at `min`, scales `(value - min) / (max - min)` onto
/// `[0, 65535]`, clamps the top, then recenters by 32767.5 and truncates.
/// Out-of-calibration readings saturate; they never wrap.
fn scale_axis(value: i32, (min, max): (i32, i32)) -> i16 {
    let span = (max - min) as f32;
    let scaled = ((value - min).max(0) as f32 / span * 65_535.0).min(65_535.0);
    (scaled - 32_767.5) as i16
}

/// Collapses one opposing C-button pair into a signed unit value.
/// Both-or-neither pressed cancels to zero.
fn c_axis(negative: bool, positive: bool) -> i16 {
    match (negative, positive) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// Stretches the C-button unit vector to the full stick radius, so diagonals
/// come out at full strength instead of magnitude sqrt(2).
fn c_stick(x: i16, y: i16) -> (i16, i16) {
    let (fx, fy) = (f32::from(x), f32::from(y));
    let magnitude = (fx * fx + fy * fy).sqrt();
    if magnitude == 0.0 {
        return (0, 0);
    }
    (
        (fx / magnitude * C_STICK_RADIUS).round() as i16,
        (fy / magnitude * C_STICK_RADIUS).round() as i16,
    )
}

/// Maps the eight exact compass readings to d-pad bits. Any other value,
/// including the centered sentinel, maps to no d-pad bits at all.
fn pov_bits(pov: i32) -> u16 {
    use buttons::{DPAD_DOWN, DPAD_LEFT, DPAD_RIGHT, DPAD_UP};
    match pov {
        0 => DPAD_UP,
        4_500 => DPAD_UP | DPAD_RIGHT,
        9_000 => DPAD_RIGHT,
        13_500 => DPAD_RIGHT | DPAD_DOWN,
        18_000 => DPAD_DOWN,
        22_500 => DPAD_DOWN | DPAD_LEFT,
        27_000 => DPAD_LEFT,
        31_500 => DPAD_LEFT | DPAD_UP,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::POV_CENTERED;

    fn state_with(f: impl FnOnce(&mut RawControllerState)) -> RawControllerState {
        let mut state = RawControllerState::default();
        f(&mut state);
        state
    }

    fn press(state: &mut RawControllerState, button: N64Button) {
        state.buttons[button as usize] = true;
    }

    #[test]
    fn axis_saturates_at_both_ends() {
        assert_eq!(scale_axis(X_RANGE.0, X_RANGE), -32_767);
        assert_eq!(scale_axis(X_RANGE.0 - 40_000, X_RANGE), -32_767);
        assert_eq!(scale_axis(X_RANGE.1, X_RANGE), 32_767);
        assert_eq!(scale_axis(X_RANGE.1 + 40_000, X_RANGE), 32_767);
    }

    #[test]
    fn axis_midpoint_lands_near_zero() {
        let mid = (X_RANGE.0 + X_RANGE.1) / 2;
        assert!(scale_axis(mid, X_RANGE).abs() <= 1);
    }

    #[test]
    fn raw_y_is_inverted_on_output() {
        let low = state_with(|s| s.stick_y = Y_RANGE.0);
        let high = state_with(|s| s.stick_y = Y_RANGE.1);
        assert_eq!(translate(&low).thumb_ly, 32_767);
        assert_eq!(translate(&high).thumb_ly, -32_767);
    }

    #[test]
    fn deadzone_snaps_to_midpoint_from_either_side() {
        let mid = (X_DEADZONE.0 + X_DEADZONE.1) / 2;
        let mut from_below = state_with(|s| s.stick_x = X_DEADZONE.0 + 1);
        let mut from_above = state_with(|s| s.stick_x = X_DEADZONE.1 - 1);
        apply_deadzone(&mut from_below);
        apply_deadzone(&mut from_above);
        assert_eq!(from_below.stick_x, mid);
        assert_eq!(from_above.stick_x, mid);
    }

    #[test]
    fn deadzone_is_idempotent() {
        let mut state = state_with(|s| {
            s.stick_x = X_DEADZONE.0 + 7;
            s.stick_y = Y_DEADZONE.1 - 2;
        });
        apply_deadzone(&mut state);
        let once = state;
        apply_deadzone(&mut state);
        assert_eq!(state, once);
    }

    #[test]
    fn deadzone_band_edges_pass_through() {
        let mut state = state_with(|s| {
            s.stick_x = X_DEADZONE.0;
            s.stick_y = Y_DEADZONE.1;
        });
        apply_deadzone(&mut state);
        assert_eq!(state.stick_x, X_DEADZONE.0);
        assert_eq!(state.stick_y, Y_DEADZONE.1);
    }

    #[test]
    fn translate_is_deterministic() {
        let state = state_with(|s| {
            s.stick_x = 20_000;
            s.stick_y = 40_000;
            s.pov = 9_000;
            press(s, N64Button::A);
            press(s, N64Button::CUp);
        });
        assert_eq!(translate(&state), translate(&state));
    }

    #[test]
    fn every_pov_compass_reading_maps_to_its_bits() {
        use buttons::{DPAD_DOWN, DPAD_LEFT, DPAD_RIGHT, DPAD_UP};
        let expected = [
            (0, DPAD_UP),
            (4_500, DPAD_UP | DPAD_RIGHT),
            (9_000, DPAD_RIGHT),
            (13_500, DPAD_RIGHT | DPAD_DOWN),
            (18_000, DPAD_DOWN),
            (22_500, DPAD_DOWN | DPAD_LEFT),
            (27_000, DPAD_LEFT),
            (31_500, DPAD_LEFT | DPAD_UP),
        ];
        for (angle, bits) in expected {
            assert_eq!(pov_bits(angle), bits, "angle {angle}");
        }
    }

    #[test]
    fn unexpected_pov_readings_map_to_no_bits() {
        for angle in [POV_CENTERED, 1, 4_499, 4_501, 36_000, i32::MAX] {
            assert_eq!(pov_bits(angle), 0, "angle {angle}");
        }
    }

    #[test]
    fn c_buttons_reach_full_radius_on_diagonals() {
        // Left + down: unit vector at 225 degrees.
        let state = state_with(|s| {
            press(s, N64Button::CLeft);
            press(s, N64Button::CDown);
        });
        let report = translate(&state);
        assert_eq!(report.thumb_rx, -23_170);
        assert_eq!(report.thumb_ry, -23_170);

        let magnitude = f64::from(report.thumb_rx)
            .hypot(f64::from(report.thumb_ry));
        assert!((magnitude - 32_767.0).abs() <= 1.0);
    }

    #[test]
    fn c_buttons_reach_full_radius_on_cardinals() {
        let state = state_with(|s| press(s, N64Button::CUp));
        let report = translate(&state);
        assert_eq!((report.thumb_rx, report.thumb_ry), (0, 32_767));
    }

    #[test]
    fn opposing_c_buttons_cancel() {
        let state = state_with(|s| {
            press(s, N64Button::CLeft);
            press(s, N64Button::CRight);
            press(s, N64Button::CUp);
        });
        let report = translate(&state);
        assert_eq!((report.thumb_rx, report.thumb_ry), (0, 32_767));

        let both_pairs = state_with(|s| {
            press(s, N64Button::CLeft);
            press(s, N64Button::CRight);
        });
        let report = translate(&both_pairs);
        assert_eq!((report.thumb_rx, report.thumb_ry), (0, 0));
    }

    #[test]
    fn z_drives_the_left_trigger_only() {
        let state = state_with(|s| press(s, N64Button::Z));
        let report = translate(&state);
        assert_eq!(report.left_trigger, 255);
        assert_eq!(report.right_trigger, 0);
        assert_eq!(report.buttons, 0);

        let released = translate(&RawControllerState::default());
        assert_eq!(released.left_trigger, 0);
    }

    #[test]
    fn pressed_buttons_or_into_one_mask() {
        let state = state_with(|s| {
            press(s, N64Button::A);
            press(s, N64Button::Zr);
            press(s, N64Button::Home);
            s.pov = 18_000;
        });
        let report = translate(&state);
        assert_eq!(
            report.buttons,
            buttons::A | buttons::X | buttons::GUIDE | buttons::DPAD_DOWN
        );
    }

    #[test]
    fn reserved_bits_are_never_driven() {
        // Press every slot and point the d-pad somewhere: the thumb-click
        // and Y bits must still be clear.
        let mut state = state_with(|s| s.pov = 4_500);
        state.buttons = [true; crate::report::BUTTON_SLOTS];
        let report = translate(&state);
        assert_eq!(
            report.buttons & (buttons::LEFT_THUMB | buttons::RIGHT_THUMB | buttons::Y),
            0
        );
    }

    #[test]
    fn rest_state_translates_to_an_empty_report() {
        let mut state = RawControllerState::default();
        apply_deadzone(&mut state);
        let report = translate(&state);
        assert_eq!(report.buttons, 0);
        assert_eq!((report.thumb_rx, report.thumb_ry), (0, 0));
        // Stick axes rest below calibration minimum and saturate low.
        assert_eq!(report.thumb_lx, -32_767);
    }
}
