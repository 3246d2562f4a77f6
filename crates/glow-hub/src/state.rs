//! Last-known state of one light group
//!
//! Every field is optional: a field that has never been observed is
//! semantically "unknown", which is distinct from any concrete value. The
//! distinction matters because the radio medium is fire-and-forget; the
//! gateway only ever knows what it (or a captured remote) has commanded.

use glow_protocol::{Field, FieldValue};
use serde::{Deserialize, Serialize};

/// Which color system currently drives the group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Plain white, no color channel active
    White,
    /// Hue/saturation or raw RGB color
    Color,
    /// White with an explicit color temperature
    ColorTemp,
}

/// Last known state of one light group, all fields optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    power: Option<bool>,
    color_mode: Option<ColorMode>,
    brightness: Option<u8>,
    hue: Option<u16>,
    saturation: Option<u8>,
    kelvin: Option<u16>,
    rgb: Option<(u8, u8, u8)>,
}

impl GroupState {
    /// A state with every field unknown
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether any field has ever been observed
    pub fn is_known(&self) -> bool {
        self.power.is_some()
            || self.color_mode.is_some()
            || self.brightness.is_some()
            || self.hue.is_some()
            || self.saturation.is_some()
            || self.kelvin.is_some()
            || self.rgb.is_some()
    }

    pub fn power(&self) -> Option<bool> {
        self.power
    }

    pub fn color_mode(&self) -> Option<ColorMode> {
        self.color_mode
    }

    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    pub fn hue(&self) -> Option<u16> {
        self.hue
    }

    pub fn saturation(&self) -> Option<u8> {
        self.saturation
    }

    pub fn kelvin(&self) -> Option<u16> {
        self.kelvin
    }

    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        self.rgb
    }

    /// Set power and mark it known
    pub fn set_power(&mut self, on: bool) {
        self.power = Some(on);
    }

    /// Set brightness, clamped to 0-100
    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = Some(level.min(100));
    }

    /// Set hue, wrapped into 0-359; switches the group to color mode
    pub fn set_hue(&mut self, hue: u16) {
        self.hue = Some(hue % 360);
        self.color_mode = Some(ColorMode::Color);
    }

    /// Set saturation, clamped to 0-100; switches the group to color mode
    pub fn set_saturation(&mut self, saturation: u8) {
        self.saturation = Some(saturation.min(100));
        self.color_mode = Some(ColorMode::Color);
    }

    /// Set color temperature; switches the group to color-temperature mode
    pub fn set_kelvin(&mut self, kelvin: u16) {
        self.kelvin = Some(kelvin);
        self.color_mode = Some(ColorMode::ColorTemp);
    }

    /// Set a raw RGB triple; switches the group to color mode
    pub fn set_rgb(&mut self, r: u8, g: u8, b: u8) {
        self.rgb = Some((r, g, b));
        self.color_mode = Some(ColorMode::Color);
    }

    /// Set the color mode directly (e.g. restored from storage)
    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = Some(mode);
    }

    /// Apply one field command through the matching setter
    pub fn apply(&mut self, value: &FieldValue) {
        match *value {
            FieldValue::Power(on) => self.set_power(on),
            FieldValue::Brightness(level) => self.set_brightness(level),
            FieldValue::Hue(hue) => self.set_hue(hue),
            FieldValue::Saturation(sat) => self.set_saturation(sat),
            FieldValue::Kelvin(kelvin) => self.set_kelvin(kelvin),
            FieldValue::Rgb(r, g, b) => self.set_rgb(r, g, b),
        }
    }

    /// Current value of one field, if it has ever been observed
    pub fn value_of(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Power => self.power.map(FieldValue::Power),
            Field::Brightness => self.brightness.map(FieldValue::Brightness),
            Field::Hue => self.hue.map(FieldValue::Hue),
            Field::Saturation => self.saturation.map(FieldValue::Saturation),
            Field::Kelvin => self.kelvin.map(FieldValue::Kelvin),
            Field::Rgb => self.rgb.map(|(r, g, b)| FieldValue::Rgb(r, g, b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_knows_nothing() {
        let state = GroupState::unknown();
        assert!(!state.is_known());
        for field in [
            Field::Power,
            Field::Brightness,
            Field::Hue,
            Field::Saturation,
            Field::Kelvin,
            Field::Rgb,
        ] {
            assert_eq!(state.value_of(field), None);
        }
    }

    #[test]
    fn setters_clamp_and_mark_known() {
        let mut state = GroupState::unknown();
        state.set_brightness(150);
        assert_eq!(state.brightness(), Some(100));

        state.set_hue(365);
        assert_eq!(state.hue(), Some(5));
        assert_eq!(state.color_mode(), Some(ColorMode::Color));
    }

    #[test]
    fn kelvin_switches_color_mode() {
        let mut state = GroupState::unknown();
        state.set_hue(100);
        state.set_kelvin(4000);
        assert_eq!(state.color_mode(), Some(ColorMode::ColorTemp));
        // The hue value itself is retained for a later switch back
        assert_eq!(state.hue(), Some(100));
    }

    #[test]
    fn apply_leaves_unrelated_fields_untouched() {
        let mut state = GroupState::unknown();
        state.apply(&FieldValue::Power(true));
        state.apply(&FieldValue::Brightness(40));

        assert_eq!(state.power(), Some(true));
        assert_eq!(state.brightness(), Some(40));
        assert_eq!(state.hue(), None);
        assert_eq!(state.saturation(), None);
    }

    #[test]
    fn state_round_trips_through_serde() {
        let mut state = GroupState::unknown();
        state.apply(&FieldValue::Power(true));
        state.apply(&FieldValue::Hue(210));
        state.apply(&FieldValue::Brightness(60));

        let json = serde_json::to_string(&state).unwrap();
        let back: GroupState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
