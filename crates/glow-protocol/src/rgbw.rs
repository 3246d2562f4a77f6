//! RGBW remote protocol (4-zone color remotes)
//!
//! The oldest variant in the family: 7-byte plaintext frames, no checksum.
//! Color is a single wheel byte, so the variant has hue but no saturation
//! and no color temperature.
//!
//! # Frame format
//! ```text
//! [TAG] [ID_HI] [ID_LO] [COLOR] [BG] [BUTTON] [SEQ]
//! ```
//!
//! - `COLOR`: hue 0-359 scaled onto the 0-255 color wheel
//! - `BG`: brightness (5 bits, 0-31) << 3 | group (3 bits, 0-4)
//! - `SEQ`: wrapping sequence byte; receivers use it to ignore the
//!   retransmissions the sender emits for reliability

use crate::command::FieldValue;
use crate::error::{ParseError, ProtocolError};
use crate::{BulbId, DecodedPacket, Protocol};

/// Header byte identifying RGBW frames
pub const TAG: u8 = 0xB4;

/// Fixed frame length
pub const FRAME_LEN: usize = 7;

/// RGBW button codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbwButton {
    /// Group on
    On = 0x01,
    /// Group off
    Off = 0x02,
    /// Select a color on the wheel
    SetColor = 0x03,
    /// Set brightness
    SetBrightness = 0x04,
}

impl TryFrom<u8> for RgbwButton {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::On),
            0x02 => Ok(Self::Off),
            0x03 => Ok(Self::SetColor),
            0x04 => Ok(Self::SetBrightness),
            other => Err(ParseError::UnknownCommand(other)),
        }
    }
}

/// Scale hue 0-359 onto the remote's 0-255 color wheel
fn hue_to_wheel(hue: u16) -> u8 {
    ((u32::from(hue) * 255) / 359) as u8
}

/// Inverse of [`hue_to_wheel`], within rounding error
fn wheel_to_hue(wheel: u8) -> u16 {
    ((u32::from(wheel) * 359) / 255) as u16
}

/// Scale brightness 0-100 onto the 5-bit wire range
fn brightness_to_wire(level: u8) -> u8 {
    ((u32::from(level) * 31) / 100) as u8
}

fn wire_to_brightness(wire: u8) -> u8 {
    ((u32::from(wire & 0x1F) * 100) / 31) as u8
}

/// Encode one field command into an RGBW frame
pub fn encode(bulb: &BulbId, value: &FieldValue, sequence: u8) -> Result<Vec<u8>, ProtocolError> {
    let (color, brightness, button) = match *value {
        FieldValue::Power(true) => (0, 0, RgbwButton::On),
        FieldValue::Power(false) => (0, 0, RgbwButton::Off),
        FieldValue::Hue(hue) => (hue_to_wheel(hue), 0, RgbwButton::SetColor),
        FieldValue::Brightness(level) => (0, brightness_to_wire(level), RgbwButton::SetBrightness),
        // Saturation/Kelvin/Rgb are filtered out by the descriptor check
        // before encode is reached
        _ => {
            return Err(ProtocolError::UnsupportedField {
                variant: Protocol::Rgbw.name(),
                field: value.field(),
            })
        }
    };

    Ok(vec![
        TAG,
        (bulb.device_id >> 8) as u8,
        (bulb.device_id & 0xFF) as u8,
        color,
        (brightness << 3) | (bulb.group_id & 0x07),
        button as u8,
        sequence,
    ])
}

/// Decode an RGBW frame back into a field command
pub fn decode(frame: &[u8]) -> Result<DecodedPacket, ProtocolError> {
    let frame = crate::check_frame_len(frame, FRAME_LEN)?;

    let device_id = (u16::from(frame[1]) << 8) | u16::from(frame[2]);
    let group_id = frame[4] & 0x07;
    if group_id > Protocol::Rgbw.describe().max_group {
        return Err(ParseError::InvalidGroup(group_id).into());
    }

    let value = match RgbwButton::try_from(frame[5])? {
        RgbwButton::On => FieldValue::Power(true),
        RgbwButton::Off => FieldValue::Power(false),
        RgbwButton::SetColor => FieldValue::Hue(wheel_to_hue(frame[3])),
        RgbwButton::SetBrightness => FieldValue::Brightness(wire_to_brightness(frame[4] >> 3)),
    };

    Ok(DecodedPacket {
        bulb: BulbId::new(device_id, group_id, Protocol::Rgbw),
        value,
        sequence: frame[6],
    })
}
