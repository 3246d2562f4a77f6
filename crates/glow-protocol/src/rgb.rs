//! RGB controller protocol (zoneless strip controllers)
//!
//! These controllers predate the hue/saturation model: they take a raw RGB
//! triple and have no zones, so the group id is always 0 and a device id
//! addresses exactly one controller.
//!
//! # Frame format
//! ```text
//! [TAG] [ID_HI] [ID_LO] [BUTTON] [P1] [P2] [P3] [SEQ]
//! ```
//!
//! `P1..P3` carry the RGB triple for `SetRgb`; `P1` carries the level for
//! `SetBrightness`.

use crate::command::FieldValue;
use crate::error::{ParseError, ProtocolError};
use crate::{BulbId, DecodedPacket, Protocol};

/// Header byte identifying RGB frames
pub const TAG: u8 = 0xA4;

/// Fixed frame length
pub const FRAME_LEN: usize = 8;

/// RGB controller button codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbButton {
    /// Controller on
    On = 0x01,
    /// Controller off
    Off = 0x02,
    /// Set brightness
    SetBrightness = 0x03,
    /// Set a raw RGB triple
    SetRgb = 0x04,
}

impl TryFrom<u8> for RgbButton {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::On),
            0x02 => Ok(Self::Off),
            0x03 => Ok(Self::SetBrightness),
            0x04 => Ok(Self::SetRgb),
            other => Err(ParseError::UnknownCommand(other)),
        }
    }
}

/// Encode one field command into an RGB frame
pub fn encode(bulb: &BulbId, value: &FieldValue, sequence: u8) -> Result<Vec<u8>, ProtocolError> {
    let (button, p1, p2, p3) = match *value {
        FieldValue::Power(true) => (RgbButton::On, 0, 0, 0),
        FieldValue::Power(false) => (RgbButton::Off, 0, 0, 0),
        FieldValue::Brightness(level) => (RgbButton::SetBrightness, level, 0, 0),
        FieldValue::Rgb(r, g, b) => (RgbButton::SetRgb, r, g, b),
        _ => {
            return Err(ProtocolError::UnsupportedField {
                variant: Protocol::Rgb.name(),
                field: value.field(),
            })
        }
    };

    Ok(vec![
        TAG,
        (bulb.device_id >> 8) as u8,
        (bulb.device_id & 0xFF) as u8,
        button as u8,
        p1,
        p2,
        p3,
        sequence,
    ])
}

/// Decode an RGB frame back into a field command
pub fn decode(frame: &[u8]) -> Result<DecodedPacket, ProtocolError> {
    let frame = crate::check_frame_len(frame, FRAME_LEN)?;

    let device_id = (u16::from(frame[1]) << 8) | u16::from(frame[2]);

    let value = match RgbButton::try_from(frame[3])? {
        RgbButton::On => FieldValue::Power(true),
        RgbButton::Off => FieldValue::Power(false),
        RgbButton::SetBrightness => FieldValue::Brightness(frame[4].min(100)),
        RgbButton::SetRgb => FieldValue::Rgb(frame[4], frame[5], frame[6]),
    };

    Ok(DecodedPacket {
        bulb: BulbId::new(device_id, 0, Protocol::Rgb),
        value,
        sequence: frame[7],
    })
}
