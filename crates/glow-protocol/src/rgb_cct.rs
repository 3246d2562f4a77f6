//! RGB+CCT remote protocol (full-color remotes, two generations)
//!
//! The newest frame format in the family, shared by two remote generations:
//! the 4-zone `RgbCct` remotes and the 8-zone `Fut089` panels. The two
//! differ only in header byte and zone count, so one codec serves both, the
//! header selecting the family member.
//!
//! Frames are whitened on air: every byte after the header is XORed with a
//! fixed key stream, and a wrapping-sum checksum over the plaintext is
//! appended before whitening. The whitening is obfuscation, not crypto; it
//! exists so frames do not look like the older plaintext variants to naive
//! receivers.
//!
//! # Plaintext layout
//! ```text
//! [TAG] [ID_HI] [ID_LO] [CMD] [ARG_HI] [ARG_LO] [SEQ] [GROUP] [CHK]
//! ```

use crate::command::FieldValue;
use crate::error::{ParseError, ProtocolError};
use crate::{BulbId, DecodedPacket, Protocol};

/// Header byte for 4-zone RGB+CCT remotes
pub const TAG_RGB_CCT: u8 = 0x25;

/// Header byte for 8-zone Fut089 panels
pub const TAG_FUT089: u8 = 0x21;

/// Fixed frame length
pub const FRAME_LEN: usize = 9;

/// XOR key stream applied to bytes 1..9 on air
const WHITEN_KEY: [u8; 8] = [0x1F, 0x2B, 0x38, 0x4D, 0x5A, 0x66, 0x73, 0x81];

/// RGB+CCT command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbCctCommand {
    /// Group on
    On = 0x01,
    /// Group off
    Off = 0x02,
    /// Set brightness
    SetBrightness = 0x03,
    /// Set hue (16-bit argument, 0-359)
    SetHue = 0x04,
    /// Set saturation
    SetSaturation = 0x05,
    /// Set color temperature (16-bit argument, kelvin)
    SetKelvin = 0x06,
}

impl TryFrom<u8> for RgbCctCommand {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::On),
            0x02 => Ok(Self::Off),
            0x03 => Ok(Self::SetBrightness),
            0x04 => Ok(Self::SetHue),
            0x05 => Ok(Self::SetSaturation),
            0x06 => Ok(Self::SetKelvin),
            other => Err(ParseError::UnknownCommand(other)),
        }
    }
}

fn whiten(frame: &mut [u8]) {
    for (byte, key) in frame[1..].iter_mut().zip(WHITEN_KEY) {
        *byte ^= key;
    }
}

// Whitening is a self-inverse XOR, so dewhitening is the same operation.
fn dewhiten(frame: &mut [u8]) {
    whiten(frame);
}

fn checksum(frame: &[u8]) -> u8 {
    frame.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode one field command into a whitened RGB+CCT frame
pub fn encode(bulb: &BulbId, value: &FieldValue, sequence: u8) -> Result<Vec<u8>, ProtocolError> {
    let tag = match bulb.protocol {
        Protocol::Fut089 => TAG_FUT089,
        _ => TAG_RGB_CCT,
    };

    let (command, arg) = match *value {
        FieldValue::Power(true) => (RgbCctCommand::On, 0u16),
        FieldValue::Power(false) => (RgbCctCommand::Off, 0),
        FieldValue::Brightness(level) => (RgbCctCommand::SetBrightness, u16::from(level)),
        FieldValue::Hue(hue) => (RgbCctCommand::SetHue, hue),
        FieldValue::Saturation(sat) => (RgbCctCommand::SetSaturation, u16::from(sat)),
        FieldValue::Kelvin(kelvin) => (RgbCctCommand::SetKelvin, kelvin),
        FieldValue::Rgb(..) => {
            return Err(ProtocolError::UnsupportedField {
                variant: bulb.protocol.name(),
                field: value.field(),
            })
        }
    };

    let mut frame = vec![
        tag,
        (bulb.device_id >> 8) as u8,
        (bulb.device_id & 0xFF) as u8,
        command as u8,
        (arg >> 8) as u8,
        (arg & 0xFF) as u8,
        sequence,
        bulb.group_id,
    ];
    frame.push(checksum(&frame));
    whiten(&mut frame);
    Ok(frame)
}

/// Dewhiten and decode an RGB+CCT frame back into a field command
pub fn decode(frame: &[u8]) -> Result<DecodedPacket, ProtocolError> {
    let frame = crate::check_frame_len(frame, FRAME_LEN)?;

    let protocol = match frame[0] {
        TAG_FUT089 => Protocol::Fut089,
        _ => Protocol::RgbCct,
    };

    let mut plain = [0u8; FRAME_LEN];
    plain.copy_from_slice(frame);
    dewhiten(&mut plain);

    let expected = checksum(&plain[..8]);
    if plain[8] != expected {
        tracing::warn!(
            "{} frame failed checksum after dewhitening: expected 0x{:02X}, got 0x{:02X}",
            protocol.name(),
            expected,
            plain[8]
        );
        return Err(ParseError::ChecksumMismatch {
            expected,
            actual: plain[8],
        }
        .into());
    }

    let device_id = (u16::from(plain[1]) << 8) | u16::from(plain[2]);
    let group_id = plain[7];
    if group_id > protocol.describe().max_group {
        return Err(ParseError::InvalidGroup(group_id).into());
    }

    let arg = (u16::from(plain[4]) << 8) | u16::from(plain[5]);
    let value = match RgbCctCommand::try_from(plain[3])? {
        RgbCctCommand::On => FieldValue::Power(true),
        RgbCctCommand::Off => FieldValue::Power(false),
        RgbCctCommand::SetBrightness => FieldValue::Brightness((arg.min(100)) as u8),
        RgbCctCommand::SetHue => FieldValue::Hue(arg % 360),
        RgbCctCommand::SetSaturation => FieldValue::Saturation((arg.min(100)) as u8),
        RgbCctCommand::SetKelvin => FieldValue::Kelvin(arg),
    };

    Ok(DecodedPacket {
        bulb: BulbId::new(device_id, group_id, protocol),
        value,
        sequence: plain[6],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_stays_plaintext_after_whitening() {
        let bulb = BulbId::new(0x1122, 2, Protocol::RgbCct);
        let frame = encode(&bulb, &FieldValue::Power(true), 0).unwrap();
        assert_eq!(frame[0], TAG_RGB_CCT);
        // Body must not be plaintext
        assert_ne!(frame[1], 0x11);
    }

    #[test]
    fn fut089_shares_layout_with_different_tag() {
        let bulb = BulbId::new(0x1122, 7, Protocol::Fut089);
        let frame = encode(&bulb, &FieldValue::Saturation(80), 5).unwrap();
        assert_eq!(frame[0], TAG_FUT089);

        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.bulb.protocol, Protocol::Fut089);
        assert_eq!(decoded.bulb.group_id, 7);
        assert_eq!(decoded.value, FieldValue::Saturation(80));
    }

    #[test]
    fn hue_is_carried_losslessly() {
        let bulb = BulbId::new(0xABCD, 1, Protocol::RgbCct);
        let frame = encode(&bulb, &FieldValue::Hue(359), 9).unwrap();
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.value, FieldValue::Hue(359));
        assert_eq!(decoded.sequence, 9);
    }

    #[test]
    fn bit_flip_fails_checksum() {
        let bulb = BulbId::new(0xABCD, 1, Protocol::RgbCct);
        let mut frame = encode(&bulb, &FieldValue::Kelvin(3000), 0).unwrap();
        frame[4] ^= 0x01;
        assert!(matches!(
            decode(&frame),
            Err(ProtocolError::Parse(ParseError::ChecksumMismatch { .. }))
        ));
    }

    #[test]
    fn group_beyond_variant_range_is_rejected() {
        // Build a frame claiming group 7 on the 4-zone variant
        let bulb = BulbId::new(0x0001, 7, Protocol::Fut089);
        let mut frame = encode(&bulb, &FieldValue::Power(true), 0).unwrap();
        // Retag as the 4-zone variant and fix the checksum
        dewhiten(&mut frame);
        frame[0] = TAG_RGB_CCT;
        frame[8] = checksum(&frame[..8]);
        whiten(&mut frame);

        assert!(matches!(
            decode(&frame),
            Err(ProtocolError::Parse(ParseError::InvalidGroup(7)))
        ));
    }
}
