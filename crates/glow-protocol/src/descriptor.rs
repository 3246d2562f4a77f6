//! Static protocol descriptor table
//!
//! One descriptor per variant, loaded once and never mutated: packet length,
//! the set of controllable fields, the group-id range, and field bounds that
//! differ between variants.

use crate::command::{Field, FieldValue};
use crate::error::ProtocolError;
use crate::Protocol;

/// Immutable description of one protocol variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    /// Variant this descriptor belongs to
    pub protocol: Protocol,
    /// On-air header byte identifying the variant
    pub tag: u8,
    /// Fixed frame length in bytes
    pub packet_len: usize,
    /// Fields the variant can control
    pub fields: &'static [Field],
    /// Highest valid group id (0 = zoneless, group must be 0)
    pub max_group: u8,
    /// Color temperature bounds in kelvin, if the variant supports it
    pub kelvin_range: Option<(u16, u16)>,
}

impl ProtocolDescriptor {
    /// Whether the variant can control the given field
    pub fn supports(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Validate a field value against this descriptor
    ///
    /// Checks that the field is controllable on the variant and that the
    /// payload is inside the field's declared bounds.
    pub fn check(&self, value: &FieldValue) -> Result<(), ProtocolError> {
        let field = value.field();
        if !self.supports(field) {
            return Err(ProtocolError::UnsupportedField {
                variant: self.protocol.name(),
                field,
            });
        }

        let out_of_range = |value: u32, min: u32, max: u32| ProtocolError::ValueOutOfRange {
            field,
            value,
            min,
            max,
        };

        match *value {
            FieldValue::Brightness(v) if v > 100 => Err(out_of_range(u32::from(v), 0, 100)),
            FieldValue::Hue(v) if v > 359 => Err(out_of_range(u32::from(v), 0, 359)),
            FieldValue::Saturation(v) if v > 100 => Err(out_of_range(u32::from(v), 0, 100)),
            FieldValue::Kelvin(v) => {
                // supports() above guarantees a range is present
                let (min, max) = self.kelvin_range.unwrap_or((0, u16::MAX));
                if v < min || v > max {
                    Err(out_of_range(u32::from(v), u32::from(min), u32::from(max)))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

const RGBW_FIELDS: &[Field] = &[Field::Power, Field::Brightness, Field::Hue];
const CCT_FIELDS: &[Field] = &[Field::Power, Field::Brightness, Field::Kelvin];
const RGB_FIELDS: &[Field] = &[Field::Power, Field::Brightness, Field::Rgb];
const RGB_CCT_FIELDS: &[Field] = &[
    Field::Power,
    Field::Brightness,
    Field::Hue,
    Field::Saturation,
    Field::Kelvin,
];

/// The registry: one entry per variant, indexed by [`Protocol::describe`]
pub(crate) static DESCRIPTORS: &[ProtocolDescriptor] = &[
    ProtocolDescriptor {
        protocol: Protocol::Rgbw,
        tag: crate::rgbw::TAG,
        packet_len: crate::rgbw::FRAME_LEN,
        fields: RGBW_FIELDS,
        max_group: 4,
        kelvin_range: None,
    },
    ProtocolDescriptor {
        protocol: Protocol::Cct,
        tag: crate::cct::TAG,
        packet_len: crate::cct::FRAME_LEN,
        fields: CCT_FIELDS,
        max_group: 4,
        kelvin_range: Some((2700, 6500)),
    },
    ProtocolDescriptor {
        protocol: Protocol::Rgb,
        tag: crate::rgb::TAG,
        packet_len: crate::rgb::FRAME_LEN,
        fields: RGB_FIELDS,
        max_group: 0,
        kelvin_range: None,
    },
    ProtocolDescriptor {
        protocol: Protocol::RgbCct,
        tag: crate::rgb_cct::TAG_RGB_CCT,
        packet_len: crate::rgb_cct::FRAME_LEN,
        fields: RGB_CCT_FIELDS,
        max_group: 4,
        kelvin_range: Some((2000, 6500)),
    },
    ProtocolDescriptor {
        protocol: Protocol::Fut089,
        tag: crate::rgb_cct::TAG_FUT089,
        packet_len: crate::rgb_cct::FRAME_LEN,
        fields: RGB_CCT_FIELDS,
        max_group: 8,
        kelvin_range: Some((2000, 6500)),
    },
];
