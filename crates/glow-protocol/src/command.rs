//! Normalized field model shared by all protocol variants
//!
//! Client commands and decoded frames both reduce to a [`FieldValue`]: one
//! controllable field of a light group together with its typed payload. The
//! per-variant codec modules translate between these and wire frames.

/// A controllable field of a light group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    /// On/off state
    Power,
    /// Brightness, 0-100
    Brightness,
    /// Hue, 0-359 (circular)
    Hue,
    /// Saturation, 0-100
    Saturation,
    /// Color temperature in kelvin, bounds are variant specific
    Kelvin,
    /// Raw RGB triple, for variants without a hue/saturation model
    Rgb,
}

impl Field {
    /// Whether the field is a scalar that can be animated by a transition
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Field::Brightness | Field::Hue | Field::Saturation | Field::Kelvin
        )
    }
}

/// A field together with its typed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// Turn the group on or off
    Power(bool),
    /// Brightness, 0-100
    Brightness(u8),
    /// Hue, 0-359
    Hue(u16),
    /// Saturation, 0-100
    Saturation(u8),
    /// Color temperature in kelvin
    Kelvin(u16),
    /// Raw RGB triple
    Rgb(u8, u8, u8),
}

impl FieldValue {
    /// The field this value belongs to
    pub fn field(&self) -> Field {
        match self {
            FieldValue::Power(_) => Field::Power,
            FieldValue::Brightness(_) => Field::Brightness,
            FieldValue::Hue(_) => Field::Hue,
            FieldValue::Saturation(_) => Field::Saturation,
            FieldValue::Kelvin(_) => Field::Kelvin,
            FieldValue::Rgb(..) => Field::Rgb,
        }
    }

    /// Scalar payload for the animator; `None` for Power and Rgb
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            FieldValue::Brightness(v) => Some(f32::from(*v)),
            FieldValue::Hue(v) => Some(f32::from(*v)),
            FieldValue::Saturation(v) => Some(f32::from(*v)),
            FieldValue::Kelvin(v) => Some(f32::from(*v)),
            FieldValue::Power(_) | FieldValue::Rgb(..) => None,
        }
    }

    /// Rebuild a scalar field value from an interpolated float
    ///
    /// Rounds to the nearest integer and clamps to the field's global
    /// bounds. Returns `None` for non-scalar fields.
    pub fn from_scalar(field: Field, value: f32) -> Option<FieldValue> {
        let rounded = value.round();
        match field {
            Field::Brightness => Some(FieldValue::Brightness(rounded.clamp(0.0, 100.0) as u8)),
            Field::Hue => {
                let hue = rounded.rem_euclid(360.0) as u16;
                Some(FieldValue::Hue(hue % 360))
            }
            Field::Saturation => Some(FieldValue::Saturation(rounded.clamp(0.0, 100.0) as u8)),
            Field::Kelvin => Some(FieldValue::Kelvin(rounded.max(0.0) as u16)),
            Field::Power | Field::Rgb => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_fields_round_trip() {
        assert_eq!(FieldValue::Brightness(42).as_scalar(), Some(42.0));
        assert_eq!(
            FieldValue::from_scalar(Field::Brightness, 42.4),
            Some(FieldValue::Brightness(42))
        );
        assert_eq!(FieldValue::Power(true).as_scalar(), None);
    }

    #[test]
    fn hue_from_scalar_wraps() {
        assert_eq!(
            FieldValue::from_scalar(Field::Hue, 365.0),
            Some(FieldValue::Hue(5))
        );
        assert_eq!(
            FieldValue::from_scalar(Field::Hue, -10.0),
            Some(FieldValue::Hue(350))
        );
        // 359.7 rounds to 360, which is the same point as 0
        assert_eq!(
            FieldValue::from_scalar(Field::Hue, 359.7),
            Some(FieldValue::Hue(0))
        );
    }

    #[test]
    fn non_scalar_fields_have_no_interpolation() {
        assert_eq!(FieldValue::from_scalar(Field::Power, 1.0), None);
        assert_eq!(FieldValue::from_scalar(Field::Rgb, 1.0), None);
    }
}
