//! Logical light-group identity

use std::fmt;

use crate::error::ProtocolError;
use crate::Protocol;

/// Identity of one logical light group
///
/// A group is addressed by the 16-bit device id burned into the paired
/// remote, the group (zone) number on that remote, and the protocol variant
/// the remote speaks. Group 0 is the all-zones broadcast on variants that
/// have zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BulbId {
    /// Device id of the paired remote
    pub device_id: u16,
    /// Zone number on the remote (0 = all zones)
    pub group_id: u8,
    /// Protocol variant the remote speaks
    pub protocol: Protocol,
}

impl BulbId {
    /// Create a new bulb id without validating the group range
    pub fn new(device_id: u16, group_id: u8, protocol: Protocol) -> Self {
        Self {
            device_id,
            group_id,
            protocol,
        }
    }

    /// Check the group id against the variant's descriptor
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let descriptor = self.protocol.describe();
        if self.group_id > descriptor.max_group {
            return Err(ProtocolError::InvalidBulbId(format!(
                "group {} out of range for {} (max {})",
                self.group_id,
                self.protocol.name(),
                descriptor.max_group
            )));
        }
        Ok(())
    }
}

impl fmt::Display for BulbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:04X}/{}/{}",
            self.device_id,
            self.group_id,
            self.protocol.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_by_device_then_group_then_protocol() {
        let a = BulbId::new(0x1000, 1, Protocol::Rgbw);
        let b = BulbId::new(0x1000, 2, Protocol::Rgbw);
        let c = BulbId::new(0x2000, 0, Protocol::Rgbw);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn group_out_of_range_is_rejected() {
        let id = BulbId::new(0x1000, 5, Protocol::Rgbw);
        assert!(matches!(
            id.validate(),
            Err(ProtocolError::InvalidBulbId(_))
        ));

        // Fut089 remotes have 8 zones
        let id = BulbId::new(0x1000, 8, Protocol::Fut089);
        assert!(id.validate().is_ok());
    }

    #[test]
    fn zoneless_variant_only_accepts_group_zero() {
        assert!(BulbId::new(0xBEEF, 0, Protocol::Rgb).validate().is_ok());
        assert!(BulbId::new(0xBEEF, 1, Protocol::Rgb).validate().is_err());
    }
}
