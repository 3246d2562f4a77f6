//! Unified event stream for the gateway core
//!
//! Everything the front end needs to observe (send completions, captured
//! frames, state changes, group lifecycle, degraded persistence) is emitted
//! through one event enum. Events are buffered by the hub and fired
//! synchronously within the tick that caused them, never deferred to an
//! unrelated later tick.

use glow_protocol::{BulbId, DecodedPacket, Field, Protocol};

use crate::sender::SendOutcome;

/// Unified event enum for all gateway activity
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// A send job finished: all repeats transmitted, or aborted early
    PacketSent {
        /// Group the command addressed
        bulb: BulbId,
        /// Variant the frame was encoded for
        protocol: Protocol,
        /// The transmitted frame
        frame: Vec<u8>,
        /// How the job ended
        outcome: SendOutcome,
    },

    /// A frame was captured in listen mode and decoded
    PacketReceived {
        /// The decoded frame
        packet: DecodedPacket,
    },

    /// A group's cached state changed
    StateUpdated {
        /// Group whose state changed
        bulb: BulbId,
    },

    /// A group was deleted from the state store
    GroupDeleted {
        /// The deleted group
        bulb: BulbId,
    },

    /// A transition reached its end value
    TransitionCompleted {
        /// Group that was animated
        bulb: BulbId,
        /// Field that was animated
        field: Field,
    },

    /// A persistence write failed; the in-memory cache stays authoritative
    PersistenceFailed {
        /// Group whose state could not be written
        bulb: BulbId,
        /// Backend error text
        message: String,
    },
}

impl HubEvent {
    /// Check if this is a traffic event (something crossed the air)
    pub fn is_traffic(&self) -> bool {
        matches!(
            self,
            HubEvent::PacketSent { .. } | HubEvent::PacketReceived { .. }
        )
    }

    /// The group this event is about
    pub fn bulb(&self) -> BulbId {
        match self {
            HubEvent::PacketSent { bulb, .. }
            | HubEvent::StateUpdated { bulb }
            | HubEvent::GroupDeleted { bulb }
            | HubEvent::TransitionCompleted { bulb, .. }
            | HubEvent::PersistenceFailed { bulb, .. } => *bulb,
            HubEvent::PacketReceived { packet } => packet.bulb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_protocol::FieldValue;

    #[test]
    fn traffic_event_classification() {
        let sent = HubEvent::PacketSent {
            bulb: BulbId::new(1, 1, Protocol::Rgbw),
            protocol: Protocol::Rgbw,
            frame: vec![0x01],
            outcome: SendOutcome::Completed,
        };
        assert!(sent.is_traffic());

        let updated = HubEvent::StateUpdated {
            bulb: BulbId::new(1, 1, Protocol::Rgbw),
        };
        assert!(!updated.is_traffic());
    }

    #[test]
    fn bulb_extraction_covers_received_packets() {
        let bulb = BulbId::new(0x42, 2, Protocol::Cct);
        let event = HubEvent::PacketReceived {
            packet: DecodedPacket {
                bulb,
                value: FieldValue::Power(true),
                sequence: 3,
            },
        };
        assert_eq!(event.bulb(), bulb);
    }
}
