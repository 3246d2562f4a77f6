//! Gateway Core Engine
//!
//! This crate is the heart of the lighting gateway: it turns normalized
//! group commands into correctly framed radio packets, delivers them with
//! acceptable reliability over an ack-less medium, remembers the last known
//! state of every group it has ever addressed, and can animate a field
//! smoothly from its current value to a target.
//!
//! # Architecture
//!
//! One physical 2.4 GHz transceiver is shared by several incompatible frame
//! formats. The components, leaves first:
//!
//! - [`switchboard::RadioSwitchboard`] owns the transceiver and reconfigures
//!   it only on an actual variant change; reconfiguration latency surfaces
//!   as a retryable `RadioBusy`, never a blocking wait
//! - [`sender::PacketSender`] compensates for the missing link-layer ack by
//!   repeating every frame with configured spacing, one transmission per
//!   tick, FIFO between jobs
//! - [`store::GroupStateStore`] is the authoritative last-known-state cache:
//!   bounded, LRU-evicting, persisted with debounced writes
//! - [`transitions::TransitionController`] animates one field per
//!   `(group, field)` pair, routing each step through the same encode/send
//!   path as a direct command
//! - [`hub::Hub`] glues them into a single-threaded, tick-driven engine
//!   with a buffered event stream
//! - [`actor::run_hub_actor`] is the async front door: commands in, events
//!   out, the tick driven from a tokio interval
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//! use glow_hub::{Hub, HubConfig, MemoryBackend, SimulatedRadio};
//! use glow_protocol::{BulbId, FieldValue, Protocol};
//!
//! let radio = SimulatedRadio::new();
//! let config = HubConfig {
//!     // No settle window: the first transmit goes straight out
//!     reconfigure_settle_ms: 0,
//!     ..Default::default()
//! };
//! let mut hub = Hub::new(
//!     config,
//!     Box::new(radio.clone()),
//!     Box::new(MemoryBackend::new()),
//! );
//!
//! let bulb = BulbId::new(0x1234, 1, Protocol::RgbCct);
//! let now = Instant::now();
//! hub.apply_command(now, bulb, &[FieldValue::Power(true)], None).unwrap();
//! hub.tick(now);
//!
//! assert_eq!(hub.query_state(&bulb).power(), Some(true));
//! assert_eq!(radio.sent_frames().len(), 1);
//! ```

pub mod actor;
pub mod config;
pub mod error;
pub mod events;
pub mod hub;
pub mod persistence;
pub mod sender;
pub mod sim;
pub mod state;
pub mod store;
pub mod switchboard;
pub mod transitions;

// Re-export actor types
pub use actor::{run_hub_actor, HubCommand};

// Re-export engine types
pub use config::HubConfig;
pub use error::HubError;
pub use events::HubEvent;
pub use hub::Hub;
pub use persistence::{JsonFileBackend, MemoryBackend, PersistenceBackend};
pub use sender::{PacketSender, SendOutcome};
pub use sim::SimulatedRadio;
pub use state::{ColorMode, GroupState};
pub use store::GroupStateStore;
pub use switchboard::{RadioDriver, RadioSwitchboard};
pub use transitions::{TransitionController, TransitionStatus};
