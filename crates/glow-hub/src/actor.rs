//! Gateway actor
//!
//! The hub itself is synchronous and tick-driven; this module is its async
//! front door. The actor owns the [`Hub`], drives its tick from a tokio
//! interval, services commands from an mpsc channel, and forwards every hub
//! event to an event channel. All waiting happens here, in `select!`; the
//! core never blocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use glow_hub::actor::{run_hub_actor, HubCommand};
//! use tokio::sync::mpsc;
//!
//! let (cmd_tx, cmd_rx) = mpsc::channel(64);
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//!
//! tokio::spawn(run_hub_actor(hub, cmd_rx, event_tx));
//!
//! // Send commands, receive events
//! ```

use std::time::{Duration, Instant};

use glow_protocol::{BulbId, Field, FieldValue, Protocol};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::HubError;
use crate::events::HubEvent;
use crate::hub::Hub;
use crate::state::GroupState;
use crate::transitions::TransitionStatus;

/// Commands sent to the gateway actor
#[derive(Debug)]
pub enum HubCommand {
    /// Apply a command to a group (direct, or animated if `duration_ms`)
    Apply {
        /// Target group
        bulb: BulbId,
        /// Field values to apply
        values: Vec<FieldValue>,
        /// Animate over this many milliseconds instead of setting directly
        duration_ms: Option<u64>,
        /// Channel for the synchronous accept/reject result
        response: oneshot::Sender<Result<(), HubError>>,
    },

    /// Read a group's last known state
    QueryState {
        /// Group to query
        bulb: BulbId,
        /// Channel for the state snapshot
        response: oneshot::Sender<GroupState>,
    },

    /// List all active transitions with their progress
    ListTransitions {
        /// Channel for the status list
        response: oneshot::Sender<Vec<TransitionStatus>>,
    },

    /// Cancel one transition
    CancelTransition {
        /// Target group
        bulb: BulbId,
        /// Animated field
        field: Field,
        /// Whether a transition was actually cancelled
        response: oneshot::Sender<bool>,
    },

    /// Delete a group: state, pending sends, transitions
    DeleteGroup {
        /// Group to delete
        bulb: BulbId,
        /// Whether the group had cached state
        response: oneshot::Sender<bool>,
    },

    /// Put the radio into receive mode for a variant
    StartListen {
        /// Variant to capture
        protocol: Protocol,
    },

    /// Leave receive mode
    StopListen,

    /// Queue a raw, already-encoded frame
    SendRaw {
        /// Variant to transmit as
        protocol: Protocol,
        /// The frame bytes
        frame: Vec<u8>,
        /// Repeat count override
        repeats: Option<u32>,
        /// Channel for the accept/reject result
        response: oneshot::Sender<Result<(), HubError>>,
    },

    /// Flush state and stop the actor
    Shutdown,
}

/// Run the gateway actor until `Shutdown` or until all senders are dropped
pub async fn run_hub_actor(
    mut hub: Hub,
    mut cmd_rx: mpsc::Receiver<HubCommand>,
    event_tx: mpsc::Sender<HubEvent>,
) {
    info!("gateway actor started");

    let mut ticker = interval(Duration::from_millis(hub.config().tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                if handle_command(&mut hub, cmd) == Flow::Stop {
                    break;
                }
            }
            _ = ticker.tick() => {
                hub.tick(Instant::now());
            }
        }

        for event in hub.drain_events() {
            if event_tx.send(event).await.is_err() {
                debug!("event receiver dropped");
                break;
            }
        }
    }

    // Whatever is dirty goes to storage before the actor dies
    hub.flush();
    info!("gateway actor stopped");
}

#[derive(PartialEq)]
enum Flow {
    Continue,
    Stop,
}

fn handle_command(hub: &mut Hub, cmd: HubCommand) -> Flow {
    let now = Instant::now();
    match cmd {
        HubCommand::Apply {
            bulb,
            values,
            duration_ms,
            response,
        } => {
            let duration = duration_ms.map(Duration::from_millis);
            let _ = response.send(hub.apply_command(now, bulb, &values, duration));
        }

        HubCommand::QueryState { bulb, response } => {
            let _ = response.send(hub.query_state(&bulb));
        }

        HubCommand::ListTransitions { response } => {
            let _ = response.send(hub.list_transitions(now));
        }

        HubCommand::CancelTransition {
            bulb,
            field,
            response,
        } => {
            let _ = response.send(hub.cancel_transition(&bulb, field));
        }

        HubCommand::DeleteGroup { bulb, response } => {
            let _ = response.send(hub.delete_group(&bulb));
        }

        HubCommand::StartListen { protocol } => {
            if let Err(e) = hub.start_listen(now, protocol) {
                debug!("listen for {} deferred: {}", protocol.name(), e);
            }
        }

        HubCommand::StopListen => hub.stop_listen(),

        HubCommand::SendRaw {
            protocol,
            frame,
            repeats,
            response,
        } => {
            let _ = response.send(hub.send_raw(now, protocol, frame, repeats));
        }

        HubCommand::Shutdown => return Flow::Stop,
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::persistence::MemoryBackend;
    use crate::sim::SimulatedRadio;

    fn spawn_actor() -> (
        mpsc::Sender<HubCommand>,
        mpsc::Receiver<HubEvent>,
        SimulatedRadio,
        MemoryBackend,
    ) {
        let radio = SimulatedRadio::new();
        let backend = MemoryBackend::new();
        let config = HubConfig {
            tick_interval_ms: 1,
            packet_repeats: 2,
            repeat_interval_ms: 1,
            reconfigure_settle_ms: 0,
            ..Default::default()
        };
        let hub = Hub::new(config, Box::new(radio.clone()), Box::new(backend.clone()));

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(256);
        tokio::spawn(run_hub_actor(hub, cmd_rx, event_tx));
        (cmd_tx, event_rx, radio, backend)
    }

    #[tokio::test]
    async fn apply_then_query_round_trips_through_the_actor() {
        let (cmd_tx, _event_rx, _, _) = spawn_actor();
        let bulb = BulbId::new(0x1000, 1, Protocol::RgbCct);

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(HubCommand::Apply {
                bulb,
                values: vec![FieldValue::Power(true), FieldValue::Brightness(40)],
                duration_ms: None,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap().unwrap();

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(HubCommand::QueryState { bulb, response: tx })
            .await
            .unwrap();
        let state = rx.await.unwrap();
        assert_eq!(state.power(), Some(true));
        assert_eq!(state.brightness(), Some(40));
    }

    #[tokio::test]
    async fn events_flow_out_as_repeats_complete() {
        let (cmd_tx, mut event_rx, radio, _) = spawn_actor();
        let bulb = BulbId::new(0x2000, 2, Protocol::Rgbw);

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(HubCommand::Apply {
                bulb,
                values: vec![FieldValue::Power(true)],
                duration_ms: None,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap().unwrap();

        // Wait for the terminal PacketSent event
        loop {
            match tokio::time::timeout(Duration::from_secs(2), event_rx.recv()).await {
                Ok(Some(HubEvent::PacketSent { outcome, .. })) => {
                    assert_eq!(outcome, crate::sender::SendOutcome::Completed);
                    break;
                }
                Ok(Some(_)) => continue,
                other => panic!("expected PacketSent, got {:?}", other),
            }
        }
        assert_eq!(radio.sent_frames().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_flushes_dirty_state() {
        let (cmd_tx, mut event_rx, _, backend) = spawn_actor();
        let bulb = BulbId::new(0x3000, 1, Protocol::Cct);

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(HubCommand::Apply {
                bulb,
                values: vec![FieldValue::Kelvin(4000)],
                duration_ms: None,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap().unwrap();
        assert_eq!(backend.save_count(), 0, "debounce still open");

        cmd_tx.send(HubCommand::Shutdown).await.unwrap();
        // The event channel closing tells us the actor is gone
        while event_rx.recv().await.is_some() {}

        assert_eq!(backend.save_count(), 1);
        assert_eq!(backend.record(&bulb).unwrap().kelvin(), Some(4000));
    }
}
