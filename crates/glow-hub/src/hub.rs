//! The gateway engine
//!
//! Glues the registry, switchboard, sender, store, and transition controller
//! into one tick-driven core. A command either fully succeeds or has no
//! effect: identity and field validation, then queue capacity, all happen
//! before any state is touched. The tick advances every component exactly
//! once, in a fixed order, with no blocking anywhere; work that cannot
//! proceed yet is simply re-checked next tick.

use std::time::{Duration, Instant};

use glow_protocol::{BulbId, FieldValue, Protocol};
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::error::HubError;
use crate::events::HubEvent;
use crate::persistence::PersistenceBackend;
use crate::sender::PacketSender;
use crate::store::{GroupStateStore, PersistFailure};
use crate::switchboard::{RadioDriver, RadioSwitchboard};
use crate::transitions::{TransitionController, TransitionStatus, TransitionStep};
use crate::GroupState;

/// The gateway core
pub struct Hub {
    config: HubConfig,
    switchboard: RadioSwitchboard,
    sender: PacketSender,
    store: GroupStateStore,
    transitions: TransitionController,
    events: Vec<HubEvent>,
    sequence: u8,
    /// Last captured (bulb, sequence); repeats of one remote press carry
    /// the same sequence byte and collapse to a single observation
    last_capture: Option<(BulbId, u8)>,
}

impl Hub {
    /// Build a hub over a radio driver and a persistence backend
    pub fn new(
        config: HubConfig,
        driver: Box<dyn RadioDriver>,
        backend: Box<dyn PersistenceBackend>,
    ) -> Self {
        let switchboard = RadioSwitchboard::new(driver, config.reconfigure_settle());
        let sender = PacketSender::new(config.send_queue_capacity);
        let store = GroupStateStore::new(
            config.state_cache_capacity,
            config.persistence_debounce(),
            backend,
        );
        let transitions = TransitionController::new(config.transition_step());
        info!(
            "hub ready: {} repeats per command, {}ms spacing",
            config.packet_repeats, config.repeat_interval_ms
        );
        Self {
            config,
            switchboard,
            sender,
            store,
            transitions,
            events: Vec::new(),
            sequence: 0,
            last_capture: None,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Apply a command to a group: direct, or animated over a duration
    ///
    /// Validation (identity, field support, value bounds) and the queue
    /// capacity check all precede any mutation, so a rejected command
    /// leaves no trace. A direct command for a `(bulb, field)` pair cancels
    /// any active transition for that pair before its packet is enqueued.
    pub fn apply_command(
        &mut self,
        now: Instant,
        bulb: BulbId,
        values: &[FieldValue],
        duration: Option<Duration>,
    ) -> Result<(), HubError> {
        bulb.validate()?;
        let descriptor = bulb.protocol.describe();
        for value in values {
            descriptor.check(value)?;
        }

        match duration {
            Some(duration) => self.start_transitions(now, bulb, values, duration),
            None => self.apply_direct(now, bulb, values),
        }
    }

    /// Direct path: cancel superseded transitions, update state, enqueue
    fn apply_direct(
        &mut self,
        now: Instant,
        bulb: BulbId,
        values: &[FieldValue],
    ) -> Result<(), HubError> {
        if self.sender.remaining_capacity() < values.len() {
            return Err(HubError::QueueFull {
                capacity: self.config.send_queue_capacity,
            });
        }

        // Encode everything first; a late failure here must not leave a
        // half-applied command
        let mut frames = Vec::with_capacity(values.len());
        for value in values {
            let sequence = self.next_sequence();
            frames.push(glow_protocol::encode(&bulb, value, sequence)?);
        }

        for value in values {
            self.transitions.cancel(&bulb, value.field());
        }

        let failures = self.store.update(now, &bulb, values);
        self.report_persistence(failures);
        self.events.push(HubEvent::StateUpdated { bulb });

        for frame in frames {
            // Capacity was pre-checked; this cannot fail
            self.sender.enqueue(
                now,
                bulb,
                bulb.protocol,
                frame,
                self.config.packet_repeats,
                self.config.repeat_interval(),
            )?;
        }
        Ok(())
    }

    /// Timed path: register transitions, falling back to a direct set for
    /// fields whose current value was never observed
    fn start_transitions(
        &mut self,
        now: Instant,
        bulb: BulbId,
        values: &[FieldValue],
        duration: Duration,
    ) -> Result<(), HubError> {
        // Animating a non-scalar field is rejected before anything starts
        let mut ends = Vec::with_capacity(values.len());
        for value in values {
            match value.as_scalar() {
                Some(end) => ends.push(end),
                None => {
                    return Err(glow_protocol::ProtocolError::UnsupportedField {
                        variant: bulb.protocol.name(),
                        field: value.field(),
                    }
                    .into())
                }
            }
        }

        let current = self.store.get(&bulb);
        let mut immediate = Vec::new();
        for (value, end) in values.iter().zip(ends) {
            let field = value.field();
            match current.value_of(field).and_then(|v| v.as_scalar()) {
                Some(start) => {
                    debug!(
                        "transition {:?} for {}: {} -> {} over {:?}",
                        field, bulb, start, end, duration
                    );
                    self.transitions.start(now, bulb, field, start, end, duration);
                }
                // Nothing to interpolate from; jump straight to the end
                None => immediate.push(*value),
            }
        }

        if immediate.is_empty() {
            Ok(())
        } else {
            self.apply_direct(now, bulb, &immediate)
        }
    }

    /// One cooperative control-loop iteration
    ///
    /// Order: transition steps, then one packet transmission, then
    /// listen-mode intake, then the debounced persistence flush. Everything
    /// deferred (settle windows, repeat spacing, step timing, quiet
    /// periods) is re-checked here rather than waited on.
    pub fn tick(&mut self, now: Instant) {
        for step in self.transitions.tick(now) {
            self.apply_step(now, &step);
        }

        if let Some(done) = self.sender.tick(now, &mut self.switchboard) {
            self.events.push(HubEvent::PacketSent {
                bulb: done.bulb,
                protocol: done.protocol,
                frame: done.frame,
                outcome: done.outcome,
            });
        }

        if let Some(frame) = self.switchboard.poll_frame(now) {
            self.handle_captured(now, &frame);
        }

        let failures = self.store.tick(now);
        self.report_persistence(failures);
    }

    /// Route one transition step through the normal command path
    fn apply_step(&mut self, now: Instant, step: &TransitionStep) {
        let sequence = self.next_sequence();
        let frame = match glow_protocol::encode(&step.bulb, &step.value, sequence) {
            Ok(frame) => frame,
            Err(e) => {
                // End values were validated at start time, so this is a bug
                // worth hearing about, not a reason to stop the loop
                warn!("transition step encode failed for {}: {}", step.bulb, e);
                return;
            }
        };

        match self.sender.enqueue(
            now,
            step.bulb,
            step.bulb.protocol,
            frame,
            self.config.packet_repeats,
            self.config.repeat_interval(),
        ) {
            Ok(()) => {
                let failures = self.store.update(now, &step.bulb, &[step.value]);
                self.report_persistence(failures);
                self.events.push(HubEvent::StateUpdated { bulb: step.bulb });
                if step.finished {
                    self.events.push(HubEvent::TransitionCompleted {
                        bulb: step.bulb,
                        field: step.value.field(),
                    });
                }
            }
            Err(e) => {
                // Skip this step entirely; the transition emits again next
                // interval and the state store never gets ahead of the air
                warn!("transition step dropped for {}: {}", step.bulb, e);
            }
        }
    }

    /// Decode and absorb a frame captured in listen mode
    fn handle_captured(&mut self, now: Instant, frame: &[u8]) {
        let packet = match glow_protocol::decode(frame) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("ignoring undecodable frame: {}", e);
                return;
            }
        };

        // Remotes repeat each press; the sequence byte collapses the burst
        if self.last_capture == Some((packet.bulb, packet.sequence)) {
            return;
        }
        self.last_capture = Some((packet.bulb, packet.sequence));

        debug!("captured {:?} for {}", packet.value, packet.bulb);
        let failures = self.store.update(now, &packet.bulb, &[packet.value]);
        self.report_persistence(failures);
        self.events.push(HubEvent::PacketReceived { packet });
        self.events.push(HubEvent::StateUpdated { bulb: packet.bulb });
    }

    /// Last known state of a group (all-unknown if never observed)
    pub fn query_state(&mut self, bulb: &BulbId) -> GroupState {
        self.store.get(bulb)
    }

    /// Remove a group: cancel its transitions, abort its queued sends,
    /// drop its cached and persisted state
    pub fn delete_group(&mut self, bulb: &BulbId) -> bool {
        let cancelled = self.transitions.cancel_all_for(bulb);
        if cancelled > 0 {
            debug!("cancelled {} transitions for deleted {}", cancelled, bulb);
        }
        for aborted in self.sender.abort_for(bulb) {
            self.events.push(HubEvent::PacketSent {
                bulb: aborted.bulb,
                protocol: aborted.protocol,
                frame: aborted.frame,
                outcome: aborted.outcome,
            });
        }
        let existed = self.store.delete(bulb);
        self.events.push(HubEvent::GroupDeleted { bulb: *bulb });
        existed
    }

    /// Progress of all active transitions
    pub fn list_transitions(&self, now: Instant) -> Vec<TransitionStatus> {
        self.transitions.list(now)
    }

    /// Cancel one transition without emitting further packets
    pub fn cancel_transition(&mut self, bulb: &BulbId, field: glow_protocol::Field) -> bool {
        self.transitions.cancel(bulb, field)
    }

    /// Put the radio into receive mode for a variant
    pub fn start_listen(&mut self, now: Instant, protocol: Protocol) -> Result<(), HubError> {
        self.switchboard.listen(now, protocol)
    }

    /// Leave receive mode
    pub fn stop_listen(&mut self) {
        self.switchboard.stop_listen();
    }

    /// Whether the radio is in receive mode, and for which variant
    pub fn listening(&self) -> Option<Protocol> {
        self.switchboard.listening()
    }

    /// Queue a raw, already-encoded frame for a variant
    ///
    /// Escape hatch for callers that build their own frames; the job is
    /// attributed to the variant's all-zeros group in events.
    pub fn send_raw(
        &mut self,
        now: Instant,
        protocol: Protocol,
        frame: Vec<u8>,
        repeats: Option<u32>,
    ) -> Result<(), HubError> {
        self.sender.enqueue(
            now,
            BulbId::new(0, 0, protocol),
            protocol,
            frame,
            repeats.unwrap_or(self.config.packet_repeats),
            self.config.repeat_interval(),
        )
    }

    /// Flush all dirty state to storage immediately (e.g. on shutdown)
    pub fn flush(&mut self) {
        let failures = self.store.flush_all();
        self.report_persistence(failures);
    }

    /// Drain pending events
    pub fn drain_events(&mut self) -> Vec<HubEvent> {
        std::mem::take(&mut self.events)
    }

    fn next_sequence(&mut self) -> u8 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    fn report_persistence(&mut self, failures: Vec<PersistFailure>) {
        for failure in failures {
            self.events.push(HubEvent::PersistenceFailed {
                bulb: failure.bulb,
                message: failure.message,
            });
        }
    }
}
