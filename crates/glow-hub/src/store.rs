//! Group state store: the authoritative last-known-state cache
//!
//! The store owns every [`GroupState`] instance. Capacity is bounded; under
//! pressure the least-recently-updated entry is evicted, since state for a
//! previously-addressed group is reconstructable from the next observed
//! command. Writes to the persistence backend are debounced: rapid command
//! bursts (a transition in flight, a dimmer being dragged) coalesce into one
//! write after a quiet period, bounding flash wear.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use glow_protocol::{BulbId, FieldValue};
use tracing::{debug, warn};

use crate::persistence::PersistenceBackend;
use crate::state::GroupState;

/// A persistence failure, reported but never propagated as a command error
#[derive(Debug, Clone)]
pub struct PersistFailure {
    /// Group whose state could not be written
    pub bulb: BulbId,
    /// Backend error text
    pub message: String,
}

struct Entry {
    state: GroupState,
    /// Monotonic update stamp; smallest = least recently updated
    touched: u64,
    dirty: bool,
}

/// Bounded LRU cache of group state with debounced persistence
pub struct GroupStateStore {
    entries: HashMap<BulbId, Entry>,
    capacity: usize,
    backend: Box<dyn PersistenceBackend>,
    debounce: Duration,
    flush_at: Option<Instant>,
    clock: u64,
}

impl GroupStateStore {
    /// Create a store over the given backend
    ///
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize, debounce: Duration, backend: Box<dyn PersistenceBackend>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            backend,
            debounce,
            flush_at: None,
            clock: 0,
        }
    }

    /// Number of cached groups
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a group is currently cached (does not consult the backend)
    pub fn contains(&self, bulb: &BulbId) -> bool {
        self.entries.contains_key(bulb)
    }

    /// Last known state of a group; all-unknown if never observed
    ///
    /// Never fails: a group absent from both cache and backend yields a
    /// state with every field unknown.
    pub fn get(&mut self, bulb: &BulbId) -> GroupState {
        if let Some(entry) = self.entries.get(bulb) {
            return entry.state.clone();
        }
        match self.hydrate(bulb) {
            Some(state) => state,
            None => GroupState::unknown(),
        }
    }

    /// Merge field values into a group's state and schedule a flush
    ///
    /// Returns failures from any synchronous eviction write; the in-memory
    /// update itself cannot fail.
    pub fn update(
        &mut self,
        now: Instant,
        bulb: &BulbId,
        values: &[FieldValue],
    ) -> Vec<PersistFailure> {
        let mut failures = Vec::new();

        if !self.entries.contains_key(bulb) {
            // Pull any stored record first so a partial update merges into
            // the persisted state rather than shadowing it
            self.hydrate(bulb);
            failures.extend(self.make_room(bulb));
        }

        self.clock += 1;
        let clock = self.clock;
        let entry = self.entries.entry(*bulb).or_insert_with(|| Entry {
            state: GroupState::unknown(),
            touched: 0,
            dirty: false,
        });
        for value in values {
            entry.state.apply(value);
        }
        entry.touched = clock;
        entry.dirty = true;
        self.flush_at = Some(now + self.debounce);

        failures
    }

    /// Remove a group from cache and backend
    pub fn delete(&mut self, bulb: &BulbId) -> bool {
        let existed = self.entries.remove(bulb).is_some();
        if let Err(e) = self.backend.remove(bulb) {
            warn!("failed to remove stored state for {}: {}", bulb, e);
        }
        existed
    }

    /// Advance the debounce timer, flushing dirty entries when it expires
    pub fn tick(&mut self, now: Instant) -> Vec<PersistFailure> {
        match self.flush_at {
            Some(at) if now >= at => {
                self.flush_at = None;
                self.flush_dirty()
            }
            _ => Vec::new(),
        }
    }

    /// Flush all dirty entries immediately, ignoring the quiet period
    pub fn flush_all(&mut self) -> Vec<PersistFailure> {
        self.flush_at = None;
        self.flush_dirty()
    }

    fn flush_dirty(&mut self) -> Vec<PersistFailure> {
        let mut failures = Vec::new();
        for (bulb, entry) in &mut self.entries {
            if !entry.dirty {
                continue;
            }
            match self.backend.save(bulb, &entry.state) {
                Ok(()) => entry.dirty = false,
                Err(e) => {
                    // Leave the entry dirty so the next flush retries;
                    // the cache stays authoritative for this session
                    warn!("state write failed for {}: {}", bulb, e);
                    failures.push(PersistFailure {
                        bulb: *bulb,
                        message: e.to_string(),
                    });
                }
            }
        }
        failures
    }

    /// Load a group from the backend into the cache, if a record exists
    fn hydrate(&mut self, bulb: &BulbId) -> Option<GroupState> {
        let state = match self.backend.load(bulb) {
            Ok(Some(state)) => state,
            Ok(None) => return None,
            Err(e) => {
                warn!("state load failed for {}: {}", bulb, e);
                return None;
            }
        };

        let failures = self.make_room(bulb);
        for failure in failures {
            warn!(
                "eviction write failed for {}: {}",
                failure.bulb, failure.message
            );
        }
        self.clock += 1;
        self.entries.insert(
            *bulb,
            Entry {
                state: state.clone(),
                touched: self.clock,
                dirty: false,
            },
        );
        Some(state)
    }

    /// Evict the least-recently-updated entry if inserting would overflow
    fn make_room(&mut self, incoming: &BulbId) -> Vec<PersistFailure> {
        let mut failures = Vec::new();
        if self.entries.len() < self.capacity || self.entries.contains_key(incoming) {
            return failures;
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.touched)
            .map(|(bulb, _)| *bulb);

        if let Some(bulb) = victim {
            if let Some(entry) = self.entries.remove(&bulb) {
                debug!("evicting least-recently-updated group {}", bulb);
                if entry.dirty {
                    // The cache copy is about to disappear; this write
                    // cannot wait for the quiet period
                    if let Err(e) = self.backend.save(&bulb, &entry.state) {
                        warn!("eviction write failed for {}: {}", bulb, e);
                        failures.push(PersistFailure {
                            bulb,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
        failures
    }
}
