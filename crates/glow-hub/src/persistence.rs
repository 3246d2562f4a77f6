//! Persistence backends for the group state store
//!
//! The store treats storage as a capability interface: `load`, `save`,
//! `remove`, all fallible, all synchronous. Two implementations ship: a
//! JSON-file backend for real deployments and an in-memory backend for
//! tests (which can also simulate write failures).

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use glow_protocol::BulbId;
use tracing::debug;

use crate::state::GroupState;

/// Storage capability consumed by the group state store
pub trait PersistenceBackend: Send {
    /// Load the stored state for a group, `None` if never saved
    fn load(&mut self, bulb: &BulbId) -> io::Result<Option<GroupState>>;

    /// Save the state for a group, overwriting any previous record
    fn save(&mut self, bulb: &BulbId, state: &GroupState) -> io::Result<()>;

    /// Remove the stored record for a group; absent records are not an error
    fn remove(&mut self, bulb: &BulbId) -> io::Result<()>;
}

/// One JSON document per group under a base directory
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create the backend, creating the base directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, bulb: &BulbId) -> PathBuf {
        // RGB+CCT contains a '+', so build the stem from the tag byte
        let stem = format!(
            "{:04x}-{}-{:02x}.json",
            bulb.device_id,
            bulb.group_id,
            bulb.protocol.describe().tag
        );
        self.dir.join(stem)
    }
}

impl PersistenceBackend for JsonFileBackend {
    fn load(&mut self, bulb: &BulbId) -> io::Result<Option<GroupState>> {
        let path = self.path_for(bulb);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let state = serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!("loaded state for {} from {}", bulb, path.display());
        Ok(Some(state))
    }

    fn save(&mut self, bulb: &BulbId, state: &GroupState) -> io::Result<()> {
        let path = self.path_for(bulb);
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, bytes)?;
        debug!("saved state for {} to {}", bulb, path.display());
        Ok(())
    }

    fn remove(&mut self, bulb: &BulbId) -> io::Result<()> {
        match std::fs::remove_file(self.path_for(bulb)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    records: HashMap<BulbId, GroupState>,
    save_count: usize,
    fail_writes: bool,
}

/// In-memory backend for tests
///
/// Clones share storage, so a test can keep a handle while the store owns
/// the backend. Write failures can be switched on to exercise the
/// degraded-durability path.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap().save_count
    }

    /// Stored record for a group, if any
    pub fn record(&self, bulb: &BulbId) -> Option<GroupState> {
        self.inner.lock().unwrap().records.get(bulb).cloned()
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// Make every subsequent save fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load(&mut self, bulb: &BulbId) -> io::Result<Option<GroupState>> {
        Ok(self.inner.lock().unwrap().records.get(bulb).cloned())
    }

    fn save(&mut self, bulb: &BulbId, state: &GroupState) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(io::Error::other("simulated write failure"));
        }
        inner.records.insert(*bulb, state.clone());
        inner.save_count += 1;
        Ok(())
    }

    fn remove(&mut self, bulb: &BulbId) -> io::Result<()> {
        self.inner.lock().unwrap().records.remove(bulb);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_protocol::{FieldValue, Protocol};

    #[test]
    fn json_backend_round_trips_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = JsonFileBackend::new(dir.path()).unwrap();

        let bulb = BulbId::new(0x1234, 2, Protocol::RgbCct);
        let mut state = GroupState::unknown();
        state.apply(&FieldValue::Power(true));
        state.apply(&FieldValue::Kelvin(3200));

        backend.save(&bulb, &state).unwrap();
        let loaded = backend.load(&bulb).unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn json_backend_distinguishes_groups() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = JsonFileBackend::new(dir.path()).unwrap();

        let a = BulbId::new(0x1234, 1, Protocol::Rgbw);
        let b = BulbId::new(0x1234, 1, Protocol::RgbCct);

        let mut state_a = GroupState::unknown();
        state_a.apply(&FieldValue::Power(true));
        backend.save(&a, &state_a).unwrap();

        // Same device and group, different variant: separate record
        assert!(backend.load(&b).unwrap().is_none());
    }

    #[test]
    fn json_backend_load_of_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = JsonFileBackend::new(dir.path()).unwrap();
        let bulb = BulbId::new(0x9999, 0, Protocol::Rgb);
        assert!(backend.load(&bulb).unwrap().is_none());
    }

    #[test]
    fn json_backend_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = JsonFileBackend::new(dir.path()).unwrap();
        let bulb = BulbId::new(0x9999, 0, Protocol::Rgb);

        backend.remove(&bulb).unwrap();
        backend.save(&bulb, &GroupState::unknown()).unwrap();
        backend.remove(&bulb).unwrap();
        backend.remove(&bulb).unwrap();
        assert!(backend.load(&bulb).unwrap().is_none());
    }

    #[test]
    fn memory_backend_simulates_write_failure() {
        let backend = MemoryBackend::new();
        let mut writer = backend.clone();
        let bulb = BulbId::new(1, 1, Protocol::Cct);

        backend.set_fail_writes(true);
        assert!(writer.save(&bulb, &GroupState::unknown()).is_err());
        assert_eq!(backend.save_count(), 0);

        backend.set_fail_writes(false);
        assert!(writer.save(&bulb, &GroupState::unknown()).is_ok());
        assert_eq!(backend.save_count(), 1);
    }
}
