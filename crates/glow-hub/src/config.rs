//! Gateway configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for the gateway core
///
/// Repeat count and spacing are deliberately configuration rather than
/// constants: the protocols carry no acknowledgment, so redundancy is the
/// only reliability lever and the right amount depends on the site's RF
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Control loop tick interval (ms)
    pub tick_interval_ms: u64,
    /// Physical transmissions per logical command
    pub packet_repeats: u32,
    /// Spacing between repeats of one command (ms)
    pub repeat_interval_ms: u64,
    /// Send queue capacity (jobs, not repeats)
    pub send_queue_capacity: usize,
    /// Group state cache capacity before LRU eviction
    pub state_cache_capacity: usize,
    /// Quiet period before cached state is flushed to storage (ms)
    #[serde(default = "default_debounce_ms")]
    pub persistence_debounce_ms: u64,
    /// Settle time after switching the transceiver between variants (ms)
    #[serde(default)]
    pub reconfigure_settle_ms: u64,
    /// Interval between transition steps (ms)
    #[serde(default = "default_step_ms")]
    pub transition_step_ms: u64,
}

fn default_debounce_ms() -> u64 {
    2500
}

fn default_step_ms() -> u64 {
    450
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20,
            packet_repeats: 10,
            repeat_interval_ms: 5,
            send_queue_capacity: 32,
            state_cache_capacity: 128,
            persistence_debounce_ms: default_debounce_ms(),
            reconfigure_settle_ms: 2,
            transition_step_ms: default_step_ms(),
        }
    }
}

impl HubConfig {
    /// Repeat spacing as a [`Duration`]
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    /// Persistence quiet period as a [`Duration`]
    pub fn persistence_debounce(&self) -> Duration {
        Duration::from_millis(self.persistence_debounce_ms)
    }

    /// Settle window as a [`Duration`]
    pub fn reconfigure_settle(&self) -> Duration {
        Duration::from_millis(self.reconfigure_settle_ms)
    }

    /// Transition step interval as a [`Duration`]
    pub fn transition_step(&self) -> Duration {
        Duration::from_millis(self.transition_step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_serde_round_trip() {
        let config = HubConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: HubConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{
            "tick_interval_ms": 10,
            "packet_repeats": 25,
            "repeat_interval_ms": 2,
            "send_queue_capacity": 16,
            "state_cache_capacity": 64
        }"#;
        let config: HubConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.packet_repeats, 25);
        assert_eq!(config.persistence_debounce_ms, default_debounce_ms());
        assert_eq!(config.reconfigure_settle_ms, 0);
    }
}
