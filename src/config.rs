//! Runtime configuration of a machine.

use serde::{Deserialize, Serialize};

/// Default bound on consecutive completion transitions in one region.
pub const DEFAULT_MAX_COMPLETION_CHAIN: usize = 64;

/// Runtime limits and switches.
///
/// # Example
///
/// ```rust
/// use stateloom::MachineConfig;
///
/// let config = MachineConfig::default()
///     .auto_start(false)
///     .queue_capacity(128)
///     .track_history(true);
///
/// assert!(!config.auto_start);
/// assert_eq!(config.queue_capacity, Some(128));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Start every region as the last step of `build`.
    pub auto_start: bool,
    /// Completion transitions a region may chain before the table is
    /// considered malformed.
    pub max_completion_chain: usize,
    /// Hard cap on pending events; `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// Record every state-to-state transition in the machine's history.
    pub track_history: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            max_completion_chain: DEFAULT_MAX_COMPLETION_CHAIN,
            queue_capacity: None,
            track_history: false,
        }
    }
}

impl MachineConfig {
    pub fn auto_start(mut self, enabled: bool) -> Self {
        self.auto_start = enabled;
        self
    }

    pub fn max_completion_chain(mut self, limit: usize) -> Self {
        self.max_completion_chain = limit;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn track_history(mut self, enabled: bool) -> Self {
        self.track_history = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MachineConfig::default();

        assert!(config.auto_start);
        assert_eq!(config.max_completion_chain, DEFAULT_MAX_COMPLETION_CHAIN);
        assert_eq!(config.queue_capacity, None);
        assert!(!config.track_history);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: MachineConfig = serde_json::from_str(r#"{"track_history": true}"#).unwrap();

        assert!(config.track_history);
        assert!(config.auto_start);
        assert_eq!(config.max_completion_chain, DEFAULT_MAX_COMPLETION_CHAIN);
    }
}
