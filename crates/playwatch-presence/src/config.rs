//! Presence cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the [`PresenceCache`](crate::PresenceCache).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Maximum age of derived "current session" values before a read
    /// recomputes them.
    pub staleness_window: Duration,
}

impl PresenceConfig {
    pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_millis(5_000);

    pub fn with_window(staleness_window: Duration) -> Self {
        Self { staleness_window }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            staleness_window: Self::DEFAULT_STALENESS_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_config_default_window_is_five_seconds() {
        assert_eq!(PresenceConfig::default().staleness_window, Duration::from_secs(5));
    }
}
