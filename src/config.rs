use std::time::Duration;

use serde::Deserialize;

/// Engine settings. Every field has a default so `{}` and `undefined` are valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay before a roll without usable dice passes the turn by itself.
    pub dance_delay_ms: u64,
    /// When false the dancing player has to pass explicitly.
    pub auto_pass: bool,
    pub record_history: bool,
    pub history_limit: usize,
    pub log_filter: String,
}

impl EngineConfig {
    pub fn dance_delay(&self) -> Duration {
        Duration::from_millis(self.dance_delay_ms)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dance_delay_ms: 1500,
            auto_pass: true,
            record_history: true,
            history_limit: 1000,
            log_filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = EngineConfig::from_json(r#"{"dance_delay_ms": 10}"#).unwrap();

        assert_eq!(config.dance_delay(), Duration::from_millis(10));
        assert!(config.auto_pass);
        assert_eq!(config.history_limit, 1000);
    }
}
