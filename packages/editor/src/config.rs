use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session tuning knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo steps kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Quiet period before a burst of edits is persisted
    #[serde(default = "default_autosave_quiet_period_ms")]
    pub autosave_quiet_period_ms: u64,

    #[serde(default = "default_autosave_max_retries")]
    pub autosave_max_retries: u32,

    /// Linear backoff step between persistence retries
    #[serde(default = "default_autosave_retry_backoff_ms")]
    pub autosave_retry_backoff_ms: u64,
}

fn default_history_limit() -> usize {
    100
}

fn default_autosave_quiet_period_ms() -> u64 {
    1500
}

fn default_autosave_max_retries() -> u32 {
    5
}

fn default_autosave_retry_backoff_ms() -> u64 {
    500
}

impl EditorConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_period_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.autosave_retry_backoff_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            autosave_quiet_period_ms: default_autosave_quiet_period_ms(),
            autosave_max_retries: default_autosave_max_retries(),
            autosave_retry_backoff_ms: default_autosave_retry_backoff_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{ "historyLimit": 50 }"#;
        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.quiet_period(), Duration::from_millis(1500));
        assert_eq!(config.autosave_max_retries, 5);
    }
}
