//! Engine configuration, stored in ~/.mealagenda/config.json.
//!
//! Every field has a serde default so a partial or missing file still
//! yields a usable configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Configuration for the agenda engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaConfig {
    /// IANA timezone used for day keys and the today predicate.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Buffer size of the engine's event queue.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_event_capacity() -> usize {
    64
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl AgendaConfig {
    /// Resolve the configured timezone, falling back to UTC when the name
    /// is unknown.
    pub fn tz(&self) -> Tz {
        match self.timezone.parse() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!(
                    "Unknown timezone '{}', falling back to UTC",
                    self.timezone
                );
                chrono_tz::UTC
            }
        }
    }
}

/// Canonical config file path (~/.mealagenda/config.json).
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".mealagenda").join("config.json"))
}

/// Load configuration from the canonical path. A missing file yields the
/// defaults; a malformed file is an error.
pub fn load_config() -> Result<AgendaConfig, String> {
    load_config_from(&config_path()?)
}

/// Load configuration from an explicit path.
pub fn load_config_from(path: &Path) -> Result<AgendaConfig, String> {
    if !path.exists() {
        log::info!(
            "No config at {}, using defaults",
            path.display()
        );
        return Ok(AgendaConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "timezone": "America/New_York" }"#).unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let config = AgendaConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..AgendaConfig::default()
        };
        assert_eq!(config.tz(), chrono_tz::UTC);
    }

    #[test]
    fn test_known_timezone_resolves() {
        let config = AgendaConfig {
            timezone: "Europe/Paris".to_string(),
            ..AgendaConfig::default()
        };
        assert_eq!(config.tz(), chrono_tz::Europe::Paris);
    }
}
