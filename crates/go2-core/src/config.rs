use crate::error::{MotionError, Result};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Delays
// ---------------------------------------------------------------------------

/// Settling delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delays {
    /// After the balance stand issued before a jump.
    #[serde(default = "default_pre_balance_ms")]
    pub pre_balance_ms: u64,
    /// After each continuation fired by a trigger.
    #[serde(default = "default_continuation_ms")]
    pub continuation_ms: u64,
    /// After each action typed at the menu.
    #[serde(default = "default_command_ms")]
    pub command_ms: u64,
    /// After each action given on the command line.
    #[serde(default = "default_batch_ms")]
    pub batch_ms: u64,
}

fn default_pre_balance_ms() -> u64 {
    600
}

fn default_continuation_ms() -> u64 {
    400
}

fn default_command_ms() -> u64 {
    500
}

fn default_batch_ms() -> u64 {
    400
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            pre_balance_ms: default_pre_balance_ms(),
            continuation_ms: default_continuation_ms(),
            command_ms: default_command_ms(),
            batch_ms: default_batch_ms(),
        }
    }
}

impl Delays {
    /// No settling at all; for tests and dry runs.
    pub fn none() -> Self {
        Self {
            pre_balance_ms: 0,
            continuation_ms: 0,
            command_ms: 0,
            batch_ms: 0,
        }
    }

    pub fn pre_balance(&self) -> Duration {
        Duration::from_millis(self.pre_balance_ms)
    }

    pub fn continuation(&self) -> Duration {
        Duration::from_millis(self.continuation_ms)
    }

    pub fn command(&self) -> Duration {
        Duration::from_millis(self.command_ms)
    }

    pub fn batch(&self) -> Duration {
        Duration::from_millis(self.batch_ms)
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Action name -> status code the simulator answers with.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fail: BTreeMap<String, i32>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default)]
    pub delays: Delays,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub sim: SimConfig,
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            timeout_secs: default_timeout_secs(),
            delays: Delays::default(),
            poll_interval_ms: default_poll_interval_ms(),
            sim: SimConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(MotionError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        self.configured_timeout()
            .unwrap_or_else(|| Duration::from_secs_f64(default_timeout_secs()))
    }

    /// `timeout_secs` as a duration, if it is positive and representable.
    fn configured_timeout(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|d| !d.is_zero())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let registry = Registry::standard();

        if self.configured_timeout().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "timeout_secs={} is not a usable duration; using {}",
                    self.timeout_secs,
                    default_timeout_secs()
                ),
            });
        }

        for (name, code) in &self.sim.fail {
            if registry.find(name).is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown action '{name}' in sim.fail"),
                });
            }
            if *code == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("sim.fail for '{name}' is 0, which is a success status"),
                });
            }
        }

        if self.delays.pre_balance_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "delays.pre_balance_ms is 0: jumps will not wait for the balance stand"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_path_gives_defaults() {
        let cfg = Config::load(None).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.interface, "eth0");
        assert_eq!(cfg.delays.pre_balance_ms, 600);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, MotionError::ConfigNotFound(_)));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("go2.yaml");
        std::fs::write(
            &path,
            "interface: enp3s0\ndelays:\n  command_ms: 0\nsim:\n  fail:\n    sit: 3104\n",
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.interface, "enp3s0");
        assert_eq!(cfg.delays.command_ms, 0);
        assert_eq!(cfg.delays.continuation_ms, 400);
        assert_eq!(cfg.sim.fail.get("sit"), Some(&3104));
    }

    #[test]
    fn empty_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("go2.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn roundtrip() {
        let mut cfg = Config::default();
        cfg.sim.fail.insert("front_jump".into(), 7);
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn validate_default_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_sim_entries() {
        let mut cfg = Config::default();
        cfg.sim.fail.insert("dance".into(), 1);
        cfg.sim.fail.insert("sit".into(), 0);
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.message.contains("unknown action 'dance'")));
        assert!(warnings.iter().any(|w| w.message.contains("'sit' is 0")));
    }

    #[test]
    fn validate_flags_bad_timeout() {
        let cfg = Config {
            timeout_secs: -1.0,
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn out_of_range_timeout_falls_back() {
        for secs in [1e30, f64::INFINITY, f64::NAN, 0.0] {
            let cfg = Config {
                timeout_secs: secs,
                ..Config::default()
            };
            assert_eq!(cfg.validate().len(), 1, "{secs}");
            assert_eq!(cfg.timeout(), Duration::from_secs(10), "{secs}");
        }
    }
}
