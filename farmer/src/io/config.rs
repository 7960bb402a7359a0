//! Farmer configuration, read from a TOML file (default `farmer.toml`).

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Farmer configuration (TOML).
///
/// Missing fields default to the values the game client has always used, so
/// an empty or absent file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FarmConfig {
    pub timings: Timings,
    pub farm: FarmSettings,
    pub api: ApiConfig,
}

/// Durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timings {
    /// How long a normal zone must be held before reporting score.
    pub hold_secs: u64,
    /// Interval at which a hold checks the coordinator signal.
    pub poll_secs: u64,
    /// Wait after a transient failure before retrying.
    pub cooldown_secs: u64,
    /// Wait between boss damage rounds.
    pub boss_round_secs: u64,
    /// Per-request timeout for the HTTP client.
    pub request_timeout_secs: u64,
    /// Time for the prober role to rotate once through the whole fleet.
    pub probe_cycle_secs: u64,
    /// Delay between starting consecutive agents.
    pub spawn_stagger_secs: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            hold_secs: 110,
            poll_secs: 1,
            cooldown_secs: 20,
            boss_round_secs: 5,
            request_timeout_secs: 15,
            probe_cycle_secs: 60,
            spawn_stagger_secs: 5,
        }
    }
}

impl Timings {
    pub fn hold(&self) -> Duration {
        Duration::from_secs(self.hold_secs)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn boss_round(&self) -> Duration {
        Duration::from_secs(self.boss_round_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_cycle(&self) -> Duration {
        Duration::from_secs(self.probe_cycle_secs)
    }

    pub fn spawn_stagger(&self) -> Duration {
        Duration::from_secs(self.spawn_stagger_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FarmSettings {
    /// Join boss zones when they appear, and let them preempt holds.
    pub supports_boss_encounters: bool,
    /// Damage reported on every non-heal boss round.
    pub boss_damage_per_round: u32,
    /// Consecutive failed boss rounds tolerated before the encounter aborts.
    pub boss_failure_tolerance: u32,
    /// Whether a probe that finds nothing clears the shared signal.
    pub clear_signal_on_empty_probe: bool,
}

impl Default for FarmSettings {
    fn default() -> Self {
        Self {
            supports_boss_encounters: true,
            boss_damage_per_round: 1,
            boss_failure_tolerance: 5,
            clear_signal_on_empty_probe: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub language: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://community.steam-api.com".to_string(),
            language: "english".to_string(),
        }
    }
}

impl FarmConfig {
    /// Reject settings that would stall the agents or spin them without
    /// delay. `spawn_stagger_secs = 0` is allowed and starts all agents at
    /// once.
    pub fn validate(&self) -> Result<()> {
        let timings = &self.timings;
        for (name, value) in [
            ("timings.hold_secs", timings.hold_secs),
            ("timings.poll_secs", timings.poll_secs),
            ("timings.cooldown_secs", timings.cooldown_secs),
            ("timings.boss_round_secs", timings.boss_round_secs),
            ("timings.request_timeout_secs", timings.request_timeout_secs),
            ("timings.probe_cycle_secs", timings.probe_cycle_secs),
        ] {
            if value == 0 {
                return Err(anyhow!("{name} must be > 0"));
            }
        }
        if timings.poll_secs > timings.hold_secs {
            return Err(anyhow!("timings.poll_secs must not exceed timings.hold_secs"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("api.base_url must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `FarmConfig::default()`.
pub fn load_config(path: &Path) -> Result<FarmConfig> {
    if !path.exists() {
        let cfg = FarmConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FarmConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &FarmConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
