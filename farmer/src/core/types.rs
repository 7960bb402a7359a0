//! Shared deterministic types for farmer core logic.
//!
//! These types mirror what the remote service reports, already decoded from
//! the wire. They carry no I/O handles and compare by value so selection and
//! encounter logic can be tested on plain literals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Variant of a zone as far as the farming loop is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Normal,
    Boss,
}

/// A capturable unit of work on a planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub planet_id: u32,
    /// Position of the zone on the planet grid; used to join it.
    pub position: u32,
    /// Remote game handle for the zone, used when leaving it.
    pub game_id: u32,
    pub difficulty: u8,
    pub kind: ZoneKind,
    pub captured: bool,
    pub capture_progress: f64,
    /// Only meaningful for boss zones.
    pub boss_active: bool,
}

impl Zone {
    /// True if joining the zone could still earn anything.
    ///
    /// Captured zones are finished and zero-progress zones are not live yet.
    pub fn is_eligible(&self) -> bool {
        !self.captured && self.capture_progress > 0.0
    }

    pub fn is_active_boss(&self) -> bool {
        self.kind == ZoneKind::Boss && self.boss_active
    }
}

/// A planet snapshot with its zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: u32,
    pub name: String,
    pub captured: bool,
    pub capture_progress: f64,
    pub zones: Vec<Zone>,
}

/// The zone an agent should pursue, together with its owning planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub planet_id: u32,
    pub planet_name: String,
    pub zone: Zone,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.zone.kind {
            ZoneKind::Boss => write!(
                f,
                "boss zone {} on planet {} ({})",
                self.zone.position, self.planet_id, self.planet_name
            ),
            ZoneKind::Normal => write!(
                f,
                "zone {} (difficulty {}) on planet {} ({})",
                self.zone.position, self.zone.difficulty, self.planet_id, self.planet_name
            ),
        }
    }
}

/// Immutable identity of one farming account.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountSession {
    pub name: String,
    pub token: String,
    /// 32-bit account id, used to find ourselves in boss fight rosters.
    pub account_id: Option<u32>,
}

impl fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSession")
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Running tally an agent keeps about its own account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub score: Option<u64>,
    pub level: Option<u32>,
    pub next_level_score: Option<u64>,
    pub active_planet: Option<u32>,
    pub active_zone: Option<u32>,
}

/// Session status reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub active_planet: Option<u32>,
    pub active_zone_game: Option<u32>,
    pub active_zone_position: Option<u32>,
    pub active_boss_game: Option<u32>,
    pub score: u64,
    pub level: u32,
    pub next_level_score: Option<u64>,
}

/// Outcome of a successful score report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub old_score: u64,
    pub old_level: u32,
    pub new_score: u64,
    pub new_level: u32,
    pub next_level_score: Option<u64>,
}

/// Payload returned when joining a boss zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossJoin {
    pub waiting_for_players: bool,
}

/// One participant of a boss fight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossPlayer {
    pub account_id: u32,
    pub name: String,
    pub hp: u64,
    pub max_hp: u64,
    pub damage_dealt: u64,
    pub heals_used: u32,
    pub score_on_join: u64,
    pub xp_earned: u64,
}

/// Fight status returned by every boss damage round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossFightState {
    pub boss_hp: u64,
    pub boss_max_hp: u64,
    pub players: Vec<BossPlayer>,
    pub waiting_for_players: bool,
    pub game_over: bool,
}

impl BossFightState {
    pub fn player(&self, account_id: u32) -> Option<&BossPlayer> {
        self.players
            .iter()
            .find(|player| player.account_id == account_id)
    }
}

/// Full reply to a boss damage round.
///
/// `status` is absent until the service has a fight to report on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossRoundUpdate {
    pub status: Option<BossFightState>,
    pub waiting_for_players: bool,
    pub game_over: bool,
}
