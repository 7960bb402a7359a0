//! JSON shapes returned by the minigame service.
//!
//! The service is inconsistent about numbers: ids, scores and game handles
//! arrive as JSON strings on some endpoints and as numbers on others. Every
//! numeric field therefore goes through [`lenient`].

use serde::Deserialize;

use crate::core::types::{
    BossFightState, BossJoin, BossPlayer, BossRoundUpdate, Planet, PlayerInfo, ScoreReport, Zone,
    ZoneKind,
};

/// Zone `type` value the service uses for boss zones.
const BOSS_ZONE_TYPE: u32 = 4;

/// Top-level `{"response": ...}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub response: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerInfoWire {
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub active_planet: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub active_zone_game: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub active_zone_position: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub active_boss_game: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub score: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub level: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub next_level_score: Option<u64>,
}

impl From<PlayerInfoWire> for PlayerInfo {
    fn from(wire: PlayerInfoWire) -> Self {
        PlayerInfo {
            active_planet: nonzero(wire.active_planet),
            active_zone_game: nonzero(wire.active_zone_game),
            active_zone_position: wire.active_zone_position.and_then(to_u32),
            active_boss_game: nonzero(wire.active_boss_game),
            score: wire.score.unwrap_or(0),
            level: wire.level.and_then(to_u32).unwrap_or(0),
            next_level_score: wire.next_level_score,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanetsWire {
    pub planets: Vec<PlanetWire>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanetWire {
    #[serde(deserialize_with = "lenient::u64")]
    pub id: u64,
    pub state: PlanetStateWire,
    pub zones: Vec<ZoneWire>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanetStateWire {
    pub name: String,
    pub captured: bool,
    pub capture_progress: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ZoneWire {
    #[serde(deserialize_with = "lenient::u64")]
    pub zone_position: u64,
    #[serde(rename = "type", deserialize_with = "lenient::u64")]
    pub zone_type: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub gameid: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub difficulty: u64,
    pub captured: bool,
    pub capture_progress: f64,
    pub boss_active: bool,
}

impl PlanetWire {
    pub fn into_planet(self) -> Planet {
        let planet_id = to_u32(self.id).unwrap_or_default();
        Planet {
            id: planet_id,
            name: self.state.name,
            captured: self.state.captured,
            capture_progress: self.state.capture_progress,
            zones: self
                .zones
                .into_iter()
                .map(|zone| zone.into_zone(planet_id))
                .collect(),
        }
    }
}

impl ZoneWire {
    fn into_zone(self, planet_id: u32) -> Zone {
        let kind = if self.zone_type == u64::from(BOSS_ZONE_TYPE) {
            ZoneKind::Boss
        } else {
            ZoneKind::Normal
        };
        Zone {
            planet_id,
            position: to_u32(self.zone_position).unwrap_or_default(),
            game_id: to_u32(self.gameid).unwrap_or_default(),
            difficulty: u8::try_from(self.difficulty).unwrap_or(0),
            kind,
            captured: self.captured,
            capture_progress: self.capture_progress,
            boss_active: self.boss_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScoreReportWire {
    #[serde(deserialize_with = "lenient::u64")]
    pub old_score: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub old_level: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub new_score: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub new_level: u64,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub next_level_score: Option<u64>,
}

impl From<ScoreReportWire> for ScoreReport {
    fn from(wire: ScoreReportWire) -> Self {
        ScoreReport {
            old_score: wire.old_score,
            old_level: to_u32(wire.old_level).unwrap_or_default(),
            new_score: wire.new_score,
            new_level: to_u32(wire.new_level).unwrap_or_default(),
            next_level_score: wire.next_level_score,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BossJoinWire {
    pub waiting_for_players: bool,
}

impl From<BossJoinWire> for BossJoin {
    fn from(wire: BossJoinWire) -> Self {
        BossJoin {
            waiting_for_players: wire.waiting_for_players,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BossRoundWire {
    pub boss_status: Option<BossStatusWire>,
    pub waiting_for_players: bool,
    pub game_over: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BossStatusWire {
    #[serde(deserialize_with = "lenient::u64")]
    pub boss_hp: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub boss_max_hp: u64,
    pub boss_players: Vec<BossPlayerWire>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BossPlayerWire {
    #[serde(deserialize_with = "lenient::u64")]
    pub accountid: u64,
    pub name: String,
    #[serde(deserialize_with = "lenient::u64")]
    pub hp: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub max_hp: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub damage_dealt: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub heals_used: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub score_on_join: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub xp_earned: u64,
}

impl From<BossRoundWire> for BossRoundUpdate {
    fn from(wire: BossRoundWire) -> Self {
        let status = wire.boss_status.map(|status| BossFightState {
            boss_hp: status.boss_hp,
            boss_max_hp: status.boss_max_hp,
            players: status
                .boss_players
                .into_iter()
                .map(|player| BossPlayer {
                    account_id: to_u32(player.accountid).unwrap_or_default(),
                    name: player.name,
                    hp: player.hp,
                    max_hp: player.max_hp,
                    damage_dealt: player.damage_dealt,
                    heals_used: to_u32(player.heals_used).unwrap_or_default(),
                    score_on_join: player.score_on_join,
                    xp_earned: player.xp_earned,
                })
                .collect(),
            waiting_for_players: wire.waiting_for_players,
            game_over: wire.game_over,
        });
        BossRoundUpdate {
            status,
            waiting_for_players: wire.waiting_for_players,
            game_over: wire.game_over,
        }
    }
}

fn to_u32(value: u64) -> Option<u32> {
    u32::try_from(value).ok()
}

/// The service reports "no active game" as `0`.
fn nonzero(value: Option<u64>) -> Option<u32> {
    value.filter(|value| *value != 0).and_then(to_u32)
}

mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Float(f64),
        Text(String),
    }

    fn parse<E: Error>(value: NumberOrString) -> Result<Option<u64>, E> {
        match value {
            NumberOrString::Number(number) => Ok(Some(number)),
            NumberOrString::Float(number) if number >= 0.0 => Ok(Some(number as u64)),
            NumberOrString::Float(number) => Err(E::custom(format!("negative number {number}"))),
            NumberOrString::Text(text) if text.trim().is_empty() => Ok(None),
            NumberOrString::Text(text) => text
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|err| E::custom(format!("invalid number {text:?}: {err}"))),
        }
    }

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(opt_u64(deserializer)?.unwrap_or(0))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Option::<NumberOrString>::deserialize(deserializer)? {
            Some(value) => parse(value),
            None => Ok(None),
        }
    }
}
