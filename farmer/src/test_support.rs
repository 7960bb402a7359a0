//! Test-only helpers: zone/planet builders, a scripted game API and a
//! recording event sink.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::result_code::ResultCode;
use crate::core::types::{
    AccountSession, BossFightState, BossJoin, BossPlayer, BossRoundUpdate, Planet, PlayerInfo,
    ScoreReport, Target, Zone, ZoneKind,
};
use crate::io::api::{ApiError, ApiReply, ApiResult, BossRound, GameApi};
use crate::io::events::{AgentEvent, EventSink, Severity, Stage};

/// Token that passes credential validation.
pub const TEST_TOKEN: &str = "0123456789abcdef0123456789abcdef";

/// Create a live normal zone with a deterministic game id.
pub fn normal_zone(planet_id: u32, position: u32, difficulty: u8, capture_progress: f64) -> Zone {
    Zone {
        planet_id,
        position,
        game_id: planet_id * 1000 + position,
        difficulty,
        kind: ZoneKind::Normal,
        captured: false,
        capture_progress,
        boss_active: false,
    }
}

/// Create a live, active boss zone.
pub fn boss_zone(planet_id: u32, position: u32, capture_progress: f64) -> Zone {
    Zone {
        kind: ZoneKind::Boss,
        boss_active: true,
        ..normal_zone(planet_id, position, 3, capture_progress)
    }
}

pub fn planet(id: u32, name: &str, zones: Vec<Zone>) -> Planet {
    Planet {
        id,
        name: name.to_string(),
        captured: false,
        capture_progress: 0.5,
        zones,
    }
}

pub fn target(planet_id: u32, zone: Zone) -> Target {
    Target {
        planet_id,
        planet_name: format!("planet-{planet_id}"),
        zone,
    }
}

pub fn session(name: &str, account_id: Option<u32>) -> AccountSession {
    AccountSession {
        name: name.to_string(),
        token: TEST_TOKEN.to_string(),
        account_id,
    }
}

/// Boss round reply with our own XP and the given flags.
pub fn boss_update(account_id: u32, xp_earned: u64, game_over: bool) -> ApiReply<BossRoundUpdate> {
    let status = BossFightState {
        boss_hp: if game_over { 0 } else { 1_000 },
        boss_max_hp: 10_000,
        players: vec![BossPlayer {
            account_id,
            name: "self".to_string(),
            hp: 100,
            max_hp: 100,
            xp_earned,
            ..BossPlayer::default()
        }],
        waiting_for_players: false,
        game_over,
    };
    ApiReply::ok(BossRoundUpdate {
        status: Some(status),
        waiting_for_players: false,
        game_over,
    })
}

/// Every call the scripted API received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    PlayerInfo,
    Planets,
    Planet(u32),
    JoinPlanet(u32),
    LeaveGame(u32),
    JoinZone(u32),
    JoinBossZone(u32),
    ReportScore(u32),
    ReportBossDamage(BossRound),
}

/// A queued reply: either a reply or a transport failure.
enum Scripted<T> {
    Reply(ApiReply<T>),
    Unauthorized,
    Broken(String),
}

impl<T> Scripted<T> {
    fn into_result(self) -> ApiResult<T> {
        match self {
            Scripted::Reply(reply) => Ok(reply),
            Scripted::Unauthorized => Err(ApiError::Unauthorized { status: 401 }),
            Scripted::Broken(message) => Err(ApiError::Other(message)),
        }
    }
}

#[derive(Default)]
struct Script {
    planets: Vec<Planet>,
    failing_planets: HashSet<u32>,
    score: u64,
    player_info: VecDeque<Scripted<PlayerInfo>>,
    planet_list: VecDeque<ResultCode>,
    join_planet: VecDeque<ResultCode>,
    leave_game: VecDeque<ResultCode>,
    join_zone: VecDeque<ResultCode>,
    join_boss: VecDeque<Scripted<BossJoin>>,
    report_score: VecDeque<Scripted<ScoreReport>>,
    boss_rounds: VecDeque<Scripted<BossRoundUpdate>>,
    calls: Vec<ApiCall>,
}

/// Game API double that replays queued replies and records every call.
///
/// Once a queue runs dry the API answers with a plain success (for boss
/// rounds: `InvalidState`, so encounters always terminate).
pub struct ScriptedGameApi {
    script: Mutex<Script>,
}

impl ScriptedGameApi {
    pub fn new(planets: Vec<Planet>) -> Self {
        Self {
            script: Mutex::new(Script {
                planets,
                ..Script::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().expect("script lock");
        f(&mut script)
    }

    pub fn fail_planet(&self, planet_id: u32) {
        self.with(|script| script.failing_planets.insert(planet_id));
    }

    pub fn push_planets_code(&self, code: ResultCode) {
        self.with(|script| script.planet_list.push_back(code));
    }

    pub fn push_player_info(&self, reply: ApiReply<PlayerInfo>) {
        self.with(|script| script.player_info.push_back(Scripted::Reply(reply)));
    }

    pub fn push_player_info_unauthorized(&self) {
        self.with(|script| script.player_info.push_back(Scripted::Unauthorized));
    }

    pub fn push_player_info_broken(&self, message: &str) {
        self.with(|script| {
            script
                .player_info
                .push_back(Scripted::Broken(message.to_string()));
        });
    }

    pub fn push_join_planet(&self, code: ResultCode) {
        self.with(|script| script.join_planet.push_back(code));
    }

    pub fn push_leave_game(&self, code: ResultCode) {
        self.with(|script| script.leave_game.push_back(code));
    }

    pub fn push_join_zone(&self, code: ResultCode) {
        self.with(|script| script.join_zone.push_back(code));
    }

    pub fn push_join_boss(&self, reply: ApiReply<BossJoin>) {
        self.with(|script| script.join_boss.push_back(Scripted::Reply(reply)));
    }

    pub fn push_report_score(&self, reply: ApiReply<ScoreReport>) {
        self.with(|script| script.report_score.push_back(Scripted::Reply(reply)));
    }

    pub fn push_boss_round(&self, reply: ApiReply<BossRoundUpdate>) {
        self.with(|script| script.boss_rounds.push_back(Scripted::Reply(reply)));
    }

    pub fn push_boss_round_broken(&self, message: &str) {
        self.with(|script| {
            script
                .boss_rounds
                .push_back(Scripted::Broken(message.to_string()));
        });
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.with(|script| script.calls.clone())
    }

    pub fn planet_list_calls(&self) -> usize {
        self.with(|script| {
            script
                .calls
                .iter()
                .filter(|call| **call == ApiCall::Planets)
                .count()
        })
    }

    pub fn score_reports(&self) -> Vec<u32> {
        self.with(|script| {
            script
                .calls
                .iter()
                .filter_map(|call| match call {
                    ApiCall::ReportScore(score) => Some(*score),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn boss_rounds(&self) -> Vec<BossRound> {
        self.with(|script| {
            script
                .calls
                .iter()
                .filter_map(|call| match call {
                    ApiCall::ReportBossDamage(round) => Some(*round),
                    _ => None,
                })
                .collect()
        })
    }
}

fn code_reply(code: Option<ResultCode>) -> ApiResult<()> {
    Ok(ApiReply {
        code: code.unwrap_or(ResultCode::Ok),
        payload: Some(()),
    })
}

#[async_trait]
impl GameApi for ScriptedGameApi {
    async fn player_info(&self, _token: &str) -> ApiResult<PlayerInfo> {
        self.with(|script| {
            script.calls.push(ApiCall::PlayerInfo);
            match script.player_info.pop_front() {
                Some(scripted) => scripted.into_result(),
                None => Ok(ApiReply::ok(PlayerInfo {
                    score: script.score,
                    ..PlayerInfo::default()
                })),
            }
        })
    }

    async fn planets(&self) -> ApiResult<Vec<Planet>> {
        self.with(|script| {
            script.calls.push(ApiCall::Planets);
            match script.planet_list.pop_front() {
                Some(code) if !code.is_ok() => Ok(ApiReply::code(code)),
                _ => {
                    let summaries = script
                        .planets
                        .iter()
                        .map(|planet| Planet {
                            zones: Vec::new(),
                            ..planet.clone()
                        })
                        .collect();
                    Ok(ApiReply::ok(summaries))
                }
            }
        })
    }

    async fn planet(&self, planet_id: u32) -> ApiResult<Planet> {
        self.with(|script| {
            script.calls.push(ApiCall::Planet(planet_id));
            if script.failing_planets.contains(&planet_id) {
                return Ok(ApiReply::code(ResultCode::bad_response()));
            }
            let found = script
                .planets
                .iter()
                .find(|planet| planet.id == planet_id)
                .cloned();
            Ok(match found {
                Some(planet) => ApiReply::ok(planet),
                None => ApiReply::code(ResultCode::bad_response()),
            })
        })
    }

    async fn join_planet(&self, _token: &str, planet_id: u32) -> ApiResult<()> {
        self.with(|script| {
            script.calls.push(ApiCall::JoinPlanet(planet_id));
            code_reply(script.join_planet.pop_front())
        })
    }

    async fn leave_game(&self, _token: &str, game_id: u32) -> ApiResult<()> {
        self.with(|script| {
            script.calls.push(ApiCall::LeaveGame(game_id));
            code_reply(script.leave_game.pop_front())
        })
    }

    async fn join_zone(&self, _token: &str, position: u32) -> ApiResult<()> {
        self.with(|script| {
            script.calls.push(ApiCall::JoinZone(position));
            code_reply(script.join_zone.pop_front())
        })
    }

    async fn join_boss_zone(&self, _token: &str, position: u32) -> ApiResult<BossJoin> {
        self.with(|script| {
            script.calls.push(ApiCall::JoinBossZone(position));
            match script.join_boss.pop_front() {
                Some(scripted) => scripted.into_result(),
                None => Ok(ApiReply::ok(BossJoin::default())),
            }
        })
    }

    async fn report_score(&self, _token: &str, score: u32) -> ApiResult<ScoreReport> {
        self.with(|script| {
            script.calls.push(ApiCall::ReportScore(score));
            match script.report_score.pop_front() {
                Some(scripted) => scripted.into_result(),
                None => {
                    let old_score = script.score;
                    script.score += u64::from(score);
                    Ok(ApiReply::ok(ScoreReport {
                        old_score,
                        old_level: 1,
                        new_score: script.score,
                        new_level: 1,
                        next_level_score: None,
                    }))
                }
            }
        })
    }

    async fn report_boss_damage(&self, _token: &str, round: BossRound) -> ApiResult<BossRoundUpdate> {
        self.with(|script| {
            script.calls.push(ApiCall::ReportBossDamage(round));
            match script.boss_rounds.pop_front() {
                Some(scripted) => scripted.into_result(),
                None => Ok(ApiReply::code(ResultCode::InvalidState)),
            }
        })
    }
}

/// Sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AgentEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().expect("events lock").clone()
    }

    /// Events of one severity raised in one stage.
    pub fn matching(&self, stage: Stage, severity: Severity) -> Vec<AgentEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.stage == stage && event.severity == severity)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: AgentEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}
