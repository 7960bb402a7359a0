//! Game API abstraction.
//!
//! The [`GameApi`] trait decouples the farming loop from the HTTP transport.
//! Tests use a scripted implementation that replays predetermined replies
//! without touching the network.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::result_code::ResultCode;
use crate::core::types::{BossJoin, BossRoundUpdate, Planet, PlayerInfo, ScoreReport};

/// Result code plus the decoded payload, if the service sent a usable one.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply<T> {
    pub code: ResultCode,
    pub payload: Option<T>,
}

impl<T> ApiReply<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            code: ResultCode::Ok,
            payload: Some(payload),
        }
    }

    pub fn code(code: ResultCode) -> Self {
        Self {
            code,
            payload: None,
        }
    }

    /// Payload of a successful reply; `None` if the code or payload is missing.
    pub fn into_ok(self) -> Option<T> {
        if self.code.is_ok() { self.payload } else { None }
    }
}

/// Transport-level failures. Everything except [`ApiError::Unauthorized`] is
/// treated as transient by callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("credentials rejected (http {status})")]
    Unauthorized { status: u16 },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

pub type ApiResult<T> = Result<ApiReply<T>, ApiError>;

/// One damage round sent to a boss fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossRound {
    pub use_heal_ability: bool,
    pub damage_to_boss: u32,
    pub damage_taken: u32,
}

/// Remote operations the farming loop depends on.
///
/// Implementations are stateless apart from connection reuse; the account
/// token is passed to every authenticated call.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn player_info(&self, token: &str) -> ApiResult<PlayerInfo>;

    /// Active planets; zones may be left empty.
    async fn planets(&self) -> ApiResult<Vec<Planet>>;

    /// A single planet including all of its zones.
    async fn planet(&self, planet_id: u32) -> ApiResult<Planet>;

    async fn join_planet(&self, token: &str, planet_id: u32) -> ApiResult<()>;

    /// Leave a planet or a zone/boss game by its game id.
    async fn leave_game(&self, token: &str, game_id: u32) -> ApiResult<()>;

    async fn join_zone(&self, token: &str, position: u32) -> ApiResult<()>;

    async fn join_boss_zone(&self, token: &str, position: u32) -> ApiResult<BossJoin>;

    async fn report_score(&self, token: &str, score: u32) -> ApiResult<ScoreReport>;

    async fn report_boss_damage(&self, token: &str, round: BossRound) -> ApiResult<BossRoundUpdate>;
}
