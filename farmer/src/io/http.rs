//! [`GameApi`] over HTTPS against the Steam web API host.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::core::result_code::ResultCode;
use crate::core::types::{BossJoin, BossRoundUpdate, Planet, PlayerInfo, ScoreReport};
use crate::io::api::{ApiError, ApiReply, ApiResult, BossRound, GameApi};
use crate::io::config::ApiConfig;
use crate::io::wire::{
    BossJoinWire, BossRoundWire, Envelope, PlanetsWire, PlayerInfoWire, ScoreReportWire,
};

const TERRITORY_SERVICE: &str = "ITerritoryControlMinigameService";
const MINIGAME_SERVICE: &str = "IMiniGameService";
const ERESULT_HEADER: &str = "x-eresult";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/67.0.3396.87 Safari/537.36";

/// Raw reply before payload decoding.
struct RawReply {
    code: ResultCode,
    body: String,
}

pub struct HttpGameApi {
    http: Client,
    base_url: String,
    language: String,
}

impl HttpGameApi {
    pub fn new(config: &ApiConfig, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, */*"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://steamcommunity.com"));
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://steamcommunity.com/saliengame/play/"),
        );
        let http = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    fn url(&self, service: &str, method: &str) -> String {
        format!("{}/{service}/{method}/v0001/", self.base_url)
    }

    async fn get(&self, method: &str, query: &[(&str, String)]) -> Result<RawReply, ApiError> {
        let response = self
            .http
            .get(self.url(TERRITORY_SERVICE, method))
            .query(query)
            .send()
            .await?;
        read_reply(response).await
    }

    async fn post(
        &self,
        service: &str,
        method: &str,
        form: &[(&str, String)],
    ) -> Result<RawReply, ApiError> {
        let response = self
            .http
            .post(self.url(service, method))
            .form(form)
            .send()
            .await?;
        read_reply(response).await
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    #[instrument(skip_all)]
    async fn player_info(&self, token: &str) -> ApiResult<PlayerInfo> {
        let raw = self
            .post(
                TERRITORY_SERVICE,
                "GetPlayerInfo",
                &[("access_token", token.to_string())],
            )
            .await?;
        decode::<PlayerInfoWire, _>(raw)
    }

    #[instrument(skip_all)]
    async fn planets(&self) -> ApiResult<Vec<Planet>> {
        let raw = self
            .get(
                "GetPlanets",
                &[
                    ("active_only", "1".to_string()),
                    ("language", self.language.clone()),
                ],
            )
            .await?;
        decode_with(raw, |planets: PlanetsWire| {
            planets
                .planets
                .into_iter()
                .map(|planet| planet.into_planet())
                .collect()
        })
    }

    #[instrument(skip(self))]
    async fn planet(&self, planet_id: u32) -> ApiResult<Planet> {
        let raw = self
            .get(
                "GetPlanet",
                &[
                    ("id", planet_id.to_string()),
                    ("language", self.language.clone()),
                ],
            )
            .await?;
        let mut reply = decode_with(raw, |planets: PlanetsWire| {
            planets
                .planets
                .into_iter()
                .next()
                .map(|planet| planet.into_planet())
        })?;
        let payload = reply.payload.take().flatten();
        if payload.is_none() && reply.code.is_ok() {
            warn!(planet_id, "planet missing from response");
            return Ok(ApiReply::code(ResultCode::bad_response()));
        }
        Ok(ApiReply {
            code: reply.code,
            payload,
        })
    }

    #[instrument(skip(self, token))]
    async fn join_planet(&self, token: &str, planet_id: u32) -> ApiResult<()> {
        let raw = self
            .post(
                TERRITORY_SERVICE,
                "JoinPlanet",
                &[
                    ("access_token", token.to_string()),
                    ("id", planet_id.to_string()),
                ],
            )
            .await?;
        Ok(code_only(raw))
    }

    #[instrument(skip(self, token))]
    async fn leave_game(&self, token: &str, game_id: u32) -> ApiResult<()> {
        let raw = self
            .post(
                MINIGAME_SERVICE,
                "LeaveGame",
                &[
                    ("access_token", token.to_string()),
                    ("gameid", game_id.to_string()),
                ],
            )
            .await?;
        Ok(code_only(raw))
    }

    #[instrument(skip(self, token))]
    async fn join_zone(&self, token: &str, position: u32) -> ApiResult<()> {
        let raw = self
            .post(
                TERRITORY_SERVICE,
                "JoinZone",
                &[
                    ("access_token", token.to_string()),
                    ("zone_position", position.to_string()),
                ],
            )
            .await?;
        Ok(code_only(raw))
    }

    #[instrument(skip(self, token))]
    async fn join_boss_zone(&self, token: &str, position: u32) -> ApiResult<BossJoin> {
        let raw = self
            .post(
                TERRITORY_SERVICE,
                "JoinBossZone",
                &[
                    ("access_token", token.to_string()),
                    ("zone_position", position.to_string()),
                ],
            )
            .await?;
        decode::<BossJoinWire, _>(raw)
    }

    #[instrument(skip(self, token))]
    async fn report_score(&self, token: &str, score: u32) -> ApiResult<ScoreReport> {
        let raw = self
            .post(
                TERRITORY_SERVICE,
                "ReportScore",
                &[
                    ("access_token", token.to_string()),
                    ("score", score.to_string()),
                    ("language", self.language.clone()),
                ],
            )
            .await?;
        decode::<ScoreReportWire, _>(raw)
    }

    #[instrument(skip(self, token))]
    async fn report_boss_damage(&self, token: &str, round: BossRound) -> ApiResult<BossRoundUpdate> {
        let raw = self
            .post(
                TERRITORY_SERVICE,
                "ReportBossDamage",
                &[
                    ("access_token", token.to_string()),
                    ("use_heal_ability", u8::from(round.use_heal_ability).to_string()),
                    ("damage_to_boss", round.damage_to_boss.to_string()),
                    ("damage_taken", round.damage_taken.to_string()),
                ],
            )
            .await?;
        decode::<BossRoundWire, _>(raw)
    }
}

/// Read status, result header and body. Rejected credentials are the only
/// HTTP status surfaced as an error; everything else becomes a result code.
async fn read_reply(response: Response) -> Result<RawReply, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized {
            status: status.as_u16(),
        });
    }
    let code = result_code(response.headers(), status);
    let body = response.text().await?;
    debug!(status = status.as_u16(), %code, bytes = body.len(), "response received");
    Ok(RawReply { code, body })
}

fn result_code(headers: &HeaderMap, status: StatusCode) -> ResultCode {
    let header = headers
        .get(ERESULT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i32>().ok());
    match header {
        Some(raw) => ResultCode::from_raw(raw),
        None if status.is_success() => ResultCode::Ok,
        None => ResultCode::bad_response(),
    }
}

fn code_only(raw: RawReply) -> ApiReply<()> {
    ApiReply {
        code: raw.code,
        payload: Some(()),
    }
}

fn decode<W, T>(raw: RawReply) -> ApiResult<T>
where
    W: DeserializeOwned,
    T: From<W>,
{
    decode_with(raw, T::from)
}

/// Decode the `response` object. A body that cannot be parsed is only an
/// error when the service claimed success.
fn decode_with<W, T, F>(raw: RawReply, convert: F) -> ApiResult<T>
where
    W: DeserializeOwned,
    F: FnOnce(W) -> T,
{
    match serde_json::from_str::<Envelope<W>>(&raw.body) {
        Ok(envelope) => Ok(ApiReply {
            code: raw.code,
            payload: envelope.response.map(convert),
        }),
        Err(err) if raw.code.is_ok() => Err(ApiError::Decode(err)),
        Err(_) => Ok(ApiReply::code(raw.code)),
    }
}
