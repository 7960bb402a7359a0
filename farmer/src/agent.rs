//! Per-account farming agent.
//!
//! One [`AccountAgent`] drives one account through
//! select → join → work → report → reselect, forever. Transient failures are
//! retried after a cooldown; authoritative rejections reselect immediately.
//! The only way out of the loop is an [`AgentError::Fatal`].

use std::sync::Arc;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::boss::BossEncounter;
use crate::coordinator::SignalReader;
use crate::core::result_code::ResultCode;
use crate::core::score::score_for_difficulty;
use crate::core::selector::{SelectOptions, outranks};
use crate::core::types::{AccountSession, SessionTally, Target, Zone, ZoneKind};
use crate::io::accounts::check_credentials;
use crate::io::api::{ApiError, ApiReply, ApiResult, GameApi};
use crate::io::config::FarmConfig;
use crate::io::events::{EventLog, EventSink, Stage};
use crate::select::discover;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("account {account}: {reason}")]
    Fatal { account: String, reason: String },
}

/// Where an agent is in its loop. Phases past selection carry their target.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    CheckingPriorWork,
    SelectingWork,
    JoiningPlanet(Target),
    JoiningWork(Target),
    Working(Target),
    Reporting(Target),
}

impl Phase {
    pub fn stage(&self) -> Stage {
        match self {
            Self::CheckingPriorWork => Stage::CheckingPriorWork,
            Self::SelectingWork => Stage::SelectingWork,
            Self::JoiningPlanet(_) => Stage::JoiningPlanet,
            Self::JoiningWork(_) => Stage::JoiningWork,
            Self::Working(_) => Stage::Working,
            Self::Reporting(_) => Stage::Reporting,
        }
    }
}

/// Fold a transport result into a reply.
///
/// Unauthorized is fatal; every other transport error is logged and becomes
/// a `BadResponse` reply so callers only ever branch on result codes.
pub(crate) fn settle<T>(
    account: &str,
    operation: &str,
    result: ApiResult<T>,
) -> Result<ApiReply<T>, AgentError> {
    match result {
        Ok(reply) => Ok(reply),
        Err(ApiError::Unauthorized { status }) => Err(AgentError::Fatal {
            account: account.to_string(),
            reason: format!("{operation}: credentials rejected (http {status})"),
        }),
        Err(err) => {
            warn!(%account, operation, error = %err, "request failed");
            Ok(ApiReply::code(ResultCode::bad_response()))
        }
    }
}

enum HoldOutcome {
    Completed,
    Preempted(Target),
}

pub struct AccountAgent<A> {
    api: Arc<A>,
    session: AccountSession,
    tally: SessionTally,
    sink: Arc<dyn EventSink>,
    signal: SignalReader,
    config: FarmConfig,
}

impl<A: GameApi> AccountAgent<A> {
    pub fn new(
        api: Arc<A>,
        session: AccountSession,
        sink: Arc<dyn EventSink>,
        signal: SignalReader,
        config: FarmConfig,
    ) -> Self {
        Self {
            api,
            session,
            tally: SessionTally::default(),
            sink,
            signal,
            config,
        }
    }

    pub fn session(&self) -> &AccountSession {
        &self.session
    }

    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    fn events(&self) -> EventLog<'_> {
        EventLog::new(&self.session.name, self.sink.as_ref())
    }

    fn options(&self) -> SelectOptions {
        SelectOptions {
            include_boss: self.config.farm.supports_boss_encounters,
        }
    }

    fn fatal(&self, reason: impl Into<String>) -> AgentError {
        AgentError::Fatal {
            account: self.session.name.clone(),
            reason: reason.into(),
        }
    }

    /// Run until a fatal error stops the agent.
    #[instrument(skip_all, fields(account = %self.session.name))]
    pub async fn run(mut self) -> Result<(), AgentError> {
        if let Err(err) = check_credentials(&self.session) {
            let err = self.fatal(format!("{err:#}"));
            self.events().error(Stage::Stopped, err.to_string());
            return Err(err);
        }
        self.events().info(Stage::Starting, "Starting");

        let mut phase = Phase::CheckingPriorWork;
        loop {
            debug!(stage = %phase.stage(), "entering phase");
            phase = match self.step(phase).await {
                Ok(next) => next,
                Err(err) => {
                    self.events().error(Stage::Stopped, err.to_string());
                    return Err(err);
                }
            };
        }
    }

    /// Execute one phase and return the next.
    pub async fn step(&mut self, phase: Phase) -> Result<Phase, AgentError> {
        match phase {
            Phase::CheckingPriorWork => self.check_prior_work().await,
            Phase::SelectingWork => self.select_work().await,
            Phase::JoiningPlanet(target) => self.join_planet(target).await,
            Phase::JoiningWork(target) => self.join_work(target).await,
            Phase::Working(target) => self.work(target).await,
            Phase::Reporting(target) => self.report(target).await,
        }
    }

    async fn cooldown(&self) {
        sleep(self.config.timings.cooldown()).await;
    }

    fn retry_note(&self) -> String {
        format!("retrying in {} seconds...", self.config.timings.cooldown_secs)
    }

    async fn check_prior_work(&mut self) -> Result<Phase, AgentError> {
        let stage = Stage::CheckingPriorWork;
        let reply = settle(
            &self.session.name,
            "GetPlayerInfo",
            self.api.player_info(&self.session.token).await,
        )?;
        let code = reply.code;
        let Some(player) = reply.into_ok() else {
            self.events().error(
                stage,
                format!("Failed getting player info: {code}, {}", self.retry_note()),
            );
            self.cooldown().await;
            return Ok(Phase::CheckingPriorWork);
        };

        self.tally.score = Some(player.score);
        self.tally.level = Some(player.level);
        self.tally.next_level_score = player.next_level_score;
        self.tally.active_planet = player.active_planet;
        self.tally.active_zone = player.active_zone_position;
        self.events().info(
            stage,
            format!("Level {}, score {}", player.level, player.score),
        );

        for (what, game_id) in [
            ("zone", player.active_zone_game),
            ("boss zone", player.active_boss_game),
            ("planet", player.active_planet),
        ] {
            let Some(game_id) = game_id else { continue };
            if !self.leave(stage, what, game_id).await? {
                self.cooldown().await;
                return Ok(Phase::CheckingPriorWork);
            }
        }
        self.tally.active_zone = None;
        self.tally.active_planet = None;
        Ok(Phase::SelectingWork)
    }

    /// Leave one game; false when the service refused.
    async fn leave(&self, stage: Stage, what: &str, game_id: u32) -> Result<bool, AgentError> {
        self.events()
            .info(stage, format!("Leaving active {what} {game_id}..."));
        let reply = settle(
            &self.session.name,
            "LeaveGame",
            self.api.leave_game(&self.session.token, game_id).await,
        )?;
        if reply.code.is_ok() {
            self.events().success(stage, format!("Left {what} {game_id}"));
            Ok(true)
        } else {
            self.events().error(
                stage,
                format!(
                    "Error leaving {what} {game_id}: {}, {}",
                    reply.code,
                    self.retry_note()
                ),
            );
            Ok(false)
        }
    }

    async fn select_work(&mut self) -> Result<Phase, AgentError> {
        let stage = Stage::SelectingWork;
        self.events().info(stage, "Finding planet and zone to join...");
        // Our own snapshot supersedes whatever the prober published so far.
        self.signal.mark_seen();
        match discover(self.api.as_ref(), self.options()).await {
            Ok(Some(target)) => {
                self.events().success(stage, format!("Found {target}"));
                Ok(Phase::JoiningPlanet(target))
            }
            Ok(None) => {
                self.events().info(
                    stage,
                    format!("No zone to join, {}", self.retry_note()),
                );
                self.cooldown().await;
                Ok(Phase::SelectingWork)
            }
            Err(err) => {
                self.events().error(
                    stage,
                    format!("Failed fetching planets: {err}, {}", self.retry_note()),
                );
                self.cooldown().await;
                Ok(Phase::SelectingWork)
            }
        }
    }

    async fn join_planet(&mut self, target: Target) -> Result<Phase, AgentError> {
        let stage = Stage::JoiningPlanet;
        let planet_id = target.planet_id;
        match self.tally.active_planet {
            Some(current) if current == planet_id => {
                self.events()
                    .info(stage, format!("Already on planet {planet_id}"));
                return Ok(Phase::JoiningWork(target));
            }
            Some(current) => {
                if !self.leave(stage, "planet", current).await? {
                    self.cooldown().await;
                    return Ok(Phase::SelectingWork);
                }
                self.tally.active_planet = None;
                self.tally.active_zone = None;
            }
            None => {}
        }

        self.events().info(
            stage,
            format!("Joining planet {planet_id} ({})...", target.planet_name),
        );
        let reply = settle(
            &self.session.name,
            "JoinPlanet",
            self.api.join_planet(&self.session.token, planet_id).await,
        )?;
        if reply.code.is_ok() {
            self.tally.active_planet = Some(planet_id);
            self.events()
                .success(stage, format!("Joined planet {planet_id}"));
            Ok(Phase::JoiningWork(target))
        } else {
            self.events().error(
                stage,
                format!("Error joining planet: {}, {}", reply.code, self.retry_note()),
            );
            self.cooldown().await;
            Ok(Phase::SelectingWork)
        }
    }

    async fn join_work(&mut self, target: Target) -> Result<Phase, AgentError> {
        if target.zone.kind == ZoneKind::Boss {
            return self.encounter(target).await;
        }

        let stage = Stage::JoiningWork;
        let position = target.zone.position;
        self.events().info(stage, format!("Joining zone {position}..."));
        let reply = settle(
            &self.session.name,
            "JoinZone",
            self.api.join_zone(&self.session.token, position).await,
        )?;
        match reply.code {
            ResultCode::Ok => {
                self.tally.active_zone = Some(position);
                self.events().success(stage, format!("Joined {target}"));
                Ok(Phase::Working(target))
            }
            ResultCode::Expired => {
                self.events().warning(
                    stage,
                    format!("Zone {position} was captured before we could join it"),
                );
                Ok(Phase::SelectingWork)
            }
            code => {
                self.events().error(
                    stage,
                    format!("Error joining zone: {code}, {}", self.retry_note()),
                );
                self.cooldown().await;
                Ok(Phase::SelectingWork)
            }
        }
    }

    async fn encounter(&mut self, target: Target) -> Result<Phase, AgentError> {
        let events = self.events();
        let outcome = BossEncounter::new(self.api.as_ref(), &self.session, &events, &self.config)
            .run(&target)
            .await?;
        info!(account = %self.session.name, ?outcome, "boss encounter finished");
        self.tally.active_zone = None;
        Ok(Phase::SelectingWork)
    }

    async fn work(&mut self, target: Target) -> Result<Phase, AgentError> {
        let stage = Stage::Working;
        self.events().info(
            stage,
            format!(
                "Holding zone {} for {} seconds",
                target.zone.position, self.config.timings.hold_secs
            ),
        );
        match self.hold(&target.zone).await {
            HoldOutcome::Completed => Ok(Phase::Reporting(target)),
            HoldOutcome::Preempted(better) => {
                self.events().info(
                    stage,
                    format!(
                        "Abandoning zone {} for {better}",
                        target.zone.position
                    ),
                );
                self.tally.active_zone = None;
                Ok(Phase::SelectingWork)
            }
        }
    }

    /// Sit on `held` for the hold duration, peeking at the coordinator
    /// signal every poll interval.
    ///
    /// Only signals published after the last selection count; each one is
    /// looked at once.
    async fn hold(&mut self, held: &Zone) -> HoldOutcome {
        let options = self.options();
        let timings = &self.config.timings;
        let deadline = Instant::now() + timings.hold();
        loop {
            if let Some(better) = self
                .signal
                .fresh()
                .filter(|candidate| outranks(&candidate.zone, held, options))
            {
                return HoldOutcome::Preempted(better);
            }
            let now = Instant::now();
            if now >= deadline {
                return HoldOutcome::Completed;
            }
            sleep(timings.poll().min(deadline - now)).await;
        }
    }

    async fn report(&mut self, target: Target) -> Result<Phase, AgentError> {
        let stage = Stage::Reporting;
        let Some(score) = score_for_difficulty(target.zone.difficulty) else {
            self.events().error(
                stage,
                format!("No score known for difficulty {}", target.zone.difficulty),
            );
            self.tally.active_zone = None;
            return Ok(Phase::SelectingWork);
        };

        self.events().info(stage, format!("Reporting score {score}..."));
        let reply = settle(
            &self.session.name,
            "ReportScore",
            self.api.report_score(&self.session.token, score).await,
        )?;
        self.tally.active_zone = None;
        match (reply.code, reply.payload) {
            (ResultCode::Ok, Some(report)) => {
                self.tally.score = Some(report.new_score);
                self.tally.level = Some(report.new_level);
                self.tally.next_level_score = report.next_level_score;
                let next = report
                    .next_level_score
                    .map(|next| next.to_string())
                    .unwrap_or_else(|| "-".to_string());
                self.events().success(
                    stage,
                    format!(
                        "Finished zone for {score} XP: score {} -> {}, level {} -> {}, next level at {next}",
                        report.old_score, report.new_score, report.old_level, report.new_level
                    ),
                );
                Ok(Phase::SelectingWork)
            }
            (ResultCode::Ok, None) => {
                self.events()
                    .success(stage, format!("Finished zone for {score} XP"));
                Ok(Phase::SelectingWork)
            }
            (ResultCode::NoMatch, _) => {
                self.events().warning(
                    stage,
                    "The zone was captured before we could report our score",
                );
                Ok(Phase::SelectingWork)
            }
            (code, _) => {
                self.events().error(
                    stage,
                    format!("Error reporting score: {code}, {}", self.retry_note()),
                );
                self.cooldown().await;
                Ok(Phase::SelectingWork)
            }
        }
    }
}
