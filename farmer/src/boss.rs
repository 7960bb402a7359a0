//! Boss encounter sub-machine.
//!
//! Entered once the agent has committed to a planet with an active boss zone.
//! Joins the boss zone, then reports one damage round per `boss_round`
//! interval until the fight is over, the service says the fight is gone, or
//! too many rounds in a row fail.

use tokio::time::sleep;
use tracing::debug;

use crate::agent::{AgentError, settle};
use crate::core::boss::{FailureBudget, HealCadence, bonus_xp};
use crate::core::result_code::ResultCode;
use crate::core::types::{AccountSession, BossPlayer, BossRoundUpdate, Target};
use crate::io::api::{BossRound, GameApi};
use crate::io::config::FarmConfig;
use crate::io::events::{EventLog, Stage};

/// How an encounter ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterOutcome {
    /// JoinBossZone was refused.
    JoinFailed(ResultCode),
    /// The fight reached game over. `bonus_xp` is known when this account
    /// appeared in the roster both before and at game over.
    Finished { bonus_xp: Option<u64> },
    /// The service no longer knows the fight.
    Ended,
    /// Too many consecutive failed rounds.
    Aborted { failures: u32 },
}

pub struct BossEncounter<'a, A: ?Sized> {
    api: &'a A,
    session: &'a AccountSession,
    events: &'a EventLog<'a>,
    config: &'a FarmConfig,
}

impl<'a, A: GameApi + ?Sized> BossEncounter<'a, A> {
    pub fn new(
        api: &'a A,
        session: &'a AccountSession,
        events: &'a EventLog<'a>,
        config: &'a FarmConfig,
    ) -> Self {
        Self {
            api,
            session,
            events,
            config,
        }
    }

    pub async fn run(&self, target: &Target) -> Result<EncounterOutcome, AgentError> {
        let stage = Stage::BossEncounter;
        let position = target.zone.position;
        self.events
            .info(stage, format!("Joining boss zone {position}..."));
        let reply = settle(
            &self.session.name,
            "JoinBossZone",
            self.api.join_boss_zone(&self.session.token, position).await,
        )?;
        let code = reply.code;
        let Some(joined) = reply.into_ok() else {
            self.events.error(
                stage,
                format!(
                    "Error joining boss zone: {code}, retrying in {} seconds...",
                    self.config.timings.cooldown_secs
                ),
            );
            sleep(self.config.timings.cooldown()).await;
            return Ok(EncounterOutcome::JoinFailed(code));
        };
        self.events.success(stage, "Joined boss zone!");
        if joined.waiting_for_players {
            self.events.info(stage, "Waiting for players...");
        }

        self.fight().await
    }

    async fn fight(&self) -> Result<EncounterOutcome, AgentError> {
        let stage = Stage::BossEncounter;
        let farm = &self.config.farm;
        let mut cadence = HealCadence::new();
        let mut budget = FailureBudget::new(farm.boss_failure_tolerance);
        let mut last_xp: Option<u64> = None;
        let mut waiting = false;

        loop {
            let contribution = cadence.next_round(farm.boss_damage_per_round);
            let round = BossRound {
                use_heal_ability: contribution.use_heal(),
                damage_to_boss: contribution.damage_to_boss(),
                damage_taken: 0,
            };
            let reply = settle(
                &self.session.name,
                "ReportBossDamage",
                self.api
                    .report_boss_damage(&self.session.token, round)
                    .await,
            )?;

            match reply.code {
                ResultCode::InvalidState => {
                    self.events.info(stage, "The boss fight is no longer running.");
                    return Ok(EncounterOutcome::Ended);
                }
                ResultCode::Ok => {
                    budget.record_success();
                    let update = reply.payload.unwrap_or_default();
                    if update.game_over {
                        let bonus = self.bonus(&update, last_xp);
                        let message = match bonus {
                            Some(bonus) => format!("Boss defeated! Bonus XP: {bonus}"),
                            None => "Boss fight is over!".to_string(),
                        };
                        self.events.success(stage, message);
                        return Ok(EncounterOutcome::Finished { bonus_xp: bonus });
                    }
                    match &update.status {
                        Some(status) if !update.waiting_for_players => {
                            if waiting {
                                self.events.info(stage, "Boss fight started.");
                                waiting = false;
                            }
                            if let Some(me) = self.me(&update) {
                                last_xp = Some(me.xp_earned);
                            }
                            debug!(
                                account = %self.session.name,
                                boss_hp = status.boss_hp,
                                boss_max_hp = status.boss_max_hp,
                                heal = round.use_heal_ability,
                                "boss round reported"
                            );
                        }
                        _ => {
                            if !waiting {
                                self.events.info(stage, "Waiting for players...");
                                waiting = true;
                            }
                        }
                    }
                }
                code => {
                    if budget.record_failure() {
                        self.events.error(
                            stage,
                            format!(
                                "Giving up on boss fight after {} failed rounds (last: {code})",
                                budget.consecutive()
                            ),
                        );
                        return Ok(EncounterOutcome::Aborted {
                            failures: budget.consecutive(),
                        });
                    }
                    self.events.warning(
                        stage,
                        format!(
                            "Error reporting boss damage: {code} ({} of {} tolerated)",
                            budget.consecutive(),
                            farm.boss_failure_tolerance
                        ),
                    );
                }
            }

            sleep(self.config.timings.boss_round()).await;
        }
    }

    fn me<'u>(&self, update: &'u BossRoundUpdate) -> Option<&'u BossPlayer> {
        let account_id = self.session.account_id?;
        update.status.as_ref()?.player(account_id)
    }

    fn bonus(&self, update: &BossRoundUpdate, last_xp: Option<u64>) -> Option<u64> {
        let final_xp = self.me(update)?.xp_earned;
        Some(bonus_xp(final_xp, last_xp?))
    }
}
