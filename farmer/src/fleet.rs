//! Runs every account concurrently, plus the prober.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info};

use crate::agent::{AccountAgent, AgentError};
use crate::coordinator::{Coordinator, ProbeSlot, run_prober};
use crate::core::types::AccountSession;
use crate::io::api::GameApi;
use crate::io::config::FarmConfig;
use crate::io::events::EventSink;

/// Start one agent task per account and the prober task.
///
/// Agents start `spawn_stagger` apart. An agent that stops with a fatal
/// error is logged and leaves the probe rotation; the rest keep running.
/// Returns once every agent has stopped, with the errors that stopped them.
pub async fn run_fleet<A: GameApi + 'static>(
    api: Arc<A>,
    sessions: Vec<AccountSession>,
    sink: Arc<dyn EventSink>,
    config: FarmConfig,
) -> Vec<AgentError> {
    let coordinator = Coordinator::new(config.farm.clear_signal_on_empty_probe);
    let slots: Vec<ProbeSlot<A>> = sessions
        .iter()
        .map(|session| ProbeSlot::new(session.name.clone(), api.clone()))
        .collect();
    let retirements: Vec<_> = slots.iter().map(|slot| slot.retired.clone()).collect();
    let prober = tokio::spawn({
        let coordinator = coordinator.clone();
        let config = config.clone();
        async move { run_prober(coordinator, slots, &config).await }
    });

    info!(accounts = sessions.len(), "starting fleet");
    let stagger = config.timings.spawn_stagger();
    let mut agents = JoinSet::new();
    for (index, (session, retired)) in sessions.into_iter().zip(retirements).enumerate() {
        let delay = stagger * u32::try_from(index).unwrap_or(u32::MAX);
        let agent = AccountAgent::new(
            api.clone(),
            session,
            sink.clone(),
            coordinator.reader(),
            config.clone(),
        );
        agents.spawn(async move {
            sleep(delay).await;
            let result = agent.run().await;
            retired.store(true, Ordering::Relaxed);
            result
        });
    }

    let mut stopped = Vec::new();
    while let Some(joined) = agents.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(error = %err, "agent stopped");
                stopped.push(err);
            }
            Err(err) => error!(error = %err, "agent task panicked"),
        }
    }
    prober.abort();
    stopped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSink, ScriptedGameApi, session};

    #[tokio::test(start_paused = true)]
    async fn fatal_agents_stop_the_fleet_once_all_are_gone() {
        let api = Arc::new(ScriptedGameApi::new(Vec::new()));
        api.push_player_info_unauthorized();
        let mut broken = session("bob", None);
        broken.token = "xyz".to_string();
        let sink = Arc::new(RecordingSink::new());

        let errors = run_fleet(
            api.clone(),
            vec![session("alice", None), broken],
            sink,
            FarmConfig::default(),
        )
        .await;

        assert_eq!(errors.len(), 2);
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert!(messages.iter().any(|m| m.contains("alice") && m.contains("http 401")));
        assert!(messages.iter().any(|m| m.contains("bob")));
    }
}
