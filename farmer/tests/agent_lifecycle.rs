//! Agent-level lifecycle tests.
//!
//! These drive `AccountAgent::step` (and `run`) against a scripted game API on
//! a paused tokio clock, so holds and cooldowns complete instantly while
//! elapsed time is still observable.

use std::sync::Arc;
use std::time::Duration;

use farmer::agent::{AccountAgent, AgentError, Phase};
use farmer::coordinator::Coordinator;
use farmer::core::result_code::ResultCode;
use farmer::io::api::ApiReply;
use farmer::io::config::FarmConfig;
use farmer::io::events::{Severity, Stage};
use farmer::test_support::{
    ApiCall, RecordingSink, ScriptedGameApi, boss_update, boss_zone, normal_zone, planet,
    session, target,
};
use tokio::time::{Instant, sleep, timeout};

struct Harness {
    api: Arc<ScriptedGameApi>,
    sink: Arc<RecordingSink>,
    coordinator: Coordinator,
}

impl Harness {
    fn new(planets: Vec<farmer::core::types::Planet>) -> Self {
        Self {
            api: Arc::new(ScriptedGameApi::new(planets)),
            sink: Arc::new(RecordingSink::new()),
            coordinator: Coordinator::new(true),
        }
    }

    fn agent(&self, config: FarmConfig) -> AccountAgent<ScriptedGameApi> {
        AccountAgent::new(
            self.api.clone(),
            session("alice", Some(42)),
            self.sink.clone(),
            self.coordinator.reader(),
            config,
        )
    }
}

fn two_planets() -> Vec<farmer::core::types::Planet> {
    vec![
        planet(1, "A", vec![normal_zone(1, 4, 1, 5.0)]),
        planet(2, "B", vec![normal_zone(2, 7, 3, 2.0)]),
    ]
}

/// Single pass through the loop:
/// 1. CheckingPriorWork → SelectingWork (nothing to leave)
/// 2. SelectingWork → JoiningPlanet(B), the only difficulty-3 zone
/// 3. JoiningPlanet → JoiningWork
/// 4. JoiningWork → Working
/// 5. Working holds the full 110 seconds → Reporting
/// 6. Reporting sends 2400 → SelectingWork
#[tokio::test(start_paused = true)]
async fn selects_joins_holds_and_reports_hardest_zone() {
    let harness = Harness::new(two_planets());
    let mut agent = harness.agent(FarmConfig::default());

    let phase = agent.step(Phase::CheckingPriorWork).await.expect("check");
    assert_eq!(phase, Phase::SelectingWork);

    let phase = agent.step(phase).await.expect("select");
    let Phase::JoiningPlanet(goal) = &phase else {
        panic!("expected JoiningPlanet, got {phase:?}");
    };
    assert_eq!(goal.planet_id, 2);
    assert_eq!(goal.zone.position, 7);

    let phase = agent.step(phase).await.expect("join planet");
    assert!(matches!(phase, Phase::JoiningWork(_)));
    let phase = agent.step(phase).await.expect("join zone");
    assert!(matches!(phase, Phase::Working(_)));

    let started = Instant::now();
    let phase = agent.step(phase).await.expect("work");
    assert!(matches!(phase, Phase::Reporting(_)));
    assert_eq!(started.elapsed(), Duration::from_secs(110));

    let phase = agent.step(phase).await.expect("report");
    assert_eq!(phase, Phase::SelectingWork);

    assert_eq!(harness.api.score_reports(), vec![2400]);
    let calls = harness.api.calls();
    assert!(calls.contains(&ApiCall::JoinPlanet(2)));
    assert!(calls.contains(&ApiCall::JoinZone(7)));
    assert_eq!(agent.tally().score, Some(2400));
    assert_eq!(
        harness
            .sink
            .matching(Stage::Reporting, Severity::Success)
            .len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn expired_zone_reselects_without_cooldown() {
    let harness = Harness::new(two_planets());
    harness.api.push_join_zone(ResultCode::Expired);
    let mut agent = harness.agent(FarmConfig::default());

    let started = Instant::now();
    let phase = agent
        .step(Phase::JoiningWork(target(2, normal_zone(2, 7, 3, 2.0))))
        .await
        .expect("join zone");

    assert_eq!(phase, Phase::SelectingWork);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(
        harness
            .sink
            .matching(Stage::JoiningWork, Severity::Warning)
            .len(),
        1
    );
    assert_eq!(harness.api.calls(), vec![ApiCall::JoinZone(7)]);
}

#[tokio::test(start_paused = true)]
async fn no_match_report_earns_nothing() {
    let harness = Harness::new(two_planets());
    harness
        .api
        .push_report_score(ApiReply::code(ResultCode::NoMatch));
    let mut agent = harness.agent(FarmConfig::default());

    let started = Instant::now();
    let phase = agent
        .step(Phase::Reporting(target(2, normal_zone(2, 7, 3, 2.0))))
        .await
        .expect("report");

    assert_eq!(phase, Phase::SelectingWork);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(agent.tally().score, None);
    assert_eq!(
        harness
            .sink
            .matching(Stage::Reporting, Severity::Warning)
            .len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn transient_report_failure_cools_down() {
    let harness = Harness::new(two_planets());
    harness
        .api
        .push_report_score(ApiReply::code(ResultCode::Transient(2)));
    let mut agent = harness.agent(FarmConfig::default());

    let started = Instant::now();
    let phase = agent
        .step(Phase::Reporting(target(2, normal_zone(2, 7, 3, 2.0))))
        .await
        .expect("report");

    assert_eq!(phase, Phase::SelectingWork);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    assert_eq!(
        harness.sink.matching(Stage::Reporting, Severity::Error).len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn harder_signal_ends_hold_without_report() {
    let harness = Harness::new(two_planets());
    let mut agent = harness.agent(FarmConfig::default());
    let coordinator = harness.coordinator.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(30)).await;
        coordinator.publish(Some(target(5, normal_zone(5, 1, 3, 0.5))));
    });

    let started = Instant::now();
    let phase = agent
        .step(Phase::Working(target(1, normal_zone(1, 4, 2, 5.0))))
        .await
        .expect("work");

    assert_eq!(phase, Phase::SelectingWork);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30));
    assert!(elapsed <= Duration::from_secs(31));
    assert!(harness.api.score_reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn equal_difficulty_signal_does_not_end_hold() {
    let harness = Harness::new(two_planets());
    let mut agent = harness.agent(FarmConfig::default());
    harness
        .coordinator
        .publish(Some(target(5, normal_zone(5, 1, 2, 0.5))));

    let phase = agent
        .step(Phase::Working(target(1, normal_zone(1, 4, 2, 5.0))))
        .await
        .expect("work");
    assert!(matches!(phase, Phase::Reporting(_)));
}

#[tokio::test(start_paused = true)]
async fn boss_signal_preempts_only_when_bosses_are_supported() {
    let harness = Harness::new(two_planets());
    let held = target(2, normal_zone(2, 7, 3, 2.0));
    let mut with_bosses = harness.agent(FarmConfig::default());
    let mut config = FarmConfig::default();
    config.farm.supports_boss_encounters = false;
    let mut without_bosses = harness.agent(config);
    harness
        .coordinator
        .publish(Some(target(4, boss_zone(4, 12, 0.5))));

    let phase = with_bosses
        .step(Phase::Working(held.clone()))
        .await
        .expect("work");
    assert_eq!(phase, Phase::SelectingWork);

    let phase = without_bosses
        .step(Phase::Working(held))
        .await
        .expect("work");
    assert!(matches!(phase, Phase::Reporting(_)));
}

/// A signal that was already published when the agent selected is not a
/// reason to abandon the zone it picked from a newer snapshot.
#[tokio::test(start_paused = true)]
async fn signal_older_than_selection_does_not_end_hold() {
    let harness = Harness::new(vec![planet(1, "A", vec![normal_zone(1, 4, 1, 5.0)])]);
    let mut agent = harness.agent(FarmConfig::default());
    // Captured since the last probe, so absent from the snapshot.
    harness
        .coordinator
        .publish(Some(target(9, normal_zone(9, 0, 3, 0.5))));

    let started = Instant::now();
    let mut phase = Phase::SelectingWork;
    for _ in 0..10 {
        phase = agent.step(phase).await.expect("step");
    }

    assert_eq!(phase, Phase::SelectingWork);
    assert_eq!(harness.api.score_reports(), vec![600, 600]);
    let joins = harness
        .api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, ApiCall::JoinZone(_)))
        .count();
    assert_eq!(joins, 2);
    assert_eq!(started.elapsed(), Duration::from_secs(220));
}

/// Each publish preempts at most once: the prober re-announcing the same
/// zone after the agent has reselected leaves the next hold alone.
#[tokio::test(start_paused = true)]
async fn repeated_signal_preempts_only_once() {
    let harness = Harness::new(vec![planet(1, "A", vec![normal_zone(1, 4, 1, 5.0)])]);
    let mut agent = harness.agent(FarmConfig::default());
    let coordinator = harness.coordinator.clone();
    tokio::spawn(async move {
        for gap in [10, 20, 20] {
            sleep(Duration::from_secs(gap)).await;
            coordinator.publish(Some(target(9, normal_zone(9, 0, 3, 0.5))));
        }
    });

    let mut phase = Phase::SelectingWork;
    let mut preempted = 0;
    while harness.api.score_reports().is_empty() {
        let next = agent.step(phase.clone()).await.expect("step");
        if matches!(phase, Phase::Working(_)) && next == Phase::SelectingWork {
            preempted += 1;
        }
        phase = next;
    }

    assert_eq!(preempted, 1);
    assert_eq!(harness.api.score_reports(), vec![600]);
    assert_eq!(
        harness
            .sink
            .matching(Stage::Working, Severity::Info)
            .iter()
            .filter(|event| event.message.starts_with("Abandoning"))
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn refused_zone_join_cools_down_and_reselects() {
    let harness = Harness::new(two_planets());
    harness.api.push_join_zone(ResultCode::Transient(2));
    let mut agent = harness.agent(FarmConfig::default());

    let started = Instant::now();
    let phase = agent
        .step(Phase::JoiningWork(target(2, normal_zone(2, 7, 3, 2.0))))
        .await
        .expect("join zone");

    assert_eq!(phase, Phase::SelectingWork);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    assert_eq!(
        harness
            .sink
            .matching(Stage::JoiningWork, Severity::Error)
            .len(),
        1
    );
    assert_eq!(agent.tally().active_zone, None);
    assert!(harness.api.score_reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn boss_zone_runs_encounter_then_reselects() {
    let harness = Harness::new(vec![planet(4, "D", vec![boss_zone(4, 12, 0.5)])]);
    harness.api.push_boss_round(boss_update(42, 50, false));
    harness.api.push_boss_round(boss_update(42, 300, true));
    let mut agent = harness.agent(FarmConfig::default());

    let phase = agent.step(Phase::SelectingWork).await.expect("select");
    let phase = agent.step(phase).await.expect("join planet");
    let phase = agent.step(phase).await.expect("boss");

    assert_eq!(phase, Phase::SelectingWork);
    assert!(harness.api.calls().contains(&ApiCall::JoinBossZone(12)));
    assert_eq!(harness.api.boss_rounds().len(), 2);
    assert!(harness.api.score_reports().is_empty());
    let finished = harness
        .sink
        .matching(Stage::BossEncounter, Severity::Success);
    assert!(finished.iter().any(|event| event.message.contains("250")));
}

#[tokio::test(start_paused = true)]
async fn unauthorized_is_fatal() {
    let harness = Harness::new(two_planets());
    harness.api.push_player_info_unauthorized();
    let agent = harness.agent(FarmConfig::default());

    let err = agent.run().await.unwrap_err();

    let AgentError::Fatal { account, reason } = err;
    assert_eq!(account, "alice");
    assert!(reason.contains("http 401"));
    assert_eq!(
        harness.sink.matching(Stage::Stopped, Severity::Error).len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn transport_errors_retry_after_cooldown() {
    let harness = Harness::new(two_planets());
    harness.api.push_player_info_broken("connection reset");
    let mut agent = harness.agent(FarmConfig::default());

    let started = Instant::now();
    let phase = agent.step(Phase::CheckingPriorWork).await.expect("check");

    assert_eq!(phase, Phase::CheckingPriorWork);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    let phase = agent.step(phase).await.expect("check");
    assert_eq!(phase, Phase::SelectingWork);
}

/// Two full hold cycles fit into 250 seconds; the planet is joined once and
/// reused for the second zone.
#[tokio::test(start_paused = true)]
async fn run_keeps_farming() {
    let harness = Harness::new(two_planets());
    let agent = harness.agent(FarmConfig::default());

    let result = timeout(Duration::from_secs(250), agent.run()).await;

    assert!(result.is_err(), "agent should still be running");
    assert_eq!(harness.api.score_reports(), vec![2400, 2400]);
    let joins = harness
        .api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, ApiCall::JoinPlanet(_)))
        .count();
    assert_eq!(joins, 1);
}
