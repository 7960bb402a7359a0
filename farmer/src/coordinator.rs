//! Fleet-wide "best known zone" signal.
//!
//! The [`Coordinator`] owns a single-slot watch channel. One prober at a time
//! writes it; every agent holds a [`SignalReader`] and peeks at the latest
//! value during its hold. Last write wins and readers never wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::probe::{ProbeRotation, probe_period};
use crate::core::selector::SelectOptions;
use crate::core::types::Target;
use crate::io::api::GameApi;
use crate::io::config::FarmConfig;
use crate::select::discover;

#[derive(Clone)]
pub struct Coordinator {
    tx: Arc<watch::Sender<Option<Target>>>,
    clear_on_empty_probe: bool,
}

impl Coordinator {
    pub fn new(clear_on_empty_probe: bool) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            clear_on_empty_probe,
        }
    }

    pub fn reader(&self) -> SignalReader {
        SignalReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Replace the signal.
    ///
    /// Readers are only notified when the named zone changes; re-publishing
    /// the same zone refreshes its details silently.
    pub fn publish(&self, target: Option<Target>) {
        self.tx.send_if_modified(|slot| {
            let changed = !same_zone(slot.as_ref(), target.as_ref());
            *slot = target;
            changed
        });
    }

    /// Publish the result of a probe, honouring the empty-probe policy.
    pub fn publish_probe(&self, found: Option<Target>) {
        match found {
            Some(target) => self.publish(Some(target)),
            None if self.clear_on_empty_probe => self.publish(None),
            None => debug!("empty probe, keeping previous signal"),
        }
    }

    pub fn latest(&self) -> Option<Target> {
        self.tx.borrow().clone()
    }
}

fn same_zone(a: Option<&Target>, b: Option<&Target>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.planet_id == b.planet_id
                && a.zone.position == b.zone.position
                && a.zone.kind == b.zone.kind
        }
        _ => false,
    }
}

/// Read side of the coordinator signal, one per agent.
#[derive(Clone)]
pub struct SignalReader {
    rx: watch::Receiver<Option<Target>>,
}

impl SignalReader {
    /// Most recently published target, if any.
    pub fn latest(&self) -> Option<Target> {
        self.rx.borrow().clone()
    }

    /// Treat everything published so far as already seen.
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// The target published since the last look, if any, marking it seen.
    pub fn fresh(&mut self) -> Option<Target> {
        match self.rx.has_changed() {
            Ok(true) => self.rx.borrow_and_update().clone(),
            _ => None,
        }
    }
}

/// An agent the prober role can rotate onto.
///
/// Probing reads public planet data, so every slot may share one API client;
/// the rotation decides whose turn it is and how many agents the probe
/// cycle is spread over. A retired slot (its agent stopped) is skipped.
pub struct ProbeSlot<A> {
    pub name: String,
    pub api: Arc<A>,
    pub retired: Arc<AtomicBool>,
}

impl<A> ProbeSlot<A> {
    pub fn new(name: impl Into<String>, api: Arc<A>) -> Self {
        Self {
            name: name.into(),
            api,
            retired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_live(&self) -> bool {
        !self.retired.load(Ordering::Relaxed)
    }
}

/// Refresh the signal, rotating the prober role through the live `slots`.
///
/// One probe runs per period, where the period spreads a full rotation of
/// the live slots over `timings.probe_cycle_secs`. Failed probes publish
/// nothing. Returns once every slot has retired.
pub async fn run_prober<A: GameApi>(
    coordinator: Coordinator,
    slots: Vec<ProbeSlot<A>>,
    config: &FarmConfig,
) {
    let options = SelectOptions {
        include_boss: config.farm.supports_boss_encounters,
    };
    let mut rotation = ProbeRotation::new(slots.len());
    info!(probers = slots.len(), "prober started");

    loop {
        let Some(index) = rotation.advance_live(|index| slots[index].is_live()) else {
            info!("no live probers left");
            return;
        };
        let slot = &slots[index];
        match discover(slot.api.as_ref(), options).await {
            Ok(found) => {
                debug!(prober = %slot.name, found = ?found.as_ref().map(ToString::to_string), "probe finished");
                coordinator.publish_probe(found);
            }
            Err(err) => warn!(prober = %slot.name, error = %err, "probe failed"),
        }
        let live = slots.iter().filter(|slot| slot.is_live()).count();
        sleep(probe_period(config.timings.probe_cycle(), live)).await;
    }
}
