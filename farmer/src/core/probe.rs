//! Prober rotation schedule for the coordinator.

use std::time::Duration;

/// Shortest allowed gap between two probes.
pub const MIN_PROBE_PERIOD: Duration = Duration::from_secs(1);

/// Gap between probes so that a full rotation over `agents` takes `cycle`.
pub fn probe_period(cycle: Duration, agents: usize) -> Duration {
    let agents = u32::try_from(agents.max(1)).unwrap_or(u32::MAX);
    (cycle / agents).max(MIN_PROBE_PERIOD)
}

/// Round-robin choice of the agent that performs the next probe.
#[derive(Debug, Clone)]
pub struct ProbeRotation {
    agents: usize,
    next: usize,
}

impl ProbeRotation {
    pub fn new(agents: usize) -> Self {
        Self { agents, next: 0 }
    }

    /// Index of the agent whose turn it is, or `None` for an empty fleet.
    pub fn advance(&mut self) -> Option<usize> {
        if self.agents == 0 {
            return None;
        }
        let current = self.next;
        self.next = (self.next + 1) % self.agents;
        Some(current)
    }

    /// Like [`advance`](Self::advance), skipping agents for which `live`
    /// returns false. `None` once no agent is live.
    pub fn advance_live(&mut self, live: impl Fn(usize) -> bool) -> Option<usize> {
        for _ in 0..self.agents {
            let index = self.advance()?;
            if live(index) {
                return Some(index);
            }
        }
        None
    }
}
