//! Pure bookkeeping for boss encounters: heal cadence, failure budget and
//! end-of-fight bonus XP.

/// Cadence counter value on which a heal is used instead of damage.
pub const HEAL_ROUND: u8 = 23;

/// What a single boss round contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    Heal,
    Damage(u32),
}

impl Contribution {
    pub fn use_heal(self) -> bool {
        matches!(self, Self::Heal)
    }

    pub fn damage_to_boss(self) -> u32 {
        match self {
            Self::Heal => 0,
            Self::Damage(amount) => amount,
        }
    }
}

/// Schedules one heal every 24 rounds, damage otherwise.
#[derive(Debug, Clone, Default)]
pub struct HealCadence {
    counter: u8,
}

impl HealCadence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Advance by one round and return what that round contributes.
    pub fn next_round(&mut self, damage: u32) -> Contribution {
        if self.counter == HEAL_ROUND {
            self.counter = 0;
            Contribution::Heal
        } else {
            self.counter += 1;
            Contribution::Damage(damage)
        }
    }
}

/// Counts consecutive failed rounds against a tolerance.
#[derive(Debug, Clone)]
pub struct FailureBudget {
    tolerated: u32,
    consecutive: u32,
}

impl FailureBudget {
    pub fn new(tolerated: u32) -> Self {
        Self {
            tolerated,
            consecutive: 0,
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Record a failed round. Returns true once the tolerance is exceeded.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive > self.tolerated
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }
}

/// XP awarded by the game-over round on top of regular round XP.
pub fn bonus_xp(xp_at_game_over: u64, xp_before_final_round: u64) -> u64 {
    xp_at_game_over.saturating_sub(xp_before_final_round)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heal_lands_on_every_24th_round_only() {
        let mut cadence = HealCadence::new();
        let rounds: Vec<Contribution> = (0..72).map(|_| cadence.next_round(5)).collect();

        for (index, round) in rounds.iter().enumerate() {
            let round_number = index + 1;
            if round_number % 24 == 0 {
                assert_eq!(*round, Contribution::Heal, "round {round_number}");
                assert_eq!(round.damage_to_boss(), 0);
            } else {
                assert_eq!(*round, Contribution::Damage(5), "round {round_number}");
                assert!(!round.use_heal());
            }
        }
    }

    #[test]
    fn cadence_counter_stays_in_range() {
        let mut cadence = HealCadence::new();
        for _ in 0..100 {
            cadence.next_round(1);
            assert!(cadence.counter() <= HEAL_ROUND);
        }
    }

    #[test]
    fn budget_breaks_on_sixth_consecutive_failure() {
        let mut budget = FailureBudget::new(5);
        for _ in 0..5 {
            assert!(!budget.record_failure());
        }
        assert!(budget.record_failure());
    }

    #[test]
    fn success_resets_the_budget() {
        let mut budget = FailureBudget::new(5);
        for _ in 0..5 {
            budget.record_failure();
        }
        budget.record_success();
        assert_eq!(budget.consecutive(), 0);
        assert!(!budget.record_failure());
    }

    #[test]
    fn bonus_xp_never_underflows() {
        assert_eq!(bonus_xp(1_500, 1_200), 300);
        assert_eq!(bonus_xp(100, 200), 0);
    }
}
