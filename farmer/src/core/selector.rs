//! Deterministic zone selection over a planet snapshot.

use crate::core::types::{Planet, Target, Zone, ZoneKind};

/// Difficulty tiers a normal zone can be ranked in, best first.
const DIFFICULTY_TIERS: [u8; 3] = [3, 2, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    /// Whether boss zones may be chosen (and may preempt a hold).
    pub include_boss: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self { include_boss: true }
    }
}

/// Pick the zone worth joining next.
///
/// Active boss zones win outright. Otherwise the first planet (in snapshot
/// order) holding an eligible zone of the highest available difficulty wins,
/// with its best zone. Returns `None` if nothing is eligible.
pub fn select_target(planets: &[Planet], options: SelectOptions) -> Option<Target> {
    if options.include_boss {
        for planet in planets {
            if let Some(zone) = planet
                .zones
                .iter()
                .find(|zone| zone.is_active_boss() && zone.is_eligible())
            {
                return Some(target(planet, zone));
            }
        }
    }

    let ranked: Vec<(&Planet, Vec<&Zone>)> = planets
        .iter()
        .map(|planet| (planet, ranked_normal_zones(planet)))
        .collect();

    for tier in DIFFICULTY_TIERS {
        for (planet, zones) in &ranked {
            if let Some(zone) = zones.first().filter(|zone| zone.difficulty == tier) {
                return Some(target(planet, zone));
            }
        }
    }

    None
}

/// Returns true if `candidate` is worth abandoning `held` for.
pub fn outranks(candidate: &Zone, held: &Zone, options: SelectOptions) -> bool {
    match candidate.kind {
        ZoneKind::Boss => options.include_boss,
        ZoneKind::Normal => candidate.difficulty > held.difficulty,
    }
}

/// Eligible normal zones of a planet, hardest first; stable within a tier.
fn ranked_normal_zones(planet: &Planet) -> Vec<&Zone> {
    let mut zones: Vec<&Zone> = planet
        .zones
        .iter()
        .filter(|zone| zone.kind == ZoneKind::Normal && zone.is_eligible())
        .filter(|zone| DIFFICULTY_TIERS.contains(&zone.difficulty))
        .collect();
    zones.sort_by(|a, b| b.difficulty.cmp(&a.difficulty));
    zones
}

fn target(planet: &Planet, zone: &Zone) -> Target {
    Target {
        planet_id: planet.id,
        planet_name: planet.name.clone(),
        zone: zone.clone(),
    }
}
