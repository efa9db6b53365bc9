//! Birth machinery: site search, reproduction gates, initial seeding.
//!
//! Everything here resolves softly: a failed site search or gate just
//! means no child this tick, and nothing is recorded as an error.

use crate::model::registry::SpeciesRegistry;
use crate::model::spatial;
use crate::model::steering::Vec2;
use crate::model::world::WorldBounds;
use rand::Rng;
use std::collections::HashSet;
use std::f64::consts::TAU;

/// How many candidate sites a single birth attempt may sample before the
/// birth is silently abandoned.
pub const BIRTH_ATTEMPTS: u32 = 10;

/// Searches for a spawn point in the annulus `[min_dist, max_dist]` around
/// the parent.
///
/// Every attempt draws a fresh uniform angle and radius. A candidate is
/// accepted only if it lies inside world bounds and is more than `min_dist`
/// away from every existing member of the species, the parent included.
/// Exhausting the attempts is an expected outcome in a crowded
/// neighborhood, not a failure.
pub fn find_birth_site<R: Rng>(
    rng: &mut R,
    parent: Vec2,
    min_dist: f64,
    max_dist: f64,
    registry: &SpeciesRegistry,
    bounds: &WorldBounds,
) -> Option<Vec2> {
    for _ in 0..BIRTH_ATTEMPTS {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(min_dist..=max_dist);
        let candidate = parent + Vec2::new(radius * angle.cos(), radius * angle.sin());
        if bounds.contains(candidate) && spatial::density_at(candidate, registry) > min_dist {
            return Some(candidate);
        }
    }
    None
}

/// Reproduction gate for animals: enough energy, a passed random draw, and
/// room under the species cap. Any one failing is a silent no-op.
pub fn animal_reproduction_gate<R: Rng>(
    rng: &mut R,
    energy: f64,
    cutoff: f64,
    rate: f64,
    registry: &SpeciesRegistry,
) -> bool {
    energy > cutoff && rng.gen::<f64>() < rate && registry.len() < registry.cap()
}

/// Reproduction gate for plants: no energy requirement, just the random
/// draw and the cap.
pub fn plant_reproduction_gate<R: Rng>(
    rng: &mut R,
    rate: f64,
    registry: &SpeciesRegistry,
) -> bool {
    rng.gen::<f64>() < rate && registry.len() < registry.cap()
}

/// Distinct integer starting cells for the initial population, uniformly
/// over the world.
///
/// Yields at most one position per distinct cell: asking for more than the
/// grid holds returns a full grid's worth, never loops chasing cells that
/// do not exist. Seeding then places fewer creatures; the config validator
/// rejects such a setup up front.
pub fn seed_positions<R: Rng>(rng: &mut R, count: usize, bounds: &WorldBounds) -> Vec<Vec2> {
    let cols = bounds.width.max(1.0) as u64;
    let rows = bounds.height.max(1.0) as u64;
    let count = count.min(cols.saturating_mul(rows) as usize);
    let mut taken = HashSet::new();
    let mut positions = Vec::with_capacity(count);
    while positions.len() < count {
        let x = rng.gen_range(0..cols);
        let y = rng.gen_range(0..rows);
        if taken.insert((x, y)) {
            positions.push(Vec2::new(x as f64, y as f64));
        }
    }
    positions
}
