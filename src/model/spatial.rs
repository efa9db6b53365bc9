//! Nearest-neighbor queries against a registry.
//!
//! Linear scans on purpose: populations are capped in the low hundreds and
//! the O(n) walk under the registry guard is the documented behavior, so
//! there is no spatial index here.

use crate::model::creature::Creature;
use crate::model::registry::SpeciesRegistry;
use crate::model::steering::Vec2;
use std::sync::Arc;
use uuid::Uuid;

/// Distance assigned to a candidate that is the querying creature itself.
/// Effectively infinite at world scale, so self never beats any real
/// neighbor; it only "wins" when it is the sole member, and that case is
/// filtered to `None` below.
pub const SELF_DISTANCE: f64 = 10_000.0;

/// Closest member to `from`, or `None` if the registry is empty.
pub fn nearest(from: Vec2, registry: &SpeciesRegistry) -> Option<Arc<Creature>> {
    registry.with_members(|members| {
        members
            .iter()
            .map(|c| (c.position().distance_to(from), c))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, c)| Arc::clone(c))
    })
}

/// Closest member to `from` other than the creature `self_id`.
///
/// Self-exclusion goes through the sentinel distance rather than dropping
/// the candidate from the scan, so ties and ordering never special-case the
/// result. If the sentinel still wins (the querier is the only member)
/// the answer is `None`.
pub fn nearest_excluding(
    self_id: Uuid,
    from: Vec2,
    registry: &SpeciesRegistry,
) -> Option<Arc<Creature>> {
    registry.with_members(|members| {
        members
            .iter()
            .map(|c| {
                let distance = if c.id == self_id {
                    SELF_DISTANCE
                } else {
                    c.position().distance_to(from)
                };
                (distance, c)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .and_then(|(_, c)| {
                if c.id == self_id {
                    None
                } else {
                    Some(Arc::clone(c))
                }
            })
    })
}

/// Distance from `point` to the nearest member, used by birth placement to
/// keep newborns spread out. An empty registry is infinitely sparse.
pub fn density_at(point: Vec2, registry: &SpeciesRegistry) -> f64 {
    registry.with_members(|members| {
        members
            .iter()
            .map(|c| c.position().distance_to(point))
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(f64::INFINITY)
    })
}
