//! Per-species population registry.
//!
//! The registry is the only cross-thread view of who is alive. All mutation
//! and iteration happen under its guard, and critical sections stay short:
//! no steering math, no consumption, no barrier waits while the guard is
//! held. Queries hand back `Arc` handles or plain snapshots, never raw
//! mutable references into another creature.

use crate::model::creature::{Creature, CreatureSnapshot, SpeciesKind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub struct SpeciesRegistry {
    kind: SpeciesKind,
    cap: usize,
    members: Mutex<Vec<Arc<Creature>>>,
}

impl SpeciesRegistry {
    pub fn new(kind: SpeciesKind, cap: usize) -> Self {
        Self {
            kind,
            cap,
            members: Mutex::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> SpeciesKind {
        self.kind
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub(crate) fn guard(&self) -> MutexGuard<'_, Vec<Arc<Creature>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a member unless the population cap is already reached. The size
    /// check and the insert are one critical section, so concurrent
    /// reproduction attempts can never push the registry past its cap.
    pub fn try_add(&self, creature: Arc<Creature>) -> bool {
        debug_assert_eq!(creature.kind, self.kind);
        let mut members = self.guard();
        if members.len() >= self.cap {
            return false;
        }
        members.push(creature);
        true
    }

    /// Removes a member by id. Removing an id that is already gone is a
    /// no-op: concurrent death paths may race and the loser must not error.
    pub fn remove(&self, id: Uuid) {
        self.guard().retain(|c| c.id != id);
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Runs `f` over the member list under the guard.
    pub fn with_members<R>(&self, f: impl FnOnce(&[Arc<Creature>]) -> R) -> R {
        let members = self.guard();
        f(&members)
    }

    pub fn snapshots(&self) -> Vec<CreatureSnapshot> {
        self.with_members(|members| members.iter().map(|c| c.snapshot()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::steering::Vec2;

    fn plant() -> Arc<Creature> {
        Arc::new(Creature::new_plant(Vec2::new(1.0, 2.0), 1))
    }

    #[test]
    fn test_add_and_remove() {
        let registry = SpeciesRegistry::new(SpeciesKind::Plant, 10);
        let p = plant();
        assert!(registry.try_add(p.clone()));
        assert_eq!(registry.len(), 1);
        registry.remove(p.id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SpeciesRegistry::new(SpeciesKind::Plant, 10);
        let p = plant();
        registry.try_add(p.clone());
        registry.remove(p.id);
        registry.remove(p.id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cap_refuses_overflow() {
        let registry = SpeciesRegistry::new(SpeciesKind::Plant, 2);
        assert!(registry.try_add(plant()));
        assert!(registry.try_add(plant()));
        assert!(!registry.try_add(plant()));
        assert_eq!(registry.len(), 2);
    }
}
