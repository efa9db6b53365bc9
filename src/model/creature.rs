//! The individual: a single data-driven record tagged by species kind.
//!
//! There is no Plant/Rabbit/Fox type hierarchy; behavior differences live in
//! the per-kind capability table the world looks up when it runs a
//! creature's tick. What lives here is the creature's own mutable state
//! (position, energy, remaining bites) behind one short-critical-section
//! lock, so other threads only ever see guarded snapshots and the one
//! explicit state transition they are allowed to cause: [`Creature::consume`].

use crate::model::config::FoxConfig;
use crate::model::genome::Genome;
use crate::model::steering::Vec2;
use crate::model::world::WorldBounds;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesKind {
    Plant,
    Rabbit,
    Fox,
}

impl SpeciesKind {
    pub fn label(self) -> &'static str {
        match self {
            SpeciesKind::Plant => "plant",
            SpeciesKind::Rabbit => "rabbit",
            SpeciesKind::Fox => "fox",
        }
    }
}

/// Outcome of one consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    /// Animal victim: its energy was > 0 and is now 0. At most one caller
    /// per victim lifetime ever sees this.
    Flesh,
    /// Plant victim: a bite was taken, value remains.
    Bite,
    /// Plant victim: this bite exhausted it.
    LastBite,
    /// Nothing left to take; the caller lost the race.
    Spent,
}

#[derive(Debug)]
struct Vitals {
    pos: Vec2,
    energy: f64,
    bites_left: u32,
    consumed: bool,
}

pub struct Creature {
    pub id: Uuid,
    pub kind: SpeciesKind,
    pub speed: f64,
    pub genome: Option<Genome>,
    vitals: Mutex<Vitals>,
}

impl Creature {
    pub fn new_plant(pos: Vec2, food_value: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: SpeciesKind::Plant,
            speed: 0.0,
            genome: None,
            vitals: Mutex::new(Vitals {
                pos,
                energy: 0.0,
                bites_left: food_value,
                consumed: false,
            }),
        }
    }

    pub fn new_rabbit(pos: Vec2, genome: Genome) -> Self {
        let energy = genome.starting_energy;
        let speed = genome.speed;
        Self {
            id: Uuid::new_v4(),
            kind: SpeciesKind::Rabbit,
            speed,
            genome: Some(genome),
            vitals: Mutex::new(Vitals {
                pos,
                energy,
                bites_left: 0,
                consumed: false,
            }),
        }
    }

    pub fn new_fox(pos: Vec2, config: &FoxConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: SpeciesKind::Fox,
            speed: config.speed,
            genome: None,
            vitals: Mutex::new(Vitals {
                pos,
                energy: config.starting_energy,
                bites_left: 0,
                consumed: false,
            }),
        }
    }

    // Vitals updates are single-field writes, so a poisoned lock still holds
    // consistent data and the sim can keep going.
    fn vitals(&self) -> MutexGuard<'_, Vitals> {
        self.vitals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn position(&self) -> Vec2 {
        self.vitals().pos
    }

    pub fn energy(&self) -> f64 {
        self.vitals().energy
    }

    pub fn bites_left(&self) -> u32 {
        self.vitals().bites_left
    }

    /// Applies a displacement, clamping the result into world bounds. Only
    /// ever called from the creature's own thread.
    pub fn displace(&self, delta: Vec2, bounds: &WorldBounds) {
        let mut vitals = self.vitals();
        vitals.pos = bounds.clamp(vitals.pos + delta);
    }

    /// Attempts to consume this creature. The check and the write are one
    /// atomic unit under the vitals guard:
    ///
    /// - animals: energy > 0 is zeroed exactly once, so concurrent predators
    ///   racing on the same victim get one `Flesh` and the rest `Spent`;
    /// - plants: each bite decrements the remaining value, and only the bite
    ///   that reaches zero reports `LastBite`.
    pub fn consume(&self) -> Consumption {
        let mut vitals = self.vitals();
        match self.kind {
            SpeciesKind::Plant => {
                if vitals.bites_left == 0 {
                    return Consumption::Spent;
                }
                vitals.bites_left -= 1;
                if vitals.bites_left == 0 {
                    vitals.consumed = true;
                    Consumption::LastBite
                } else {
                    Consumption::Bite
                }
            }
            SpeciesKind::Rabbit | SpeciesKind::Fox => {
                if vitals.energy > 0.0 {
                    vitals.energy = 0.0;
                    vitals.consumed = true;
                    Consumption::Flesh
                } else {
                    Consumption::Spent
                }
            }
        }
    }

    /// Feeding gain, bounded by stomach capacity.
    pub fn gain_energy(&self, amount: f64, stomach_capacity: f64) {
        let mut vitals = self.vitals();
        vitals.energy = (vitals.energy + amount).min(stomach_capacity);
    }

    /// Caps starting energy at birth time, before the creature is shared.
    pub fn cap_starting_energy(&mut self, cap: f64) {
        let vitals = self.vitals.get_mut().unwrap_or_else(PoisonError::into_inner);
        vitals.energy = vitals.energy.min(cap);
    }

    /// Deducts the energy endowed to a newborn. A birth alone never drives
    /// the parent negative; upkeep is what kills.
    pub fn pay_birth_cost(&self, cost: f64) {
        let mut vitals = self.vitals();
        vitals.energy = (vitals.energy - cost).max(0.0);
    }

    /// Per-tick upkeep cost. Returns the energy remaining afterwards.
    pub fn pay_upkeep(&self) -> f64 {
        let mut vitals = self.vitals();
        vitals.energy -= 1.0;
        vitals.energy
    }

    /// Terminal check: a plant with no bites left, or an animal out of
    /// energy.
    pub fn is_spent(&self) -> bool {
        let vitals = self.vitals();
        match self.kind {
            SpeciesKind::Plant => vitals.bites_left == 0,
            _ => vitals.energy <= 0.0,
        }
    }

    /// Whether the terminal state was caused by another creature's
    /// `consume`, as opposed to starvation.
    pub fn was_consumed(&self) -> bool {
        self.vitals().consumed
    }

    pub fn snapshot(&self) -> CreatureSnapshot {
        let vitals = self.vitals();
        let alive = match self.kind {
            SpeciesKind::Plant => vitals.bites_left > 0,
            _ => vitals.energy > 0.0,
        };
        CreatureSnapshot {
            id: self.id,
            kind: self.kind,
            x: vitals.pos.x,
            y: vitals.pos.y,
            energy: vitals.energy,
            generation: self.genome.as_ref().map(|g| g.generation),
            alive,
        }
    }
}

/// Read-only view handed to renderers and telemetry. Never carries a live
/// reference back into the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub id: Uuid,
    pub kind: SpeciesKind,
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub generation: Option<u32>,
    pub alive: bool,
}
