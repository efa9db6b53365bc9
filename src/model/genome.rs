//! Inheritable trait set and mutation-on-reproduction.
//!
//! A genome is immutable once assigned to a creature; a child always gets a
//! freshly derived copy, never a shared reference to the parent's.

use crate::model::config::RabbitConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};

// Clamp domains. Fixed constants, identical for every derivation.
pub const METABOLISM_MAX: f64 = 3000.0;
pub const STOMACH_MAX: f64 = 10000.0;
pub const SPEED_MAX: f64 = 1.9;
pub const BEHAVIOR_TRAIT_MAX: f64 = 100.0;
pub const COLOR_MAX: f64 = 255.0;
/// Color drifts fast regardless of the genome's own mutation rate, purely
/// so lineages stay visually distinguishable.
pub const COLOR_MUTATION_RATE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub mutation_rate: f64,
    pub metabolism: f64,
    pub stomach_capacity: f64,
    pub speed: f64,
    pub reproduce_rate: f64,
    pub reproduce_cutoff: f64,
    pub fear_factor: f64,
    pub hunger_factor: f64,
    pub avoid_others_factor: f64,
    pub color: [f64; 3],
    pub starting_energy: f64,
    pub generation: u32,
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

/// Perturbs `value` by `value * (1 - uniform(-rate, rate))`, clamped.
fn mutate_value<R: Rng>(rng: &mut R, value: f64, rate: f64, min: f64, max: f64) -> f64 {
    let drawn = rng.gen_range(-rate..=rate);
    clamp(value * (1.0 - drawn), min, max)
}

/// Mutates metabolism, stomach capacity and speed off a single shared draw.
///
/// The three are deliberately not independent: the same `m` scales speed by
/// `(1 - m)` and the energy traits by `(1 + 5m)`, so any speed gain comes
/// with an energy-efficiency loss and speed cannot evolve without bound.
fn mutate_energy_budget<R: Rng>(
    rng: &mut R,
    metabolism: f64,
    stomach_capacity: f64,
    speed: f64,
    rate: f64,
) -> (f64, f64, f64) {
    let m = rng.gen_range(-rate..=rate);
    let speed_change = 1.0 - m;
    let energy_change = 1.0 + 5.0 * m;
    (
        clamp(metabolism * energy_change, 0.0, METABOLISM_MAX),
        clamp(stomach_capacity * energy_change, 0.0, STOMACH_MAX),
        clamp(speed * speed_change, 0.0, SPEED_MAX),
    )
}

impl Genome {
    /// The genome every seeded rabbit starts from, taken straight out of the
    /// species configuration.
    pub fn founder(config: &RabbitConfig) -> Self {
        Self {
            mutation_rate: config.mutation_rate,
            metabolism: config.metabolism,
            stomach_capacity: config.stomach_capacity,
            speed: config.speed,
            reproduce_rate: config.reproduce_rate,
            reproduce_cutoff: config.reproduce_cutoff,
            fear_factor: config.fear_factor,
            hunger_factor: config.hunger_factor,
            avoid_others_factor: config.avoid_others_factor,
            color: [70.0, 70.0, 220.0],
            starting_energy: config.starting_energy,
            generation: 0,
        }
    }

    /// Derives a child's genome from this one.
    ///
    /// Independent scalar traits mutate on their own draws; the energy
    /// budget mutates as one coupled unit. The child's starting energy is
    /// capped by the parent's own reproduction cutoff, so a child can never
    /// begin life with more energy than would have made the parent eligible
    /// to reproduce.
    pub fn derive_child<R: Rng>(&self, rng: &mut R) -> Genome {
        let rate = self.mutation_rate;
        let (metabolism, stomach_capacity, speed) = mutate_energy_budget(
            rng,
            self.metabolism,
            self.stomach_capacity,
            self.speed,
            rate,
        );
        let fear_factor = mutate_value(rng, self.fear_factor, rate, 0.0, BEHAVIOR_TRAIT_MAX);
        let hunger_factor = mutate_value(rng, self.hunger_factor, rate, 0.0, BEHAVIOR_TRAIT_MAX);
        let avoid_others_factor =
            mutate_value(rng, self.avoid_others_factor, rate, 0.0, BEHAVIOR_TRAIT_MAX);
        let color = [
            mutate_value(rng, self.color[0], COLOR_MUTATION_RATE, 0.0, COLOR_MAX),
            mutate_value(rng, self.color[1], COLOR_MUTATION_RATE, 0.0, COLOR_MAX),
            mutate_value(rng, self.color[2], COLOR_MUTATION_RATE, 0.0, COLOR_MAX),
        ];
        let starting_energy =
            mutate_value(rng, self.starting_energy, rate, 0.0, self.reproduce_cutoff);

        Genome {
            mutation_rate: rate,
            metabolism,
            stomach_capacity,
            speed,
            reproduce_rate: self.reproduce_rate,
            reproduce_cutoff: self.reproduce_cutoff,
            fear_factor,
            hunger_factor,
            avoid_others_factor,
            color,
            starting_energy,
            generation: self.generation + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn founder() -> Genome {
        Genome::founder(&AppConfig::default().rabbit)
    }

    #[test]
    fn test_child_generation_increments_by_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let parent = founder();
        let child = parent.derive_child(&mut rng);
        assert_eq!(child.generation, parent.generation + 1);
        let grandchild = child.derive_child(&mut rng);
        assert_eq!(grandchild.generation, 2);
    }

    #[test]
    fn test_child_starting_energy_capped_by_parent_cutoff() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut parent = founder();
        parent.starting_energy = 5000.0;
        parent.reproduce_cutoff = 100.0;
        for _ in 0..200 {
            let child = parent.derive_child(&mut rng);
            assert!(child.starting_energy <= parent.reproduce_cutoff);
            assert!(child.starting_energy >= 0.0);
        }
    }

    #[test]
    fn test_extreme_inputs_stay_inside_clamp_domains() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut parent = founder();
        parent.metabolism = 1e9;
        parent.stomach_capacity = 1e9;
        parent.speed = 1e9;
        parent.mutation_rate = 0.99;
        for _ in 0..200 {
            let child = parent.derive_child(&mut rng);
            assert!(child.metabolism >= 0.0 && child.metabolism <= METABOLISM_MAX);
            assert!(child.stomach_capacity >= 0.0 && child.stomach_capacity <= STOMACH_MAX);
            assert!(child.speed >= 0.0 && child.speed <= SPEED_MAX);
        }
    }

    #[test]
    fn test_zero_mutation_rate_keeps_coupled_traits() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut parent = founder();
        parent.mutation_rate = 0.0;
        let child = parent.derive_child(&mut rng);
        assert_eq!(child.metabolism, parent.metabolism);
        assert_eq!(child.stomach_capacity, parent.stomach_capacity);
        assert_eq!(child.speed, parent.speed);
        assert_eq!(child.fear_factor, parent.fear_factor);
        // Color uses its own fixed rate and still drifts.
    }

    #[test]
    fn test_speed_and_energy_move_in_opposite_senses() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let parent = founder();
        for _ in 0..200 {
            let child = parent.derive_child(&mut rng);
            let speed_up = child.speed > parent.speed;
            let metabolism_up = child.metabolism > parent.metabolism;
            if child.speed != parent.speed && child.metabolism != parent.metabolism {
                assert_ne!(speed_up, metabolism_up);
            }
        }
    }
}
