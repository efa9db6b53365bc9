//! World wiring and the per-creature tick loop.
//!
//! One OS thread per live creature, all of them rendezvousing at the
//! generational barrier between ticks. The world owns the three species
//! registries, the barrier (whose census takes all three registry guards in
//! one fixed order: plants, rabbits, foxes), the telemetry sink, and the
//! join handles of every thread it has ever spawned.

use crate::model::barrier::{Arrival, TickBarrier};
use crate::model::config::AppConfig;
use crate::model::creature::{Consumption, Creature, CreatureSnapshot, SpeciesKind};
use crate::model::events::{EventKind, EventSink};
use crate::model::genome::Genome;
use crate::model::lifecycle;
use crate::model::registry::SpeciesRegistry;
use crate::model::spatial;
use crate::model::steering::{self, Interest, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// An animal must end its move within this distance of a food individual to
/// attempt a bite.
pub const CAPTURE_RADIUS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
}

impl WorldBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// Per-tick population summary for stat displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub tick: u64,
    pub plants: usize,
    pub rabbits: usize,
    pub foxes: usize,
    pub avg_rabbit_energy: f64,
}

/// Capability table entry for an animal kind: who it eats, who it flees,
/// and the physiology numbers its tick runs on. Rabbits read these off
/// their genome, foxes off the species config; there is no subtype
/// dispatch anywhere.
struct AnimalProfile {
    speed: f64,
    hunger_weight: f64,
    fear_weight: f64,
    avoid_weight: f64,
    metabolism: f64,
    stomach_capacity: f64,
    reproduce_rate: f64,
    reproduce_cutoff: f64,
    min_spawn_distance: f64,
    max_spawn_distance: f64,
}

pub struct World {
    pub config: AppConfig,
    pub bounds: WorldBounds,
    plants: Arc<SpeciesRegistry>,
    rabbits: Arc<SpeciesRegistry>,
    foxes: Arc<SpeciesRegistry>,
    barrier: Arc<TickBarrier>,
    events: EventSink,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl World {
    pub fn new(config: AppConfig, events: EventSink) -> Arc<Self> {
        let bounds = WorldBounds::new(config.world.width, config.world.height);
        let plants = Arc::new(SpeciesRegistry::new(
            SpeciesKind::Plant,
            config.plant.max_population,
        ));
        let rabbits = Arc::new(SpeciesRegistry::new(
            SpeciesKind::Rabbit,
            config.rabbit.max_population,
        ));
        let foxes = Arc::new(SpeciesRegistry::new(
            SpeciesKind::Fox,
            config.fox.max_population,
        ));

        // The census holds all three registry guards at once, in the same
        // fixed order every time, so the total it reports can never move
        // between the read and the barrier's compare.
        let census = {
            let plants = Arc::clone(&plants);
            let rabbits = Arc::clone(&rabbits);
            let foxes = Arc::clone(&foxes);
            move || {
                let p = plants.guard();
                let r = rabbits.guard();
                let f = foxes.guard();
                p.len() + r.len() + f.len()
            }
        };
        let barrier = Arc::new(TickBarrier::new(
            Duration::from_millis(config.world.tick_interval_ms),
            census,
        ));

        Arc::new(Self {
            bounds,
            plants,
            rabbits,
            foxes,
            barrier,
            events,
            handles: Mutex::new(Vec::new()),
            config,
        })
    }

    pub fn plants(&self) -> &SpeciesRegistry {
        &self.plants
    }

    pub fn rabbits(&self) -> &SpeciesRegistry {
        &self.rabbits
    }

    pub fn foxes(&self) -> &SpeciesRegistry {
        &self.foxes
    }

    fn registry_of(&self, kind: SpeciesKind) -> &Arc<SpeciesRegistry> {
        match kind {
            SpeciesKind::Plant => &self.plants,
            SpeciesKind::Rabbit => &self.rabbits,
            SpeciesKind::Fox => &self.foxes,
        }
    }

    /// Total live creatures, observed under all registry guards at once.
    pub fn census(&self) -> usize {
        let p = self.plants.guard();
        let r = self.rabbits.guard();
        let f = self.foxes.guard();
        p.len() + r.len() + f.len()
    }

    /// Completed tick count.
    pub fn tick(&self) -> u64 {
        self.barrier.ticks()
    }

    pub fn is_shutdown(&self) -> bool {
        self.barrier.is_shutdown()
    }

    /// Raises the shutdown flag and wakes everything blocked at the
    /// barrier. Creatures exit on their next loop iteration.
    pub fn request_shutdown(&self) {
        self.barrier.request_shutdown();
    }

    /// Read-only view of every live creature, for renderers. Taken under
    /// the registry guards only; the caller gets plain data.
    pub fn snapshot(&self) -> Vec<CreatureSnapshot> {
        let mut all = self.plants.snapshots();
        all.extend(self.rabbits.snapshots());
        all.extend(self.foxes.snapshots());
        all
    }

    pub fn stats(&self) -> PopulationStats {
        let rabbits = self.rabbits.len();
        let avg_rabbit_energy = if rabbits > 0 {
            self.rabbits
                .with_members(|m| m.iter().map(|c| c.energy()).sum::<f64>())
                / rabbits as f64
        } else {
            0.0
        };
        PopulationStats {
            tick: self.tick(),
            plants: self.plants.len(),
            rabbits,
            foxes: self.foxes.len(),
            avg_rabbit_energy,
        }
    }

    /// Seeds the initial population at distinct random cells and starts a
    /// thread per creature. All creatures are registered before the first
    /// thread runs, so the very first census already sees the full
    /// population.
    pub fn seed(self: &Arc<Self>) {
        let mut rng = rand::thread_rng();
        let counts = [
            (SpeciesKind::Fox, self.config.world.initial_foxes),
            (SpeciesKind::Rabbit, self.config.world.initial_rabbits),
            (SpeciesKind::Plant, self.config.world.initial_plants),
        ];
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        let mut positions = lifecycle::seed_positions(&mut rng, total, &self.bounds).into_iter();

        let mut seeded = Vec::with_capacity(total);
        for (kind, count) in counts {
            for _ in 0..count {
                let Some(pos) = positions.next() else { break };
                let creature: Arc<Creature> = Arc::new(match kind {
                    SpeciesKind::Plant => {
                        Creature::new_plant(pos, self.config.plant.food_value)
                    }
                    SpeciesKind::Rabbit => {
                        Creature::new_rabbit(pos, Genome::founder(&self.config.rabbit))
                    }
                    SpeciesKind::Fox => Creature::new_fox(pos, &self.config.fox),
                });
                if self.registry_of(kind).try_add(Arc::clone(&creature)) {
                    self.events.emit(EventKind::Born, &creature);
                    seeded.push(creature);
                }
            }
        }
        tracing::info!(
            plants = self.plants.len(),
            rabbits = self.rabbits.len(),
            foxes = self.foxes.len(),
            "world seeded"
        );
        for creature in seeded {
            self.spawn_thread(creature);
        }
    }

    /// Registers a creature and starts its thread. Registration happens
    /// first, so the barrier's census includes the creature before its own
    /// first arrival could ever be counted; for a birth this is what puts
    /// the child into the cohort no later than the parent's next arrival.
    ///
    /// Returns false if the species is at its population cap.
    pub fn spawn(self: &Arc<Self>, creature: Arc<Creature>) -> bool {
        if !self.registry_of(creature.kind).try_add(Arc::clone(&creature)) {
            // Lost a cap race between the gate and the insert. Soft no-op.
            return false;
        }
        self.events.emit(EventKind::Born, &creature);
        tracing::debug!(kind = creature.kind.label(), id = %creature.id, "born");
        self.spawn_thread(creature);
        true
    }

    fn spawn_thread(self: &Arc<Self>, creature: Arc<Creature>) {
        let world = Arc::clone(self);
        let handle = std::thread::spawn(move || match creature.kind {
            SpeciesKind::Plant => world.run_plant(creature),
            SpeciesKind::Rabbit | SpeciesKind::Fox => world.run_animal(creature),
        });
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Drives the run from the calling thread: waits until the tick limit
    /// is reached or the population dies out, raises shutdown, and joins
    /// every creature thread.
    pub fn run_until(self: &Arc<Self>, max_ticks: u64) {
        loop {
            if self.barrier.is_shutdown() {
                break;
            }
            if self.tick() >= max_ticks {
                tracing::info!(ticks = self.tick(), "tick limit reached");
                self.request_shutdown();
                break;
            }
            if self.census() == 0 {
                tracing::info!("population extinct");
                self.request_shutdown();
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        self.join_all();
    }

    /// Joins every spawned thread, including ones spawned while joining.
    pub fn join_all(&self) {
        loop {
            let drained: Vec<JoinHandle<()>> = {
                let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
                handles.drain(..).collect()
            };
            if drained.is_empty() {
                break;
            }
            for handle in drained {
                if handle.join().is_err() {
                    // A creature panicking must not take the run down with
                    // it; its registry entry was its own to clean up.
                    tracing::error!("creature thread panicked");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Per-creature tick loops
    // ------------------------------------------------------------------

    fn run_plant(self: Arc<Self>, plant: Arc<Creature>) {
        let mut rng = rand::thread_rng();
        let config = self.config.plant.clone();
        loop {
            if self.barrier.is_shutdown() {
                return;
            }
            if plant.is_spent() {
                // The final bite was already reported by the eater; the
                // plant only deregisters itself, exactly once. The barrier
                // re-check keeps peers that already counted this plant from
                // waiting on an arrival that will never come.
                self.plants.remove(plant.id);
                self.barrier.depart();
                return;
            }

            if lifecycle::plant_reproduction_gate(&mut rng, config.reproduce_rate, &self.plants) {
                if let Some(site) = lifecycle::find_birth_site(
                    &mut rng,
                    plant.position(),
                    config.min_spawn_distance,
                    config.max_spawn_distance,
                    &self.plants,
                    &self.bounds,
                ) {
                    self.spawn(Arc::new(Creature::new_plant(site, config.food_value)));
                }
            }

            if self.barrier.arrive() == Arrival::Shutdown {
                return;
            }
        }
    }

    fn animal_profile(&self, animal: &Creature) -> AnimalProfile {
        match &animal.genome {
            Some(genome) => AnimalProfile {
                speed: genome.speed,
                hunger_weight: genome.hunger_factor,
                fear_weight: genome.fear_factor,
                avoid_weight: genome.avoid_others_factor,
                metabolism: genome.metabolism,
                stomach_capacity: genome.stomach_capacity,
                reproduce_rate: genome.reproduce_rate,
                reproduce_cutoff: genome.reproduce_cutoff,
                min_spawn_distance: self.config.rabbit.min_spawn_distance,
                max_spawn_distance: self.config.rabbit.max_spawn_distance,
            },
            None => {
                let fox = &self.config.fox;
                AnimalProfile {
                    speed: fox.speed,
                    hunger_weight: fox.hunger_factor,
                    fear_weight: 0.0,
                    avoid_weight: fox.avoid_others_factor,
                    metabolism: fox.metabolism,
                    stomach_capacity: fox.stomach_capacity,
                    reproduce_rate: fox.reproduce_rate,
                    reproduce_cutoff: fox.reproduce_cutoff,
                    min_spawn_distance: fox.min_spawn_distance,
                    max_spawn_distance: fox.max_spawn_distance,
                }
            }
        }
    }

    fn food_registry(&self, kind: SpeciesKind) -> Option<&Arc<SpeciesRegistry>> {
        match kind {
            SpeciesKind::Rabbit => Some(&self.plants),
            SpeciesKind::Fox => Some(&self.rabbits),
            SpeciesKind::Plant => None,
        }
    }

    fn threat_registry(&self, kind: SpeciesKind) -> Option<&Arc<SpeciesRegistry>> {
        match kind {
            SpeciesKind::Rabbit => Some(&self.foxes),
            _ => None,
        }
    }

    fn run_animal(self: Arc<Self>, animal: Arc<Creature>) {
        let mut rng = rand::thread_rng();
        let profile = self.animal_profile(&animal);
        let own = Arc::clone(self.registry_of(animal.kind));

        loop {
            if self.barrier.is_shutdown() {
                return;
            }
            if animal.was_consumed() || animal.is_spent() {
                self.finish_animal(&own, &animal);
                return;
            }

            let pos = animal.position();

            // 1. sense
            let food = self
                .food_registry(animal.kind)
                .and_then(|reg| spatial::nearest(pos, reg));
            let threat = self
                .threat_registry(animal.kind)
                .and_then(|reg| spatial::nearest(pos, reg));
            let crowd = if profile.avoid_weight > 0.0 {
                spatial::nearest_excluding(animal.id, pos, &own)
            } else {
                None
            };

            // 2. decide
            let mut interests = Vec::with_capacity(3);
            if let Some(f) = &food {
                interests.push(Interest::new(f.position(), profile.hunger_weight));
            }
            if let Some(t) = &threat {
                interests.push(Interest::new(t.position(), -profile.fear_weight));
            }
            if let Some(c) = &crowd {
                interests.push(Interest::new(c.position(), -profile.avoid_weight));
            }
            let displacement = if interests.is_empty() {
                self.wander(&mut rng, pos, profile.speed)
            } else {
                steering::steer(pos, profile.speed, &interests)
            };

            // 3. move
            animal.displace(displacement, &self.bounds);

            // 4. resolve interaction
            if let Some(food) = &food {
                if animal.position().distance_to(food.position()) < CAPTURE_RADIUS {
                    match food.consume() {
                        Consumption::Flesh => {
                            animal.gain_energy(profile.metabolism, profile.stomach_capacity);
                            self.events.emit(EventKind::Consumed, food);
                        }
                        Consumption::LastBite => {
                            animal.gain_energy(profile.metabolism, profile.stomach_capacity);
                            self.events.emit(EventKind::Eaten, food);
                        }
                        Consumption::Bite => {
                            animal.gain_energy(profile.metabolism, profile.stomach_capacity);
                        }
                        // Another predator got there first this tick.
                        Consumption::Spent => {}
                    }
                }
            }

            // 5. maybe reproduce
            if lifecycle::animal_reproduction_gate(
                &mut rng,
                animal.energy(),
                profile.reproduce_cutoff,
                profile.reproduce_rate,
                &own,
            ) {
                self.try_animal_child(&mut rng, &animal, &profile, &own);
            }

            // 6. upkeep, 7. terminal check
            if animal.pay_upkeep() <= 0.0 {
                self.finish_animal(&own, &animal);
                return;
            }

            if self.barrier.arrive() == Arrival::Shutdown {
                return;
            }
        }
    }

    fn try_animal_child<R: Rng>(
        self: &Arc<Self>,
        rng: &mut R,
        parent: &Creature,
        profile: &AnimalProfile,
        own: &Arc<SpeciesRegistry>,
    ) {
        let Some(site) = lifecycle::find_birth_site(
            rng,
            parent.position(),
            profile.min_spawn_distance,
            profile.max_spawn_distance,
            own,
            &self.bounds,
        ) else {
            // No acceptable site this tick. Expected, not an error.
            return;
        };

        let child = match &parent.genome {
            Some(genome) => Creature::new_rabbit(site, genome.derive_child(rng)),
            None => {
                let fox = &self.config.fox;
                // Same rule the genome path enforces: a child never starts
                // with more energy than the parent's eligibility cutoff.
                let mut child = Creature::new_fox(site, fox);
                child.cap_starting_energy(fox.reproduce_cutoff);
                child
            }
        };
        let endowment = child.energy();
        if self.spawn(Arc::new(child)) {
            parent.pay_birth_cost(endowment);
        }
    }

    /// Terminal exit: deregister exactly once, report the cause, and let
    /// the barrier re-check its release condition without us.
    fn finish_animal(&self, own: &SpeciesRegistry, animal: &Creature) {
        own.remove(animal.id);
        self.barrier.depart();
        if animal.was_consumed() {
            // The predator already reported the consumption.
            tracing::debug!(kind = animal.kind.label(), id = %animal.id, "consumed");
        } else {
            self.events.emit(EventKind::Starved, animal);
            tracing::debug!(kind = animal.kind.label(), id = %animal.id, "starved");
        }
    }

    /// Random-walk fallback: re-roll cardinal steps a bounded number of
    /// times looking for one that stays inside the world. In a world
    /// smaller than the step every direction fails; the last roll is taken
    /// anyway and `displace`'s clamp absorbs the overshoot, so the walker
    /// always makes an arrival rather than spinning.
    fn wander<R: Rng>(&self, rng: &mut R, from: Vec2, speed: f64) -> Vec2 {
        const REROLLS: u32 = 8;
        for _ in 0..REROLLS {
            let step = steering::random_step(rng, speed);
            if self.bounds.contains(from + step) {
                return step;
            }
        }
        steering::random_step(rng, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains_and_clamp() {
        let bounds = WorldBounds::new(500.0, 400.0);
        assert!(bounds.contains(Vec2::new(0.0, 0.0)));
        assert!(bounds.contains(Vec2::new(500.0, 400.0)));
        assert!(!bounds.contains(Vec2::new(-0.1, 10.0)));
        assert!(!bounds.contains(Vec2::new(10.0, 400.1)));
        assert_eq!(
            bounds.clamp(Vec2::new(-5.0, 900.0)),
            Vec2::new(0.0, 400.0)
        );
    }

    #[test]
    fn test_world_new_is_empty_until_seeded() {
        let world = World::new(AppConfig::default(), EventSink::disabled());
        assert_eq!(world.census(), 0);
        assert_eq!(world.tick(), 0);
        assert!(world.snapshot().is_empty());
    }

    #[test]
    fn test_stats_average_energy() {
        let config = AppConfig::default();
        let world = World::new(config.clone(), EventSink::disabled());
        for _ in 0..4 {
            world.rabbits.try_add(Arc::new(Creature::new_rabbit(
                Vec2::new(10.0, 10.0),
                Genome::founder(&config.rabbit),
            )));
        }
        let stats = world.stats();
        assert_eq!(stats.rabbits, 4);
        assert_eq!(stats.avg_rabbit_energy, config.rabbit.starting_energy);
    }
}
