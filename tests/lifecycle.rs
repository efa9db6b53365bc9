mod common;

use common::{fox_at, plant_at, rabbit_at, WorldBuilder};
use meadow::model::config::AppConfig;
use meadow::model::creature::Consumption;
use meadow::model::creature::SpeciesKind;
use meadow::model::lifecycle;
use meadow::model::registry::SpeciesRegistry;
use meadow::model::world::WorldBounds;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::thread;

#[test]
fn test_at_most_one_predator_wins_the_same_victim() {
    let config = AppConfig::default();
    for _ in 0..50 {
        let victim = rabbit_at(&config, 10.0, 10.0);
        let gate = Arc::new(std::sync::Barrier::new(2));
        let predators: Vec<_> = (0..2)
            .map(|_| {
                let victim = Arc::clone(&victim);
                let gate = Arc::clone(&gate);
                thread::spawn(move || {
                    gate.wait();
                    victim.consume()
                })
            })
            .collect();
        let outcomes: Vec<Consumption> = predators
            .into_iter()
            .map(|p| p.join().expect("predator panicked"))
            .collect();
        let wins = outcomes
            .iter()
            .filter(|o| **o == Consumption::Flesh)
            .count();
        let losses = outcomes
            .iter()
            .filter(|o| **o == Consumption::Spent)
            .count();
        assert_eq!(wins, 1, "exactly one consume call may succeed");
        assert_eq!(losses, 1);
        assert_eq!(victim.energy(), 0.0);
    }
}

#[test]
fn test_concurrent_bites_exhaust_plant_exactly_once() {
    for _ in 0..50 {
        let plant = plant_at(50.0, 50.0, 3);
        let gate = Arc::new(std::sync::Barrier::new(4));
        let eaters: Vec<_> = (0..4)
            .map(|_| {
                let plant = Arc::clone(&plant);
                let gate = Arc::clone(&gate);
                thread::spawn(move || {
                    gate.wait();
                    plant.consume()
                })
            })
            .collect();
        let outcomes: Vec<Consumption> = eaters
            .into_iter()
            .map(|e| e.join().expect("eater panicked"))
            .collect();
        let last_bites = outcomes
            .iter()
            .filter(|o| **o == Consumption::LastBite)
            .count();
        let bites = outcomes
            .iter()
            .filter(|o| **o == Consumption::Bite)
            .count();
        let spent = outcomes
            .iter()
            .filter(|o| **o == Consumption::Spent)
            .count();
        assert_eq!(last_bites, 1, "exactly one bite may exhaust the plant");
        assert_eq!(bites, 2);
        assert_eq!(spent, 1);
        assert_eq!(plant.bites_left(), 0);
    }
}

#[test]
fn test_population_cap_holds_under_concurrent_additions() {
    let config = AppConfig::default();
    let registry = Arc::new(SpeciesRegistry::new(SpeciesKind::Rabbit, 5));
    for _ in 0..5 {
        assert!(registry.try_add(rabbit_at(&config, 1.0, 1.0)));
    }

    let gate = Arc::new(std::sync::Barrier::new(8));
    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let config = config.clone();
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.wait();
                registry.try_add(rabbit_at(&config, 2.0, 2.0))
            })
        })
        .collect();
    for attempt in attempts {
        assert!(!attempt.join().expect("thread panicked"));
    }
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_world_spawn_refuses_over_cap() {
    let (world, _) = WorldBuilder::new()
        .with_config(|c| {
            c.rabbit.max_population = 2;
            // Nobody starves mid-test and frees a slot.
            c.rabbit.starting_energy = 1e9;
            c.rabbit.reproduce_rate = 0.0;
        })
        .build();
    let config = world.config.clone();
    assert!(world.spawn(rabbit_at(&config, 1.0, 1.0)));
    assert!(world.spawn(rabbit_at(&config, 2.0, 2.0)));
    assert!(!world.spawn(rabbit_at(&config, 3.0, 3.0)));
    assert_eq!(world.rabbits().len(), 2);
    world.request_shutdown();
    world.join_all();
}

#[test]
fn test_thousand_birth_sites_stay_in_annulus_and_bounds() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let bounds = WorldBounds::new(500.0, 500.0);
    let registry = SpeciesRegistry::new(SpeciesKind::Rabbit, 150);
    let config = AppConfig::default();
    let parent = rabbit_at(&config, 100.0, 100.0);
    registry.try_add(Arc::clone(&parent));

    let mut accepted = 0;
    while accepted < 1000 {
        let Some(site) = lifecycle::find_birth_site(
            &mut rng,
            parent.position(),
            30.0,
            50.0,
            &registry,
            &bounds,
        ) else {
            continue;
        };
        let distance = site.distance_to(parent.position());
        assert!(
            (30.0..=50.0).contains(&distance),
            "site {distance} outside [30, 50]"
        );
        assert!(bounds.contains(site), "site out of bounds: {site:?}");
        accepted += 1;
    }
}

#[test]
fn test_birth_attempt_bound_is_respected_near_the_edge() {
    let mut rng = ChaCha8Rng::seed_from_u64(100);
    // A world so small that the whole annulus lies out of bounds: every one
    // of the bounded attempts must fail and the birth is abandoned.
    let bounds = WorldBounds::new(20.0, 20.0);
    let config = AppConfig::default();
    let registry = SpeciesRegistry::new(SpeciesKind::Fox, 50);
    let parent = fox_at(&config, 10.0, 10.0);
    registry.try_add(Arc::clone(&parent));
    for _ in 0..100 {
        assert!(lifecycle::find_birth_site(
            &mut rng,
            parent.position(),
            30.0,
            50.0,
            &registry,
            &bounds
        )
        .is_none());
    }
}
