use meadow::model::config::AppConfig;
use meadow::model::creature::Creature;
use meadow::model::events::{EventSink, SimEvent};
use meadow::model::genome::Genome;
use meadow::model::steering::Vec2;
use meadow::model::world::World;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

#[allow(dead_code)]
pub struct WorldBuilder {
    config: AppConfig,
    with_events: bool,
}

#[allow(dead_code)]
impl WorldBuilder {
    /// Empty world, fast ticks. Populations are opt-in per test.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.initial_plants = 0;
        config.world.initial_rabbits = 0;
        config.world.initial_foxes = 0;
        config.world.tick_interval_ms = 0;
        Self {
            config,
            with_events: false,
        }
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_events(mut self) -> Self {
        self.with_events = true;
        self
    }

    pub fn build(self) -> (Arc<World>, Option<Receiver<SimEvent>>) {
        let (sink, rx) = if self.with_events {
            let (sink, rx) = EventSink::channel();
            (sink, Some(rx))
        } else {
            (EventSink::disabled(), None)
        };
        (World::new(self.config, sink), rx)
    }
}

#[allow(dead_code)]
pub fn rabbit_at(config: &AppConfig, x: f64, y: f64) -> Arc<Creature> {
    Arc::new(Creature::new_rabbit(
        Vec2::new(x, y),
        Genome::founder(&config.rabbit),
    ))
}

#[allow(dead_code)]
pub fn fox_at(config: &AppConfig, x: f64, y: f64) -> Arc<Creature> {
    Arc::new(Creature::new_fox(Vec2::new(x, y), &config.fox))
}

#[allow(dead_code)]
pub fn plant_at(x: f64, y: f64, food_value: u32) -> Arc<Creature> {
    Arc::new(Creature::new_plant(Vec2::new(x, y), food_value))
}
