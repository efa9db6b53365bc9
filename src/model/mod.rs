pub mod barrier;
pub mod config;
pub mod creature;
pub mod error;
pub mod events;
pub mod genome;
pub mod lifecycle;
pub mod registry;
pub mod spatial;
pub mod steering;
pub mod world;

pub use barrier::{Arrival, TickBarrier};
pub use config::AppConfig;
pub use creature::{Consumption, Creature, CreatureSnapshot, SpeciesKind};
pub use error::{Result, SimError};
pub use events::{EventKind, EventSink, SimEvent};
pub use genome::Genome;
pub use registry::SpeciesRegistry;
pub use steering::{Interest, Vec2};
pub use world::{PopulationStats, World, WorldBounds};
