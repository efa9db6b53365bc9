//! meadow: a tick-synchronized predator/prey/producer simulation.
//!
//! Every live creature runs on its own thread. Each tick it senses its
//! neighbors through guarded per-species registries, blends what it sensed
//! into a steering vector, moves, feeds, maybe reproduces, pays upkeep, and
//! then waits at a generational barrier until every other live creature has
//! done the same. The barrier's participant count is recomputed on every
//! arrival, because births and deaths change it every tick.

pub mod model;
