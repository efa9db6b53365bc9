//! Telemetry events emitted off the tick path.
//!
//! Delivery is fire-and-forget over an unbounded channel: `emit` never
//! blocks, and a slow (or absent) consumer costs the simulation nothing but
//! memory. Each creature thread carries its own clone of the sink.

use crate::model::creature::{Creature, CreatureSnapshot};
use chrono::{DateTime, Utc};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A creature was created and registered.
    Born,
    /// An animal ran out of energy paying upkeep.
    Starved,
    /// An animal was taken by a predator.
    Consumed,
    /// A plant's last bite was taken.
    Eaten,
}

#[derive(Debug, Clone)]
pub struct SimEvent {
    pub kind: EventKind,
    pub at: DateTime<Utc>,
    pub creature: CreatureSnapshot,
}

#[derive(Clone)]
pub struct EventSink {
    tx: Option<Sender<SimEvent>>,
}

impl EventSink {
    /// A connected sink plus the receiving end for the telemetry consumer.
    pub fn channel() -> (Self, Receiver<SimEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops everything. Used when nobody is listening.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, kind: EventKind, creature: &Creature) {
        if let Some(tx) = &self.tx {
            // A hung-up receiver is not our problem; keep simulating.
            let _ = tx.send(SimEvent {
                kind,
                at: Utc::now(),
                creature: creature.snapshot(),
            });
        }
    }
}
