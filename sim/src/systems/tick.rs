//! Per-substep bookkeeping resources.

use crate::components::EntityId;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Resource containing the fixed delta time for the current substep.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DeltaTime(pub f64);

/// Substep counter and simulation time at the end of the running substep.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    pub tick: u64,
    pub elapsed: f64,
}

impl SimTime {
    pub fn advance(&mut self, dt: f64) {
        self.tick = self.tick.wrapping_add(1);
        self.elapsed += dt;
    }
}

/// Monotonic id source shared by entities and effects. Ids are never reused.
#[derive(Resource, Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Running counters exposed with snapshots.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimStats {
    /// Substeps executed since creation.
    pub substeps: u64,
    /// Merger/disruption outcomes executed.
    pub resolved_collisions: u64,
    /// Overlapping pairs with no outcome rule (they pass through).
    pub unresolved_contacts: u64,
    /// Catch-up time discarded by the substep bound, in seconds.
    pub dropped_time: f64,
}
