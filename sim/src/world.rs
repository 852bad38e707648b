//! Snapshot types.
//!
//! The `Snapshot` struct is the serializable view of the simulation state
//! handed to renderers and UI panels. Every collection is sorted by id.

use crate::components::*;
use crate::config::SimConfig;
use crate::effects::Effect;
use crate::field::{self, MassSample};
use crate::systems::tick::SimStats;
use crate::vector::Vec3;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single massive body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassSnapshot {
    pub id: EntityId,
    pub name: String,
    pub kind: BodyKind,
    pub mass: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub spin: Vec3,
    /// Effective collision radius.
    pub radius: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotonSnapshot {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub frequency: Option<f64>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub id: EntityId,
    pub position: Vec3,
    pub proper_time: f64,
    /// Current dilation factor at the clock's position.
    pub rate: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestBodySnapshot {
    pub id: EntityId,
    pub mass: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub precession: Option<bool>,
    pub color: String,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Substeps executed.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f64,
    pub masses: Vec<MassSnapshot>,
    pub photons: Vec<PhotonSnapshot>,
    pub clocks: Vec<ClockSnapshot>,
    pub test_bodies: Vec<TestBodySnapshot>,
    /// Live effects in emission order.
    pub effects: Vec<Effect>,
    pub config: SimConfig,
    pub stats: SimStats,
}

/// Current massive bodies as field samples, ordered by id.
pub fn mass_samples(world: &mut World) -> Vec<MassSample> {
    let mut query = world.query::<(&EntityId, &MassBody, &Position, &Velocity)>();
    let mut bodies: Vec<MassSample> = query
        .iter(world)
        .map(|(id, body, pos, vel)| MassSample {
            id: *id,
            mass: body.mass,
            position: pos.0,
            velocity: vel.0,
            spin: body.spin,
            kind: body.kind,
        })
        .collect();
    bodies.sort_by_key(|b| b.id);
    bodies
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f64) -> Self {
        let mut masses: Vec<MassSnapshot> = world
            .query::<(&EntityId, &MassBody, &Position, &Velocity, &ColorTag)>()
            .iter(world)
            .map(|(id, body, pos, vel, color)| MassSnapshot {
                id: *id,
                name: body.name.clone(),
                kind: body.kind,
                mass: body.mass,
                position: pos.0,
                velocity: vel.0,
                spin: body.spin,
                radius: body.radius(),
                color: color.0.clone(),
            })
            .collect();
        masses.sort_by_key(|m| m.id);

        let mut photons: Vec<PhotonSnapshot> = world
            .query::<(&EntityId, &Photon, &Position, &Velocity, &ColorTag)>()
            .iter(world)
            .map(|(id, photon, pos, vel, color)| PhotonSnapshot {
                id: *id,
                position: pos.0,
                velocity: vel.0,
                frequency: photon.frequency,
                color: color.0.clone(),
            })
            .collect();
        photons.sort_by_key(|p| p.id);

        let bodies = mass_samples(world);
        let mut clocks: Vec<ClockSnapshot> = world
            .query::<(&EntityId, &GravClock, &Position, &ColorTag)>()
            .iter(world)
            .map(|(id, clock, pos, color)| ClockSnapshot {
                id: *id,
                position: pos.0,
                proper_time: clock.proper_time,
                rate: field::time_dilation_factor(pos.0, &bodies),
                color: color.0.clone(),
            })
            .collect();
        clocks.sort_by_key(|c| c.id);

        let mut test_bodies: Vec<TestBodySnapshot> = world
            .query::<(&EntityId, &TestBody, &Position, &Velocity, &ColorTag)>()
            .iter(world)
            .map(|(id, body, pos, vel, color)| TestBodySnapshot {
                id: *id,
                mass: body.mass,
                position: pos.0,
                velocity: vel.0,
                precession: body.precession,
                color: color.0.clone(),
            })
            .collect();
        test_bodies.sort_by_key(|t| t.id);

        Self {
            tick,
            time,
            masses,
            photons,
            clocks,
            test_bodies,
            effects: world
                .get_resource::<crate::effects::EffectBus>()
                .map(|bus| bus.effects().to_vec())
                .unwrap_or_default(),
            config: world.get_resource::<SimConfig>().cloned().unwrap_or_default(),
            stats: world.get_resource::<SimStats>().copied().unwrap_or_default(),
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
