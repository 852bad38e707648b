//! Public API for the simulation.
//!
//! This module provides the main interface for a renderer or UI host to
//! drive the simulation, issue commands and read state.
//!
//! ## Fixed Timestep
//!
//! The simulation runs fixed substeps of `SimConfig::dt`. When
//! `advance(elapsed)` is called, the elapsed frame time is accumulated and
//! substeps run while at least one whole step is pending. Pausing stops the
//! draining but keeps accumulating, so resuming catches up on the paused
//! interval.
//!
//! ## Substep
//!
//! 1. capture the mass snapshot (`MassField`)
//! 2. integrate photons, clocks, massive bodies and test bodies
//! 3. resolve collisions (mutations land before the next substep)

use crate::components::*;
use crate::config::{SimConfig, SimConfigPatch};
use crate::effects::{Effect, EffectBus};
use crate::error::SimError;
use crate::field::{self, FieldDiagnostics, KerrRadii, MassField, MassSample, OrbitalElements};
use crate::patch::{ClockPatch, MassPatch, PhotonPatch, TestBodyPatch};
use crate::render_bridge;
use crate::systems::*;
use crate::vector::Vec3;
use crate::world::{mass_samples, Snapshot};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "profile")]
use crate::profiler::Profiler;

/// Inspector view of one massive body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassInspection {
    pub id: EntityId,
    pub name: String,
    pub kind: BodyKind,
    pub mass: f64,
    pub radius: f64,
    /// Field of all bodies, this one included, at its position.
    pub field: FieldDiagnostics,
    /// Osculating orbit about the barycentre of the other bodies.
    pub orbit: Option<OrbitalElements>,
    /// Present for black holes only.
    pub kerr: Option<KerrRadii>,
}

/// The main simulation world container.
///
/// Holds the ECS world and schedules, providing a clean API for:
/// - Spawning, patching and removing entities
/// - Stepping the simulation forward
/// - Extracting snapshots and field diagnostics
pub struct SimWorld {
    world: World,
    integrate: Schedule,
    resolve: Schedule,
    /// Accumulated time for fixed timestep.
    time_accumulator: f64,
    #[cfg(feature = "profile")]
    profiler: Profiler,
}

impl SimWorld {
    /// Create a new empty simulation world.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.dt));
        world.insert_resource(config);
        world.insert_resource(SimTime::default());
        world.insert_resource(SimStats::default());
        world.insert_resource(IdAllocator::default());
        world.insert_resource(MassField::default());
        world.insert_resource(EffectBus::default());

        let mut integrate = Schedule::default();
        integrate.add_systems(
            (
                capture_mass_field_system,
                photon_step_system,
                clock_step_system,
                mass_step_system,
                test_body_step_system,
            )
                .chain(),
        );

        let mut resolve = Schedule::default();
        resolve.add_systems(collision_system);

        Self {
            world,
            integrate,
            resolve,
            time_accumulator: 0.0,
            #[cfg(feature = "profile")]
            profiler: Profiler::new(),
        }
    }

    /// A 20-mass black hole at the origin with clocks at r = 5 and r = 10.
    pub fn new_default_scene() -> Self {
        let mut sim = Self::new();
        sim.seed_default_scene();
        sim
    }

    fn seed_default_scene(&mut self) {
        self.spawn_mass(
            MassPatch::new()
                .name("Black Hole")
                .mass(20.0)
                .kind(BodyKind::BlackHole)
                .color("#ff8800"),
        );
        self.spawn_clock(ClockPatch::new().position(5.0, 0.0, 0.0).color("#00ff88"));
        self.spawn_clock(ClockPatch::new().position(10.0, 0.0, 0.0).color("#ffffff"));
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advance the simulation by `elapsed` seconds of frame time.
    ///
    /// Returns the number of substeps executed.
    pub fn advance(&mut self, elapsed: f64) -> usize {
        if !elapsed.is_finite() || elapsed < 0.0 {
            tracing::warn!(elapsed, "ignoring invalid elapsed time");
            return 0;
        }
        self.time_accumulator += elapsed;

        let (dt, paused, max_substeps) = {
            let config = self.config();
            (config.dt, config.paused, config.max_substeps_per_tick)
        };
        if paused {
            return 0;
        }

        // whole steps are counted up front; repeated subtraction stalls
        // once the accumulator dwarfs dt
        let remainder = self.time_accumulator % dt;
        let whole = ((self.time_accumulator - remainder) / dt).round() as u64;
        self.time_accumulator = remainder;

        let steps = match max_substeps {
            Some(max) if whole > u64::from(max) => {
                self.record_dropped_steps(whole - u64::from(max), dt);
                u64::from(max)
            }
            _ => whole,
        };
        for _ in 0..steps {
            self.fixed_update(dt);
        }
        steps as usize
    }

    /// Account for whole steps discarded by the substep bound.
    fn record_dropped_steps(&mut self, count: u64, dt: f64) {
        let dropped = count as f64 * dt;
        let mut stats = self.world.resource_mut::<SimStats>();
        stats.dropped_time += dropped;
        tracing::warn!(dropped, total_dropped = stats.dropped_time, "substep bound reached, dropping time");
    }

    /// Run a single fixed substep.
    fn fixed_update(&mut self, dt: f64) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SimTime>().advance(dt);
        self.world.resource_mut::<SimStats>().substeps += 1;

        #[cfg(feature = "profile")]
        {
            self.profiler
                .time_section("integrate", || self.integrate.run(&mut self.world));
            self.profiler
                .time_section("resolve", || self.resolve.run(&mut self.world));
            self.profiler.end_substep();
        }

        #[cfg(not(feature = "profile"))]
        {
            self.integrate.run(&mut self.world);
            self.resolve.run(&mut self.world);
        }
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.world.resource::<SimTime>().tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f64 {
        self.world.resource::<SimTime>().elapsed
    }

    /// Time accumulated but not yet consumed by a substep.
    pub fn pending_time(&self) -> f64 {
        self.time_accumulator
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    fn allocate_id(&mut self) -> EntityId {
        self.world.resource_mut::<IdAllocator>().allocate()
    }

    fn find_entity(&mut self, id: EntityId) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &EntityId)>();
        query
            .iter(&self.world)
            .find(|(_, entity_id)| **entity_id == id)
            .map(|(e, _)| e)
    }

    fn apply_color(tag: &mut ColorTag, color: &Option<String>) {
        if let Some(color) = color {
            tag.0.clone_from(color);
        }
    }

    pub fn spawn_mass(&mut self, patch: MassPatch) -> EntityId {
        let id = self.allocate_id();
        let bundle = patch.into_bundle(id);
        tracing::info!(id = %id, kind = %bundle.body.kind, mass = bundle.body.mass, "spawned mass");
        self.world.spawn(bundle);
        id
    }

    pub fn spawn_photon(&mut self, patch: PhotonPatch) -> EntityId {
        let id = self.allocate_id();
        self.world.spawn(patch.into_bundle(id));
        tracing::debug!(id = %id, "spawned photon");
        id
    }

    pub fn spawn_clock(&mut self, patch: ClockPatch) -> EntityId {
        let id = self.allocate_id();
        self.world.spawn(patch.into_bundle(id));
        tracing::debug!(id = %id, "spawned clock");
        id
    }

    pub fn spawn_test_body(&mut self, patch: TestBodyPatch) -> EntityId {
        let id = self.allocate_id();
        self.world.spawn(patch.into_bundle(id));
        tracing::debug!(id = %id, "spawned test body");
        id
    }

    /// Patch a massive body. Returns `false` for unknown ids.
    pub fn update_mass(&mut self, id: EntityId, patch: &MassPatch) -> bool {
        let mut query = self
            .world
            .query::<(&EntityId, &mut MassBody, &mut Position, &mut Velocity, &mut ColorTag)>();
        for (entity_id, mut body, mut pos, mut vel, mut color) in query.iter_mut(&mut self.world) {
            if *entity_id == id {
                patch.apply_body(&mut body);
                patch.apply_motion(&mut pos, &mut vel);
                Self::apply_color(&mut color, &patch.color);
                return true;
            }
        }
        false
    }

    pub fn update_photon(&mut self, id: EntityId, patch: &PhotonPatch) -> bool {
        let mut query = self
            .world
            .query::<(&EntityId, &mut Photon, &mut Position, &mut Velocity, &mut ColorTag)>();
        for (entity_id, mut photon, mut pos, mut vel, mut color) in query.iter_mut(&mut self.world) {
            if *entity_id == id {
                patch.apply(&mut photon, &mut pos, &mut vel);
                Self::apply_color(&mut color, &patch.color);
                return true;
            }
        }
        false
    }

    pub fn update_clock(&mut self, id: EntityId, patch: &ClockPatch) -> bool {
        let mut query = self
            .world
            .query::<(&EntityId, &mut GravClock, &mut Position, &mut ColorTag)>();
        for (entity_id, mut clock, mut pos, mut color) in query.iter_mut(&mut self.world) {
            if *entity_id == id {
                patch.apply(&mut clock, &mut pos);
                Self::apply_color(&mut color, &patch.color);
                return true;
            }
        }
        false
    }

    pub fn update_test_body(&mut self, id: EntityId, patch: &TestBodyPatch) -> bool {
        let mut query = self
            .world
            .query::<(&EntityId, &mut TestBody, &mut Position, &mut Velocity, &mut ColorTag)>();
        for (entity_id, mut body, mut pos, mut vel, mut color) in query.iter_mut(&mut self.world) {
            if *entity_id == id {
                patch.apply(&mut body, &mut pos, &mut vel);
                Self::apply_color(&mut color, &patch.color);
                return true;
            }
        }
        false
    }

    /// Remove any entity by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.find_entity(id) {
            Some(entity) => {
                tracing::debug!(id = %id, "removed entity");
                self.world.despawn(entity)
            }
            None => false,
        }
    }

    /// Remove an effect once the renderer has finished playing it.
    pub fn remove_effect(&mut self, id: EntityId) -> bool {
        self.world.resource_mut::<EffectBus>().remove(id)
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.set_config(SimConfigPatch {
            paused: Some(paused),
            ..Default::default()
        });
    }

    pub fn set_timestep(&mut self, dt: f64) {
        self.set_config(SimConfigPatch {
            dt: Some(dt),
            ..Default::default()
        });
    }

    /// Apply a config patch. Invalid fields are skipped.
    pub fn set_config(&mut self, patch: SimConfigPatch) {
        let mut config = self.world.resource_mut::<SimConfig>();
        config.apply(&patch);
        tracing::debug!(?patch, "config updated");
    }

    /// Apply a config patch supplied as JSON by a host.
    pub fn apply_config_json(&mut self, json: &str) -> Result<(), SimError> {
        let patch = SimConfigPatch::from_json(json)?;
        self.set_config(patch);
        Ok(())
    }

    /// Clear every entity and effect. Configuration is kept and ids keep
    /// counting up from where they were.
    pub fn reset(&mut self) {
        self.world.clear_entities();
        self.world.resource_mut::<EffectBus>().clear();
        self.world.resource_mut::<MassField>().bodies.clear();
        *self.world.resource_mut::<SimTime>() = SimTime::default();
        *self.world.resource_mut::<SimStats>() = SimStats::default();
        self.time_accumulator = 0.0;
        tracing::info!("simulation reset");
    }

    /// Reset and reseed the default scene.
    pub fn reset_to_default_scene(&mut self) {
        self.reset();
        self.seed_default_scene();
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        let time = *self.world.resource::<SimTime>();
        Snapshot::from_world(&mut self.world, time.tick, time.elapsed)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// Live effects in emission order.
    pub fn effects(&self) -> &[Effect] {
        self.world.resource::<EffectBus>().effects()
    }

    /// Ids of effects whose TTL has run out at the current simulation time.
    pub fn expired_effects(&self) -> Vec<EntityId> {
        self.world.resource::<EffectBus>().expired(self.current_time())
    }

    /// Potential, time dilation and the nearest black hole at `point`.
    pub fn diagnostics_at(&mut self, point: Vec3) -> FieldDiagnostics {
        let bodies = mass_samples(&mut self.world);
        field::diagnostics(point, &bodies)
    }

    pub fn inspect_mass(&mut self, id: EntityId) -> Option<MassInspection> {
        let bodies = mass_samples(&mut self.world);
        let entity = self.find_entity(id)?;
        let body = self.world.get::<MassBody>(entity)?.clone();
        let target = bodies.iter().find(|b| b.id == id)?;
        let others: Vec<MassSample> = bodies.iter().filter(|b| b.id != id).copied().collect();

        let total: f64 = others.iter().map(|b| b.mass).sum();
        let orbit = (total > 0.0)
            .then(|| {
                let centre = others.iter().map(|b| b.position * b.mass).sum::<Vec3>() / total;
                let drift = others.iter().map(|b| b.velocity * b.mass).sum::<Vec3>() / total;
                field::orbital_elements(target.position - centre, target.velocity - drift, crate::constants::G_SIM * total)
            })
            .flatten();

        Some(MassInspection {
            id,
            name: body.name.clone(),
            kind: body.kind,
            mass: body.mass,
            radius: body.radius(),
            field: field::diagnostics(target.position, &bodies),
            orbit,
            kerr: body
                .is_black_hole()
                .then(|| field::kerr_radii(body.mass, body.spin.length())),
        })
    }

    /// Potential sampled on the XZ plane, row-major along Z.
    pub fn potential_grid(&mut self, extent: f64, resolution: usize) -> Vec<f64> {
        let bodies = mass_samples(&mut self.world);
        field::sample_potential_grid(&bodies, extent, resolution)
    }

    /// Massive bodies as a flat f32 buffer (see `render_bridge`).
    pub fn masses_to_flatbuffer(&mut self) -> Vec<f32> {
        render_bridge::masses_to_flatbuffer(&self.snapshot())
    }

    /// Photons as a flat f32 buffer (see `render_bridge`).
    pub fn photons_to_flatbuffer(&mut self) -> Vec<f32> {
        render_bridge::photons_to_flatbuffer(&self.snapshot())
    }

    #[cfg(feature = "profile")]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
