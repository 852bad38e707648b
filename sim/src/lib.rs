//! Relativity sandbox - simulation core
//!
//! A deterministic, fixed-timestep ECS simulation of massive bodies,
//! photons, clocks and test bodies under softened Newtonian gravity with
//! stylized relativistic corrections.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod constants;
pub mod effects;
pub mod error;
pub mod field;
pub mod patch;
pub mod profiler;
pub mod render_bridge;
pub mod systems;
pub mod vector;
pub mod world;

pub use api::{MassInspection, SimWorld};
pub use components::*;
pub use config::{SimConfig, SimConfigPatch};
pub use effects::{Effect, EffectKind};
pub use error::SimError;
pub use field::{FieldDiagnostics, KerrRadii, OrbitalElements};
pub use patch::{ClockPatch, MassPatch, PhotonPatch, TestBodyPatch};
pub use systems::{SimStats, SimTime};
pub use vector::Vec3;
pub use world::Snapshot;
