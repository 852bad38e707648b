//! ECS systems for the relativity sandbox.
//!
//! Systems contain the per-substep logic that operates on components.
//!
//! ## Substep Order
//!
//! **Integrate** - strictly chained, all reads go through `MassField`:
//! - `capture_mass_field_system` - snapshots every massive body
//! - `photon_step_system` - bends photons, keeps speed at `C_SIM`
//! - `clock_step_system` - accumulates proper time
//! - `mass_step_system` - mutual gravity between massive bodies
//! - `test_body_step_system` - gravity, precession, frame dragging
//!
//! **Resolve** - runs after integration commands are applied:
//! - `collision_system` - mergers and tidal disruption

pub mod collision;
pub mod integration;
pub mod serialization;
pub mod tick;

pub use collision::*;
pub use integration::*;
pub use serialization::*;
pub use tick::*;
