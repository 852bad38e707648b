//! ECS Components for the relativity simulation.
//!
//! Components are pure data containers attached to entities.
//! All physics lives in systems that query these components.

use crate::constants::SPIN_MAX;
use crate::vector::{clamp_length, Vec3};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable identifier shared by every entity kind and effect.
#[derive(
    Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rendering-only color tag. Opaque to the simulation.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTag(pub String);

impl ColorTag {
    pub fn new(color: impl Into<String>) -> Self {
        Self(color.into())
    }
}

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// World-space position.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

/// World-space velocity.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

impl Velocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

// ============================================================================
// MASSIVE BODIES
// ============================================================================

/// Classifier for massive bodies. Drives effective radius and merger rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyKind {
    BlackHole,
    NeutronStar,
    #[default]
    Star,
    Planet,
}

impl BodyKind {
    /// Coefficient applied to `cbrt(mass)` to get the collision radius.
    pub fn radius_coefficient(&self) -> f64 {
        match self {
            BodyKind::BlackHole => 0.2,
            BodyKind::NeutronStar => 0.35,
            BodyKind::Planet => 0.4,
            BodyKind::Star => 0.6,
        }
    }

    /// Effective collision radius for a body of this kind and `mass`.
    #[inline]
    pub fn effective_radius(&self, mass: f64) -> f64 {
        mass.max(0.0).cbrt() * self.radius_coefficient()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::BlackHole => "blackHole",
            BodyKind::NeutronStar => "neutronStar",
            BodyKind::Star => "star",
            BodyKind::Planet => "planet",
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gravitating body: black hole, neutron star, star or planet.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassBody {
    pub name: String,
    /// Always > 0.
    pub mass: f64,
    /// Dimensionless spin; direction is the spin axis, magnitude <= `SPIN_MAX`.
    pub spin: Vec3,
    pub kind: BodyKind,
}

impl MassBody {
    pub fn new(name: impl Into<String>, mass: f64, kind: BodyKind) -> Self {
        Self {
            name: name.into(),
            mass,
            spin: Vec3::ZERO,
            kind,
        }
    }

    pub fn with_spin(mut self, spin: Vec3) -> Self {
        self.set_spin(spin);
        self
    }

    /// Set the spin vector, clamping its magnitude.
    pub fn set_spin(&mut self, spin: Vec3) {
        self.spin = clamp_spin(spin);
    }

    pub fn radius(&self) -> f64 {
        self.kind.effective_radius(self.mass)
    }

    pub fn is_black_hole(&self) -> bool {
        self.kind == BodyKind::BlackHole
    }
}

/// Clamp a spin vector's magnitude to `SPIN_MAX`.
#[inline]
pub fn clamp_spin(spin: Vec3) -> Vec3 {
    if !spin.is_finite() {
        return Vec3::ZERO;
    }
    clamp_length(spin, SPIN_MAX)
}

// ============================================================================
// PROBES
// ============================================================================

/// Light-like particle. Speed is pinned to `C_SIM`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Photon {
    /// Emitted frequency, used only for Doppler tinting by renderers.
    pub frequency: Option<f64>,
}

/// Static probe accumulating proper time.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GravClock {
    pub proper_time: f64,
}

/// Massless probe moving under gravity. Never collides.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestBody {
    pub mass: f64,
    /// `Some(false)` opts out of the precession correction.
    pub precession: Option<bool>,
}

impl TestBody {
    /// Whether the precession term applies given the global gate.
    #[inline]
    pub fn precesses(&self, globally_enabled: bool) -> bool {
        globally_enabled && self.precession.unwrap_or(true)
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a massive body.
#[derive(Bundle)]
pub struct MassBundle {
    pub id: EntityId,
    pub body: MassBody,
    pub position: Position,
    pub velocity: Velocity,
    pub color: ColorTag,
}

/// Bundle for spawning a photon.
#[derive(Bundle)]
pub struct PhotonBundle {
    pub id: EntityId,
    pub photon: Photon,
    pub position: Position,
    pub velocity: Velocity,
    pub color: ColorTag,
}

/// Bundle for spawning a clock. Clocks have no velocity.
#[derive(Bundle)]
pub struct ClockBundle {
    pub id: EntityId,
    pub clock: GravClock,
    pub position: Position,
    pub color: ColorTag,
}

/// Bundle for spawning a test body.
#[derive(Bundle)]
pub struct TestBodyBundle {
    pub id: EntityId,
    pub body: TestBody,
    pub position: Position,
    pub velocity: Velocity,
    pub color: ColorTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_radius_by_kind() {
        let m = 27.0;
        assert!((BodyKind::BlackHole.effective_radius(m) - 0.6).abs() < 1e-12);
        assert!((BodyKind::NeutronStar.effective_radius(m) - 1.05).abs() < 1e-12);
        assert!((BodyKind::Planet.effective_radius(m) - 1.2).abs() < 1e-12);
        assert!((BodyKind::Star.effective_radius(m) - 1.8).abs() < 1e-12);
        assert_eq!(BodyKind::default(), BodyKind::Star);
    }

    #[test]
    fn test_spin_is_clamped() {
        let body = MassBody::new("bh", 10.0, BodyKind::BlackHole).with_spin(Vec3::new(0.0, 5.0, 0.0));
        assert!(body.spin.length() <= SPIN_MAX + 1e-12);
        assert!(body.spin.y > 0.0);
        assert_eq!(clamp_spin(Vec3::new(f64::NAN, 0.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_precession_gate() {
        let default_flag = TestBody { mass: 1.0, precession: None };
        let opted_out = TestBody { mass: 1.0, precession: Some(false) };
        assert!(default_flag.precesses(true));
        assert!(!default_flag.precesses(false));
        assert!(!opted_out.precesses(true));
    }

    #[test]
    fn test_kind_serializes_camel_case() {
        let json = serde_json::to_string(&BodyKind::NeutronStar).unwrap();
        assert_eq!(json, "\"neutronStar\"");
    }
}
