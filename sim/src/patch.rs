//! Partial spawn/update patches, one per entity kind.
//!
//! A patch only touches the fields it specifies. The same patch type
//! supplies overrides at spawn time (unspecified fields take generated
//! defaults) and partial updates afterwards. Applying a patch twice yields
//! the same state as applying it once.
//!
//! Invalid values (non-positive mass, negative frequency, non-finite
//! vectors) are skipped rather than rejected.

use crate::components::*;
use crate::constants::*;
use crate::vector::{normalize_or_zero, Vec3};
use serde::{Deserialize, Serialize};

fn valid_vec(v: Option<Vec3>) -> Option<Vec3> {
    v.filter(|v| v.is_finite())
}

fn valid_mass(m: Option<f64>) -> Option<f64> {
    match m {
        Some(mass) if mass.is_finite() && mass > 0.0 => Some(mass),
        Some(mass) => {
            tracing::debug!(mass, "ignoring non-positive mass");
            None
        }
        None => None,
    }
}

/// Rescale a photon velocity to exactly `C_SIM`, keeping direction.
///
/// Falls back to `fallback`'s direction, then to +X, when `v` is degenerate.
pub fn photon_velocity(v: Vec3, fallback: Vec3) -> Vec3 {
    let dir = normalize_or_zero(v);
    let dir = if dir != Vec3::ZERO {
        dir
    } else {
        let back = normalize_or_zero(fallback);
        if back != Vec3::ZERO {
            back
        } else {
            Vec3::X
        }
    };
    dir * C_SIM
}

// ============================================================================
// MASS BODY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassPatch {
    pub name: Option<String>,
    pub mass: Option<f64>,
    pub position: Option<Vec3>,
    pub velocity: Option<Vec3>,
    pub spin: Option<Vec3>,
    pub kind: Option<BodyKind>,
    pub color: Option<String>,
}

impl MassPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Vec3::new(x, y, z));
        self
    }

    pub fn velocity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.velocity = Some(Vec3::new(x, y, z));
        self
    }

    pub fn spin(mut self, x: f64, y: f64, z: f64) -> Self {
        self.spin = Some(Vec3::new(x, y, z));
        self
    }

    pub fn kind(mut self, kind: BodyKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Build a new body from this patch and generated defaults.
    pub fn into_bundle(&self, id: EntityId) -> MassBundle {
        let body = MassBody::new(
            self.name.clone().unwrap_or_else(|| format!("Mass {id}")),
            valid_mass(self.mass).unwrap_or(DEFAULT_MASS),
            self.kind.unwrap_or_default(),
        )
        .with_spin(valid_vec(self.spin).unwrap_or(Vec3::ZERO));
        MassBundle {
            id,
            body,
            position: Position(valid_vec(self.position).unwrap_or(Vec3::ZERO)),
            velocity: Velocity(valid_vec(self.velocity).unwrap_or(Vec3::ZERO)),
            color: ColorTag::new(self.color.as_deref().unwrap_or(MASS_COLOR)),
        }
    }

    pub fn apply_body(&self, body: &mut MassBody) {
        if let Some(name) = &self.name {
            body.name.clone_from(name);
        }
        if let Some(mass) = valid_mass(self.mass) {
            body.mass = mass;
        }
        if let Some(spin) = valid_vec(self.spin) {
            body.set_spin(spin);
        }
        if let Some(kind) = self.kind {
            body.kind = kind;
        }
    }

    pub fn apply_motion(&self, position: &mut Position, velocity: &mut Velocity) {
        if let Some(p) = valid_vec(self.position) {
            position.0 = p;
        }
        if let Some(v) = valid_vec(self.velocity) {
            velocity.0 = v;
        }
    }
}

// ============================================================================
// PHOTON
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonPatch {
    pub position: Option<Vec3>,
    /// Only the direction is used; speed is always `C_SIM`.
    pub velocity: Option<Vec3>,
    pub frequency: Option<f64>,
    pub color: Option<String>,
}

impl PhotonPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Vec3::new(x, y, z));
        self
    }

    pub fn velocity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.velocity = Some(Vec3::new(x, y, z));
        self
    }

    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    fn valid_frequency(&self) -> Option<f64> {
        self.frequency.filter(|f| f.is_finite() && *f >= 0.0)
    }

    pub fn into_bundle(&self, id: EntityId) -> PhotonBundle {
        let v = valid_vec(self.velocity).unwrap_or(Vec3::new(C_SIM, 0.0, 0.0));
        PhotonBundle {
            id,
            photon: Photon {
                frequency: self.valid_frequency(),
            },
            position: Position(valid_vec(self.position).unwrap_or(Vec3::new(-10.0, 0.0, 0.0))),
            velocity: Velocity(photon_velocity(v, Vec3::X)),
            color: ColorTag::new(self.color.as_deref().unwrap_or(PHOTON_COLOR)),
        }
    }

    pub fn apply(&self, photon: &mut Photon, position: &mut Position, velocity: &mut Velocity) {
        if let Some(f) = self.valid_frequency() {
            photon.frequency = Some(f);
        }
        if let Some(p) = valid_vec(self.position) {
            position.0 = p;
        }
        if let Some(v) = valid_vec(self.velocity) {
            velocity.0 = photon_velocity(v, velocity.0);
        }
    }
}

// ============================================================================
// CLOCK
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockPatch {
    pub position: Option<Vec3>,
    pub proper_time: Option<f64>,
    pub color: Option<String>,
}

impl ClockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Vec3::new(x, y, z));
        self
    }

    pub fn proper_time(mut self, t: f64) -> Self {
        self.proper_time = Some(t);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn into_bundle(&self, id: EntityId) -> ClockBundle {
        ClockBundle {
            id,
            clock: GravClock {
                proper_time: self.proper_time.filter(|t| t.is_finite() && *t >= 0.0).unwrap_or(0.0),
            },
            position: Position(valid_vec(self.position).unwrap_or(Vec3::ZERO)),
            color: ColorTag::new(self.color.as_deref().unwrap_or(CLOCK_COLOR)),
        }
    }

    /// Proper time may be reset explicitly; the integrator alone never
    /// decreases it.
    pub fn apply(&self, clock: &mut GravClock, position: &mut Position) {
        if let Some(t) = self.proper_time.filter(|t| t.is_finite() && *t >= 0.0) {
            clock.proper_time = t;
        }
        if let Some(p) = valid_vec(self.position) {
            position.0 = p;
        }
    }
}

// ============================================================================
// TEST BODY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestBodyPatch {
    pub mass: Option<f64>,
    pub position: Option<Vec3>,
    pub velocity: Option<Vec3>,
    pub precession: Option<bool>,
    pub color: Option<String>,
}

impl TestBodyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Vec3::new(x, y, z));
        self
    }

    pub fn velocity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.velocity = Some(Vec3::new(x, y, z));
        self
    }

    pub fn precession(mut self, enabled: bool) -> Self {
        self.precession = Some(enabled);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn into_bundle(&self, id: EntityId) -> TestBodyBundle {
        TestBodyBundle {
            id,
            body: TestBody {
                mass: valid_mass(self.mass).unwrap_or(DEFAULT_TEST_BODY_MASS),
                precession: self.precession,
            },
            position: Position(valid_vec(self.position).unwrap_or(Vec3::new(-10.0, 0.0, 0.0))),
            velocity: Velocity(valid_vec(self.velocity).unwrap_or(Vec3::new(5.0, 0.0, 0.0))),
            color: ColorTag::new(self.color.as_deref().unwrap_or(TEST_BODY_COLOR)),
        }
    }

    pub fn apply(&self, body: &mut TestBody, position: &mut Position, velocity: &mut Velocity) {
        if let Some(mass) = valid_mass(self.mass) {
            body.mass = mass;
        }
        if let Some(precession) = self.precession {
            body.precession = Some(precession);
        }
        if let Some(p) = valid_vec(self.position) {
            position.0 = p;
        }
        if let Some(v) = valid_vec(self.velocity) {
            velocity.0 = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_defaults() {
        let bundle = MassPatch::new().into_bundle(EntityId(3));
        assert_eq!(bundle.body.name, "Mass 3");
        assert_eq!(bundle.body.mass, DEFAULT_MASS);
        assert_eq!(bundle.body.kind, BodyKind::Star);
        assert_eq!(bundle.color.0, MASS_COLOR);
    }

    #[test]
    fn test_invalid_mass_falls_back() {
        let bundle = MassPatch::new().mass(-2.0).into_bundle(EntityId(1));
        assert_eq!(bundle.body.mass, DEFAULT_MASS);

        let mut body = MassBody::new("m", 4.0, BodyKind::Planet);
        MassPatch::new().mass(0.0).apply_body(&mut body);
        assert_eq!(body.mass, 4.0);
    }

    #[test]
    fn test_mass_patch_idempotent() {
        let patch = MassPatch::new().mass(9.0).spin(0.0, 3.0, 0.0).kind(BodyKind::BlackHole);
        let mut once = MassBody::new("m", 4.0, BodyKind::Planet);
        patch.apply_body(&mut once);
        let mut twice = once.clone();
        patch.apply_body(&mut twice);
        assert_eq!(once, twice);
        assert!(once.spin.length() <= SPIN_MAX + 1e-12);
    }

    #[test]
    fn test_photon_speed_pinned() {
        let bundle = PhotonPatch::new().velocity(0.0, 3.0, 4.0).into_bundle(EntityId(1));
        assert!((bundle.velocity.0.length() - C_SIM).abs() < 1e-12);
        assert!((bundle.velocity.0.z - 8.0).abs() < 1e-12);

        let mut photon = bundle.photon;
        let mut pos = bundle.position;
        let mut vel = bundle.velocity;
        PhotonPatch::new().velocity(0.0, 0.0, 0.0).apply(&mut photon, &mut pos, &mut vel);
        assert!((vel.0.length() - C_SIM).abs() < 1e-12);
        assert!((vel.0.z - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_photon_negative_frequency_ignored() {
        let bundle = PhotonPatch::new().frequency(-1.0).into_bundle(EntityId(1));
        assert_eq!(bundle.photon.frequency, None);
    }

    #[test]
    fn test_photon_velocity_fallbacks() {
        assert_eq!(photon_velocity(Vec3::ZERO, Vec3::ZERO), Vec3::new(C_SIM, 0.0, 0.0));
        assert_eq!(photon_velocity(Vec3::ZERO, Vec3::new(0.0, -2.0, 0.0)), Vec3::new(0.0, -C_SIM, 0.0));
    }

    #[test]
    fn test_test_body_defaults() {
        let bundle = TestBodyPatch::new().into_bundle(EntityId(2));
        assert_eq!(bundle.body.mass, DEFAULT_TEST_BODY_MASS);
        assert_eq!(bundle.position.0, Vec3::new(-10.0, 0.0, 0.0));
        assert_eq!(bundle.velocity.0, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(bundle.body.precession, None);
    }

    #[test]
    fn test_patch_json() {
        let patch: MassPatch = serde_json::from_str(r#"{"mass": 12.0, "kind": "blackHole"}"#).unwrap();
        assert_eq!(patch.mass, Some(12.0));
        assert_eq!(patch.kind, Some(BodyKind::BlackHole));
        assert_eq!(patch.name, None);
    }
}
