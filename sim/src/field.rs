//! Gravitational field model.
//!
//! Newtonian gravity with a softening length, the weak-field time dilation
//! approximation and a stylized frame-dragging correction. None of this is
//! metric-accurate GR; the functional forms are kept for visual behaviour.
//!
//! All functions are pure and O(n) in the number of massive bodies. During
//! a substep they are evaluated against `MassField`, the mass snapshot
//! captured at the start of that substep.

use crate::components::{BodyKind, EntityId};
use crate::constants::*;
use crate::vector::Vec3;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Read-only view of one massive body used for field evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassSample {
    pub id: EntityId,
    pub mass: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub spin: Vec3,
    pub kind: BodyKind,
}

/// Mass snapshot for the current substep.
#[derive(Resource, Debug, Clone, Default)]
pub struct MassField {
    pub bodies: Vec<MassSample>,
}

/// Acceleration at `point` from all `bodies`.
pub fn acceleration(point: Vec3, bodies: &[MassSample]) -> Vec3 {
    acceleration_excluding(point, bodies, None)
}

/// Acceleration at `point`, skipping the body with id `exclude`.
pub fn acceleration_excluding(point: Vec3, bodies: &[MassSample], exclude: Option<EntityId>) -> Vec3 {
    let mut total = Vec3::ZERO;
    for body in bodies {
        if Some(body.id) == exclude {
            continue;
        }
        let d = body.position - point;
        let r2 = d.length_squared() + EPSILON * EPSILON;
        let inv_r3 = 1.0 / (r2 * r2.sqrt());
        total += d * (G_SIM * body.mass * inv_r3);
    }
    total
}

/// Gravitational potential at `point`.
pub fn potential(point: Vec3, bodies: &[MassSample]) -> f64 {
    bodies
        .iter()
        .map(|body| {
            let r = (body.position.distance_squared(point) + EPSILON * EPSILON).sqrt();
            -G_SIM * body.mass / r
        })
        .sum()
}

/// Weak-field proper-time rate `sqrt(1 + 2Φ/c²)`.
///
/// Clamped to 0 where the well is deep enough (Φ < -c²/2) for the
/// approximation to break down.
pub fn time_dilation_factor(point: Vec3, bodies: &[MassSample]) -> f64 {
    let phi = potential(point, bodies);
    (1.0 + 2.0 * phi / (C_SIM * C_SIM)).max(0.0).sqrt()
}

/// Stylized Lense-Thirring velocity correction over one substep.
///
/// Each spinning body contributes an angular velocity
/// `ω = k G m / (c² r³) · spin` about its spin axis; the correction is
/// `Σ (ω × velocity) dt`.
pub fn frame_dragging_delta_v(point: Vec3, velocity: Vec3, bodies: &[MassSample], dt: f64) -> Vec3 {
    let mut dv = Vec3::ZERO;
    for body in bodies {
        if body.spin.length() <= SPIN_EPSILON {
            continue;
        }
        let r2 = body.position.distance_squared(point) + EPSILON * EPSILON;
        let r3 = r2 * r2.sqrt();
        let omega = body.spin * (FRAME_DRAG_STRENGTH * G_SIM * body.mass / (C_SIM * C_SIM * r3));
        dv += omega.cross(velocity) * dt;
    }
    dv
}

/// Extra tangential acceleration on a test body producing apsidal drift.
///
/// Per body: `strength · G m / r² · rs / r` along `L̂ × r̂`, with
/// `rs = 2 G m / c²`. Bodies with degenerate geometry contribute nothing.
pub fn precession_acceleration(point: Vec3, velocity: Vec3, bodies: &[MassSample], strength: f64) -> Vec3 {
    let mut total = Vec3::ZERO;
    for body in bodies {
        let r_vec = point - body.position;
        let r = r_vec.length();
        if r <= EPSILON * 1e-3 {
            continue;
        }
        let r_hat = r_vec / r;
        let l_hat = r_vec.cross(velocity).normalize_or_zero();
        if l_hat == Vec3::ZERO {
            continue;
        }
        let t_hat = l_hat.cross(r_hat);
        let rs = 2.0 * G_SIM * body.mass / (C_SIM * C_SIM);
        let magnitude = strength * G_SIM * body.mass / (r * r) * (rs / r);
        total += t_hat * magnitude;
    }
    total
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Stylized Kerr radii for a spinning black hole, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KerrRadii {
    /// Outer horizon r+.
    pub horizon: f64,
    /// Equatorial static limit (ergosphere boundary).
    pub static_limit_equator: f64,
}

/// Horizon and equatorial ergosphere radii from mass and spin magnitude.
pub fn kerr_radii(mass: f64, spin_magnitude: f64) -> KerrRadii {
    let m = mass.max(1e-4);
    let a = spin_magnitude.clamp(0.0, SPIN_MAX) * m;
    let r_plus = m + (m * m - a * a).max(0.0).sqrt();
    KerrRadii {
        horizon: r_plus * KERR_VISUAL_SCALE,
        static_limit_equator: 2.0 * m * KERR_VISUAL_SCALE,
    }
}

/// Osculating two-body orbital elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub specific_energy: f64,
    pub eccentricity: f64,
    /// Points at periapsis; its direction is the apsidal line.
    pub eccentricity_vector: Vec3,
    pub is_bound: bool,
    pub semi_major_axis: Option<f64>,
    pub periapsis: Option<f64>,
    pub apoapsis: Option<f64>,
}

/// Orbital elements of a body at `rel_position`/`rel_velocity` around a
/// central mass with gravitational parameter `mu`.
pub fn orbital_elements(rel_position: Vec3, rel_velocity: Vec3, mu: f64) -> Option<OrbitalElements> {
    let r = rel_position.length();
    if r <= 0.0 || mu <= 0.0 {
        return None;
    }
    let v2 = rel_velocity.length_squared();
    let energy = 0.5 * v2 - mu / r;
    let h = rel_position.cross(rel_velocity);
    let e_vec = rel_velocity.cross(h) / mu - rel_position / r;
    let e = e_vec.length();
    let is_bound = energy < 0.0;
    let semi_major_axis = is_bound.then(|| -mu / (2.0 * energy));
    Some(OrbitalElements {
        specific_energy: energy,
        eccentricity: e,
        eccentricity_vector: e_vec,
        is_bound,
        semi_major_axis,
        periapsis: semi_major_axis.map(|a| a * (1.0 - e)),
        apoapsis: semi_major_axis.filter(|_| e < 1.0).map(|a| a * (1.0 + e)),
    })
}

/// Field values at a point, for inspector panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDiagnostics {
    pub potential: f64,
    pub time_dilation: f64,
    /// Nearest black hole and its stylized radii, if any exists.
    pub nearest_black_hole: Option<HorizonInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonInfo {
    pub id: EntityId,
    pub distance: f64,
    pub radii: KerrRadii,
}

pub fn diagnostics(point: Vec3, bodies: &[MassSample]) -> FieldDiagnostics {
    let nearest_black_hole = bodies
        .iter()
        .filter(|b| b.kind == BodyKind::BlackHole)
        .map(|b| (b, b.position.distance(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(b, distance)| HorizonInfo {
            id: b.id,
            distance,
            radii: kerr_radii(b.mass, b.spin.length()),
        });
    FieldDiagnostics {
        potential: potential(point, bodies),
        time_dilation: time_dilation_factor(point, bodies),
        nearest_black_hole,
    }
}

/// Sample the potential on a `resolution × resolution` grid spanning
/// `[-extent, extent]` on the XZ plane (y = 0), row-major along Z.
pub fn sample_potential_grid(bodies: &[MassSample], extent: f64, resolution: usize) -> Vec<f64> {
    if resolution == 0 {
        return Vec::new();
    }
    let step = if resolution > 1 {
        2.0 * extent / (resolution - 1) as f64
    } else {
        0.0
    };
    let sample = |i: usize| {
        let row = i / resolution;
        let col = i % resolution;
        let point = Vec3::new(-extent + col as f64 * step, 0.0, -extent + row as f64 * step);
        potential(point, bodies)
    };

    #[cfg(feature = "parallel")]
    {
        (0..resolution * resolution).into_par_iter().map(sample).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..resolution * resolution).map(sample).collect()
    }
}
