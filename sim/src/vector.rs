//! 3-component vector helpers on top of `glam::DVec3`.

pub use glam::DVec3 as Vec3;

/// Normalize `v`, returning zero for a zero-length (or non-finite) input.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Arithmetic midpoint of two points.
#[inline]
pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

/// Rescale `v` so its length does not exceed `max`.
#[inline]
pub fn clamp_length(v: Vec3, max: f64) -> Vec3 {
    let len = v.length();
    if len > max && len > 0.0 {
        v * (max / len)
    } else {
        v
    }
}

/// Momentum-weighted velocity of two bodies (perfectly inelastic merge).
#[inline]
pub fn momentum_velocity(m1: f64, v1: Vec3, m2: f64, v2: Vec3) -> Vec3 {
    let total = m1 + m2;
    if total <= 0.0 {
        return Vec3::ZERO;
    }
    (v1 * m1 + v2 * m2) / total
}
