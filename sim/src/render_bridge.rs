//! Renderer integration bridge.
//!
//! Converts snapshots into flat `f32` buffers so an engine binding can copy
//! state across an FFI boundary without parsing JSON every frame.
//!
//! # Stable FFI Contract
//!
//! Each buffer is a contiguous `Vec<f32>`: a one-element header holding the
//! record count, then one fixed-stride record per entity in id order.
//! Positions and velocities are narrowed from `f64`.
//!
//! # Mass Buffer Layout
//!
//! ```text
//! [0] mass_count
//! For each mass i (offset = 1 + i * MASS_STRIDE):
//!   [+0]  id
//!   [+1]  x          [+2]  y          [+3]  z
//!   [+4]  vx         [+5]  vy         [+6]  vz
//!   [+7]  mass
//!   [+8]  radius     - effective collision radius
//!   [+9]  kind_id    - see KIND_* constants
//!   [+10] spin_x     [+11] spin_y     [+12] spin_z
//! ```
//!
//! # Photon Buffer Layout
//!
//! ```text
//! [0] photon_count
//! For each photon i (offset = 1 + i * PHOTON_STRIDE):
//!   [+0] id
//!   [+1] x    [+2] y    [+3] z
//!   [+4] vx   [+5] vy   [+6] vz
//!   [+7] frequency (-1.0 when unset)
//! ```
//!
//! # Kind ID Mapping
//!
//! | Kind        | ID  |
//! |-------------|-----|
//! | blackHole   | 0.0 |
//! | neutronStar | 1.0 |
//! | star        | 2.0 |
//! | planet      | 3.0 |
//!
//! # Usage from GDScript
//!
//! ```gdscript
//! const MASS_STRIDE = 13
//! const HEADER_SIZE = 1
//!
//! func parse_masses(buffer: PackedFloat32Array):
//!     var count = int(buffer[0])
//!     for i in range(count):
//!         var offset = HEADER_SIZE + i * MASS_STRIDE
//!         var pos = Vector3(buffer[offset + 1], buffer[offset + 2], buffer[offset + 3])
//!         var radius = buffer[offset + 8]
//! ```
//!
//! Ids are cast to `f32` and stay exact up to 2^24.

use crate::components::BodyKind;
use crate::vector::Vec3;
use crate::world::Snapshot;

// ============================================================================
// CONSTANTS - STABLE FFI CONTRACT
// ============================================================================

/// Number of f32 values per mass record.
///
/// **This is part of the stable FFI contract. Do not change without versioning.**
pub const MASS_STRIDE: usize = 13;

/// Number of f32 values per photon record.
pub const PHOTON_STRIDE: usize = 8;

/// Number of f32 values in each buffer header (the record count).
pub const HEADER_SIZE: usize = 1;

pub const KIND_BLACK_HOLE: f32 = 0.0;
pub const KIND_NEUTRON_STAR: f32 = 1.0;
pub const KIND_STAR: f32 = 2.0;
pub const KIND_PLANET: f32 = 3.0;

/// Frequency slot value for photons without a frequency.
pub const NO_FREQUENCY: f32 = -1.0;

// Shared record fields
pub const FIELD_ID: usize = 0;
pub const FIELD_X: usize = 1;
pub const FIELD_Y: usize = 2;
pub const FIELD_Z: usize = 3;
pub const FIELD_VX: usize = 4;
pub const FIELD_VY: usize = 5;
pub const FIELD_VZ: usize = 6;

// Mass record fields
pub const FIELD_MASS: usize = 7;
pub const FIELD_RADIUS: usize = 8;
pub const FIELD_KIND: usize = 9;
pub const FIELD_SPIN_X: usize = 10;
pub const FIELD_SPIN_Y: usize = 11;
pub const FIELD_SPIN_Z: usize = 12;

// Photon record fields
pub const FIELD_FREQUENCY: usize = 7;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

#[inline]
pub fn kind_to_id(kind: BodyKind) -> f32 {
    match kind {
        BodyKind::BlackHole => KIND_BLACK_HOLE,
        BodyKind::NeutronStar => KIND_NEUTRON_STAR,
        BodyKind::Star => KIND_STAR,
        BodyKind::Planet => KIND_PLANET,
    }
}

#[inline]
fn push_vec(buffer: &mut Vec<f32>, v: Vec3) {
    buffer.extend_from_slice(&v.as_vec3().to_array());
}

/// Buffer length for `count` records of `stride` values.
#[inline]
pub const fn calculate_buffer_size(count: usize, stride: usize) -> usize {
    HEADER_SIZE + count * stride
}

/// Offset of record `index` in a buffer with the given stride.
#[inline]
pub const fn record_offset(index: usize, stride: usize) -> usize {
    HEADER_SIZE + index * stride
}

/// Record count from a buffer header. `None` if the buffer is empty.
#[inline]
pub fn parse_count(buffer: &[f32]) -> Option<usize> {
    buffer.first().map(|count| *count as usize)
}

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Massive bodies of `snapshot` as a flat buffer.
pub fn masses_to_flatbuffer(snapshot: &Snapshot) -> Vec<f32> {
    let count = snapshot.masses.len();
    let buffer_size = calculate_buffer_size(count, MASS_STRIDE);
    let mut buffer = Vec::with_capacity(buffer_size);
    buffer.push(count as f32);

    for mass in &snapshot.masses {
        buffer.push(mass.id.0 as f32);
        push_vec(&mut buffer, mass.position);
        push_vec(&mut buffer, mass.velocity);
        buffer.push(mass.mass as f32);
        buffer.push(mass.radius as f32);
        buffer.push(kind_to_id(mass.kind));
        push_vec(&mut buffer, mass.spin);
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

/// Photons of `snapshot` as a flat buffer.
pub fn photons_to_flatbuffer(snapshot: &Snapshot) -> Vec<f32> {
    let count = snapshot.photons.len();
    let buffer_size = calculate_buffer_size(count, PHOTON_STRIDE);
    let mut buffer = Vec::with_capacity(buffer_size);
    buffer.push(count as f32);

    for photon in &snapshot.photons {
        buffer.push(photon.id.0 as f32);
        push_vec(&mut buffer, photon.position);
        push_vec(&mut buffer, photon.velocity);
        buffer.push(photon.frequency.map_or(NO_FREQUENCY, |f| f as f32));
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

// ============================================================================
// TESTS
// ============================================================================
