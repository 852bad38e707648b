//! Simulation constants.
//!
//! Real-world values are impractical at interactive scales, so the whole
//! simulation runs in scaled, unitless quantities.

/// Gravitational constant in sim units.
pub const G_SIM: f64 = 1.0;
/// Speed of light in sim units. Photon speed is pinned to this value.
pub const C_SIM: f64 = 10.0;
/// Softening length added to squared separations in force and potential.
pub const EPSILON: f64 = 0.1;

/// Default fixed substep in seconds of simulation time.
pub const DEFAULT_DT: f64 = 0.016;
/// Default mass for spawned bodies.
pub const DEFAULT_MASS: f64 = 5.0;
/// Default mass for spawned test bodies.
pub const DEFAULT_TEST_BODY_MASS: f64 = 1.0;
/// Default TOV-style collapse threshold for neutron-star remnants.
pub const DEFAULT_TOV_THRESHOLD: f64 = 8.0;
/// Default precession strength when the correction is enabled.
pub const DEFAULT_PRECESSION_STRENGTH: f64 = 0.5;

/// Upper bound on dimensionless spin magnitude.
pub const SPIN_MAX: f64 = 0.99;
/// Spins at or below this magnitude produce no frame dragging.
pub const SPIN_EPSILON: f64 = 1e-6;
/// Scale of the stylized Lense-Thirring angular velocity field.
pub const FRAME_DRAG_STRENGTH: f64 = 2.0;

// Merger rules
/// Fraction of a disrupted body's mass accreted by the black hole.
pub const ACCRETION_EFFICIENCY: f64 = 0.8;
/// Fraction of a disrupted body's spin transferred to the black hole.
pub const SPIN_TRANSFER: f64 = 0.1;

// Effect lifetimes (seconds)
pub const WAVE_BURST_TTL: f64 = 4.0;
pub const KILONOVA_TTL: f64 = 3.0;
pub const ACCRETION_DISK_TTL: f64 = 6.0;
pub const EXPLOSION_TTL: f64 = 2.5;
pub const DEBRIS_RING_TTL: f64 = 8.0;
pub const TIDAL_STREAM_TTL: f64 = 5.0;

/// Gravitational wave amplitude per unit of reduced mass.
pub const WAVE_AMPLITUDE_SCALE: f64 = 0.05;
/// Visual scale applied to Kerr horizon/ergosphere radii.
pub const KERR_VISUAL_SCALE: f64 = 0.05;

// Spawn colors
pub const MASS_COLOR: &str = "#ffaa00";
pub const PHOTON_COLOR: &str = "#66ccff";
pub const CLOCK_COLOR: &str = "#ffffff";
pub const TEST_BODY_COLOR: &str = "#aaff66";
