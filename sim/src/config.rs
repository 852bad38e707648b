//! Simulation configuration.
//!
//! `SimConfig` is an ECS resource. It starts from `Default`, can be layered
//! from environment variables, and is changed at runtime through
//! `SimConfigPatch` (which is also accepted as JSON from a host).

use crate::constants::*;
use crate::error::SimError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;

/// Simulation-wide parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed substep in seconds (> 0).
    pub dt: f64,
    /// When paused, elapsed time accumulates but no substeps run.
    pub paused: bool,
    /// Global gate for the test-body precession correction.
    pub precession_enabled: bool,
    /// Precession strength in [0, 1].
    pub precession_strength: f64,
    /// Neutron-star remnants at or above this mass collapse to a black hole.
    pub tov_threshold: f64,
    /// Optional bound on catch-up substeps per `advance` call.
    pub max_substeps_per_tick: Option<u32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            paused: false,
            precession_enabled: false,
            precession_strength: DEFAULT_PRECESSION_STRENGTH,
            tov_threshold: DEFAULT_TOV_THRESHOLD,
            max_substeps_per_tick: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl SimConfig {
    /// Defaults overridden by `RELSIM_*` environment variables.
    ///
    /// Unparseable or out-of-range values fall back to the default.
    pub fn from_env() -> Self {
        let mut patch = SimConfigPatch {
            dt: env_parse("RELSIM_DT"),
            precession_enabled: env_parse("RELSIM_PRECESSION"),
            precession_strength: env_parse("RELSIM_PRECESSION_STRENGTH"),
            tov_threshold: env_parse("RELSIM_TOV_THRESHOLD"),
            ..Default::default()
        };
        if let Some(max) = env_parse::<u32>("RELSIM_MAX_SUBSTEPS") {
            // 0 disables the bound
            patch.max_substeps_per_tick = Some((max > 0).then_some(max));
        }
        let mut config = Self::default();
        config.apply(&patch);
        config
    }

    /// Parse a full config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidConfig("dt"));
        }
        if !(0.0..=1.0).contains(&self.precession_strength) {
            return Err(SimError::InvalidConfig("precession_strength"));
        }
        if !(self.tov_threshold.is_finite() && self.tov_threshold > 0.0) {
            return Err(SimError::InvalidConfig("tov_threshold"));
        }
        Ok(())
    }

    /// Apply the specified fields of `patch`. Invalid values are skipped.
    pub fn apply(&mut self, patch: &SimConfigPatch) {
        if let Some(dt) = patch.dt {
            if dt.is_finite() && dt > 0.0 {
                self.dt = dt;
            } else {
                tracing::debug!(dt, "ignoring non-positive timestep");
            }
        }
        if let Some(paused) = patch.paused {
            self.paused = paused;
        }
        if let Some(enabled) = patch.precession_enabled {
            self.precession_enabled = enabled;
        }
        if let Some(strength) = patch.precession_strength {
            if strength.is_finite() {
                self.precession_strength = strength.clamp(0.0, 1.0);
            }
        }
        if let Some(tov) = patch.tov_threshold {
            if tov.is_finite() && tov > 0.0 {
                self.tov_threshold = tov;
            } else {
                tracing::debug!(tov, "ignoring non-positive TOV threshold");
            }
        }
        if let Some(max) = patch.max_substeps_per_tick {
            self.max_substeps_per_tick = max.filter(|m| *m > 0);
        }
    }
}

/// Partial update for `SimConfig`. `None` leaves a field unchanged.
///
/// `max_substeps_per_tick: Some(None)` removes the bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfigPatch {
    pub dt: Option<f64>,
    pub paused: Option<bool>,
    pub precession_enabled: Option<bool>,
    pub precession_strength: Option<f64>,
    pub tov_threshold: Option<f64>,
    #[serde(
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_substeps_per_tick: Option<Option<u32>>,
}

/// A present field (including `null`) becomes `Some`; an absent one stays
/// `None` through `#[serde(default)]`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer).map(Some)
}

impl SimConfigPatch {
    /// Parse and validate a patch. Unlike `SimConfig::apply`, which skips
    /// bad fields, a host-supplied patch with an invalid field is rejected.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let patch: SimConfigPatch = serde_json::from_str(json)?;
        patch.validate()?;
        Ok(patch)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.dt.is_some_and(|dt| !(dt.is_finite() && dt > 0.0)) {
            return Err(SimError::InvalidConfig("dt"));
        }
        if self
            .precession_strength
            .is_some_and(|s| !(0.0..=1.0).contains(&s))
        {
            return Err(SimError::InvalidConfig("precession_strength"));
        }
        if self.tov_threshold.is_some_and(|t| !(t.is_finite() && t > 0.0)) {
            return Err(SimError::InvalidConfig("tov_threshold"));
        }
        Ok(())
    }
}
