//! Transient merger effects and the queue handed to renderers.
//!
//! Effects are produced only by the collision system. The simulation never
//! expires them on its own: the rendering/audio layer plays each one for
//! its TTL and then calls `SimWorld::remove_effect`.

use crate::components::EntityId;
use crate::vector::Vec3;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind-specific effect geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EffectKind {
    /// Gravitational wave ring expanding from a black hole merger.
    WaveBurst { origin: Vec3, amplitude: f64 },
    /// Neutron star merger flash.
    Kilonova { origin: Vec3, radius: f64 },
    /// Disk around a black hole that disrupted a body. Follows `mass_id`.
    AccretionDisk { mass_id: EntityId, radius: f64 },
    /// Stellar merger flash.
    Explosion { origin: Vec3, radius: f64 },
    /// Debris ring around a merged planet/star. Follows `mass_id`.
    DebrisRing { mass_id: EntityId, inner: f64, outer: f64 },
    /// Stream of tidal debris trailing from `origin` toward a body.
    TidalStream { mass_id: EntityId, origin: Vec3, length: f64 },
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::WaveBurst { .. } => "waveBurst",
            EffectKind::Kilonova { .. } => "kilonova",
            EffectKind::AccretionDisk { .. } => "accretionDisk",
            EffectKind::Explosion { .. } => "explosion",
            EffectKind::DebrisRing { .. } => "debrisRing",
            EffectKind::TidalStream { .. } => "tidalStream",
        }
    }

    /// Body this effect is anchored to, if it follows one.
    pub fn anchor(&self) -> Option<EntityId> {
        match self {
            EffectKind::AccretionDisk { mass_id, .. }
            | EffectKind::DebrisRing { mass_id, .. }
            | EffectKind::TidalStream { mass_id, .. } => Some(*mass_id),
            _ => None,
        }
    }
}

/// A timed effect record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: EntityId,
    /// Simulation time at creation.
    pub created_at: f64,
    pub ttl: f64,
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl Effect {
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.created_at >= self.ttl
    }
}

/// Ordered queue of live effects.
#[derive(Resource, Debug, Clone, Default)]
pub struct EffectBus {
    effects: Vec<Effect>,
}

impl EffectBus {
    pub fn push(&mut self, effect: Effect) {
        tracing::debug!(id = %effect.id, kind = effect.kind.name(), "effect emitted");
        self.effects.push(effect);
    }

    /// Remove an effect by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        self.effects.len() != before
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Ids of effects whose TTL has elapsed at `now`.
    pub fn expired(&self, now: f64) -> Vec<EntityId> {
        self.effects.iter().filter(|e| e.is_expired(now)).map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(id: u64, created_at: f64) -> Effect {
        Effect {
            id: EntityId(id),
            created_at,
            ttl: 2.0,
            kind: EffectKind::WaveBurst {
                origin: Vec3::ZERO,
                amplitude: 1.0,
            },
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut bus = EffectBus::default();
        bus.push(burst(1, 0.0));
        bus.push(burst(2, 0.0));
        assert!(bus.remove(EntityId(1)));
        assert!(!bus.remove(EntityId(1)));
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.effects()[0].id, EntityId(2));
    }

    #[test]
    fn test_expired_does_not_remove() {
        let mut bus = EffectBus::default();
        bus.push(burst(1, 0.0));
        bus.push(burst(2, 1.5));
        assert_eq!(bus.expired(2.5), vec![EntityId(1)]);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_effect_json_is_tagged() {
        let json = serde_json::to_string(&burst(3, 0.0)).unwrap();
        assert!(json.contains("\"type\":\"waveBurst\""));
        assert!(json.contains("\"amplitude\""));
    }

    #[test]
    fn test_anchor() {
        let disk = EffectKind::AccretionDisk {
            mass_id: EntityId(4),
            radius: 1.0,
        };
        assert_eq!(disk.anchor(), Some(EntityId(4)));
        assert_eq!(burst(1, 0.0).kind.anchor(), None);
    }
}
