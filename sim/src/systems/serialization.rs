//! Serialization utilities for simulation state.

use crate::world::Snapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BodyKind, EntityId};
    use crate::vector::Vec3;
    use crate::world::MassSnapshot;

    #[test]
    fn test_snapshot_restores_from_json() {
        let snapshot = Snapshot {
            tick: 42,
            time: 0.672,
            masses: vec![MassSnapshot {
                id: EntityId(7),
                name: "Sgr A*".to_string(),
                kind: BodyKind::BlackHole,
                mass: 20.0,
                position: Vec3::new(1.0, 0.0, -2.0),
                velocity: Vec3::ZERO,
                spin: Vec3::new(0.0, 0.5, 0.0),
                radius: BodyKind::BlackHole.effective_radius(20.0),
                color: "#000000".to_string(),
            }],
            ..Default::default()
        };

        let json = snapshot_to_json_string(&snapshot).unwrap();
        assert!(json.contains("\"kind\":\"blackHole\""));
        let restored = snapshot_from_json_string(&json).unwrap();

        assert_eq!(restored.tick, 42);
        assert_eq!(restored.masses.len(), 1);
        assert_eq!(restored.masses[0].id, EntityId(7));
        assert_eq!(restored.masses[0].position, Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_bytes_match_string() {
        let snapshot = Snapshot::default();
        let bytes = snapshot_to_json(&snapshot).unwrap();
        let text = snapshot_to_json_string(&snapshot).unwrap();
        assert_eq!(bytes, text.into_bytes());
        assert_eq!(snapshot_from_json(&bytes).unwrap().tick, 0);
    }
}
