//! Events emitted by the simulation for the host to react to (visuals, audio)

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::host::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub u32);

/// Serializable so hosts can record or replay a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum SimEvent {
    /// Fuse started counting (first contact or arm timeout)
    Armed { projectile: ProjectileId },
    /// Projectile bounced off geometry
    Bounced {
        projectile: ProjectileId,
        point: Vec3,
        speed: f32,
    },
    /// Fuse ran out; `effect` is None when the effect was instantaneous
    Activated {
        projectile: ProjectileId,
        center: Vec3,
        effect: Option<EffectId>,
    },
    Damaged {
        effect: EffectId,
        entity: EntityId,
        amount: f32,
    },
    Relocated {
        effect: EffectId,
        entity: EntityId,
        from: Vec3,
        to: Vec3,
    },
    /// Area effect finished or was torn down; stop its looping visuals
    EffectEnded { effect: EffectId },
    /// Projectile is done and may be despawned
    Expired { projectile: ProjectileId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = SimEvent::Relocated {
            effect: EffectId(3),
            entity: EntityId(7),
            from: Vec3::new(1.0, 0.0, 0.0),
            to: Vec3::new(9.0, 0.0, 2.0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Relocated");
        assert_eq!(json["entity"], 7);
        assert_eq!(json["to"], serde_json::json!([9.0, 0.0, 2.0]));

        let back: SimEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
