// Wire protocol DTOs and conversions for the tracking feed, the renderer
// feed, and the sound host.

use serde::{Deserialize, Serialize};

use crate::domain::scenes::Prop;
use crate::domain::sound::{SoundCommand, SpatPosition};
use crate::domain::PlayerSnapshot;
use crate::use_cases::{SceneState, StageStatus, WorldUpdate};

/// Datagram sent by the tracking rig for one blob, in camera-pixel space.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingDto {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Messages the server pushes to feed clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedMessage {
    // Scene transitions (also sent once on connect).
    SceneState(SceneStateDto),
    // Snapshot of the stage for a given tick.
    WorldUpdate(WorldUpdateDto),
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneStateDto {
    pub scene: String,
    pub changed_at_tick: u64,
}

impl From<SceneState> for SceneStateDto {
    fn from(state: SceneState) -> Self {
        Self {
            scene: state.scene.name().to_string(),
            changed_at_tick: state.changed_at_tick,
        }
    }
}

/// Snapshot of the stage sent to feed clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub scene: String,
    pub players: Vec<PlayerStateDto>,
    pub props: Vec<PropStateDto>,
    pub average_position: [f32; 3],
    pub num_active: usize,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            scene: update.scene.name().to_string(),
            players: update.players.iter().map(PlayerStateDto::from).collect(),
            props: update.props.iter().map(PropStateDto::from).collect(),
            average_position: update.average_position.to_array(),
            num_active: update.num_active,
        }
    }
}

/// Flattened player state for wire transmission in world updates.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub scale: f32,
    pub visibility: f32,
    pub active: bool,
}

impl From<&PlayerSnapshot> for PlayerStateDto {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            id: player.id,
            x: player.position.x,
            y: player.position.y,
            z: player.position.z,
            scale: player.scale,
            visibility: player.visibility,
            active: player.active,
        }
    }
}

/// Flattened prop state for wire transmission in world updates.
#[derive(Debug, Clone, Serialize)]
pub struct PropStateDto {
    pub id: u32,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub scale: f32,
    pub phase: String,
}

impl From<&Prop> for PropStateDto {
    fn from(prop: &Prop) -> Self {
        Self {
            id: prop.id,
            kind: prop.kind.name().to_string(),
            x: prop.position.x,
            y: prop.position.y,
            z: prop.position.z,
            scale: prop.scale,
            phase: prop.phase.name().to_string(),
        }
    }
}

/// Datagram for the sound host: one event in its spherical convention.
#[derive(Debug, Clone, Serialize)]
pub struct SoundEventDto {
    pub event: &'static str,
    pub id: String,
    pub azimuth: f32,
    pub elevation: f32,
    pub radius: f32,
}

impl SoundEventDto {
    pub fn from_command(command: &SoundCommand, sphere_radius: f32) -> Self {
        let event = match command {
            SoundCommand::Start { .. } => "start",
            SoundCommand::Update { .. } => "update",
            SoundCommand::Stop { .. } => "stop",
            SoundCommand::OneShot { .. } => "oneshot",
        };
        let spat = SpatPosition::from_world(command.position(), sphere_radius);
        Self {
            event,
            id: command.id().to_string(),
            azimuth: spat.azimuth,
            elevation: spat.elevation,
            radius: spat.radius,
        }
    }
}

/// Body for manual scene switches on the control surface.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneRequest {
    pub scene: String,
}

/// Control-surface stats payload.
#[derive(Debug, Clone, Serialize)]
pub struct StatusDto {
    pub scene: String,
    pub tick: u64,
    pub num_players: usize,
    pub num_active: usize,
}

impl From<StageStatus> for StatusDto {
    fn from(status: StageStatus) -> Self {
        Self {
            scene: status.scene.name().to_string(),
            tick: status.tick,
            num_players: status.num_players,
            num_active: status.num_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn when_serializing_a_feed_message_then_shape_is_tagged() {
        let msg = FeedMessage::SceneState(SceneStateDto {
            scene: "withme".to_string(),
            changed_at_tick: 3,
        });
        let txt = serde_json::to_string(&msg).expect("serializable");

        assert!(txt.contains("\"type\":\"SceneState\""));
        assert!(txt.contains("\"scene\":\"withme\""));
    }

    #[test]
    fn when_parsing_a_tracking_datagram_then_fields_map_through() {
        let dto: TrackingDto =
            serde_json::from_str(r#"{"id":7,"x":320.0,"y":320.0}"#).expect("parsable");

        assert_eq!(dto.id, 7);
        assert_eq!(dto.x, 320.0);
    }

    #[test]
    fn when_converting_a_sound_command_then_host_convention_is_used() {
        let dto = SoundEventDto::from_command(
            &SoundCommand::OneShot {
                id: "p1EffectsWithMePointCollision".to_string(),
                position: Vec3::new(10.0, 0.0, 0.0),
            },
            10.0,
        );

        assert_eq!(dto.event, "oneshot");
        assert_eq!(dto.elevation, 0.0);
        assert!((dto.radius - 1.0).abs() < 1e-6);
    }
}
