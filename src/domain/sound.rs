// Sound command model shared by the registry, the scenes, and the sound
// sender adapter.

use glam::Vec3;

use super::player::PlayerId;

/// Verbs accepted by the external sound host.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundCommand {
    /// Begin a positional loop.
    Start { id: String, position: Vec3 },
    /// Reposition a loop that is already playing.
    Update { id: String, position: Vec3 },
    /// Stop a loop.
    Stop { id: String, position: Vec3 },
    /// Fire-and-forget cue.
    OneShot { id: String, position: Vec3 },
}

impl SoundCommand {
    pub fn id(&self) -> &str {
        match self {
            SoundCommand::Start { id, .. }
            | SoundCommand::Update { id, .. }
            | SoundCommand::Stop { id, .. }
            | SoundCommand::OneShot { id, .. } => id,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            SoundCommand::Start { position, .. }
            | SoundCommand::Update { position, .. }
            | SoundCommand::Stop { position, .. }
            | SoundCommand::OneShot { position, .. } => *position,
        }
    }
}

/// Id of a player's continuous loop. Scene-tagged ids keep two scenes from
/// ever colliding on the same channel at the sound host.
pub fn player_loop_id(scene_tag: &str, player_id: PlayerId) -> String {
    if scene_tag.is_empty() {
        format!("p{player_id}")
    } else {
        format!("p{player_id}{scene_tag}PlayerSound")
    }
}

/// Id of a one-shot effect tied to a player and a scene event.
pub fn effect_id(scene_tag: &str, player_id: PlayerId, event: &str) -> String {
    format!("p{player_id}Effects{scene_tag}{event}")
}

/// Spherical position in the sound host's convention: azimuth and elevation
/// in degrees, radius normalized by the playsphere and clamped to the host's
/// [-3, 3] range. Elevations below a hundredth of a degree are flushed to
/// zero so the host never sees denormal-ish values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatPosition {
    pub azimuth: f32,
    pub elevation: f32,
    pub radius: f32,
}

impl SpatPosition {
    pub fn from_world(position: Vec3, sphere_radius: f32) -> Self {
        let radius = (position.length() / sphere_radius).clamp(-3.0, 3.0);
        let azimuth = position.x.atan2(position.z).to_degrees();
        let mut elevation = position.y.atan2(radius).to_degrees();
        if elevation.abs() < 0.01 {
            elevation = 0.0;
        }
        Self {
            azimuth,
            elevation,
            radius,
        }
    }
}
