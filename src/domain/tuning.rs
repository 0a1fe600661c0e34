// Gameplay tuning for the stage.
//
// Keep this separate from runtime/server configuration (ports, tick rates,
// buffer sizes, host addresses).

use glam::Vec2;

/// Tuning for the live pose camera feed.
#[derive(Debug, Clone, Copy)]
pub struct TrackingTuning {
    /// Resolution of the live pose camera in pixels (square feed).
    pub camera_resolution: f32,

    /// Maps pixel 0 to the negative component and `camera_resolution` to the
    /// positive one. Negate a component to flip that axis.
    pub remap: Vec2,
}

impl Default for TrackingTuning {
    fn default() -> Self {
        Self {
            camera_resolution: 640.0,
            remap: Vec2::new(1.0, -1.0),
        }
    }
}

/// Tuning for player avatars on the dome.
#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Fraction per second a player closes toward its target position.
    pub lerp_speed: f32,

    /// Fade-in rate per second while input is fresh.
    pub fade_in_speed: f32,

    /// Fade-out rate per second once input goes stale.
    pub fade_out_speed: f32,

    /// Seconds without fresh input before fade-out starts.
    pub fade_out_grace: f32,

    /// Visibility floor a silent player shrinks to before being hidden.
    pub min_scale: f32,

    /// World scale of a fully visible avatar.
    pub start_size: f32,

    /// Visibility at or above this counts as an active player.
    pub activation_threshold: f32,

    /// Seconds of silence before the avatar stops participating in
    /// collisions (the tracking rig can drop a blob for a beat while the
    /// avatar is still on screen).
    pub collider_timeout: f32,

    /// Minimum target movement in world units worth committing; below this
    /// the update is sensor jitter.
    pub target_tolerance: f32,

    /// Minimum distance between the current position and a new target
    /// before a continuous sound update is worth sending.
    pub sound_move_threshold: f32,

    /// Surface gap below which two avatars count as touching.
    pub collision_threshold: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            lerp_speed: 4.0,
            fade_in_speed: 4.0,
            fade_out_speed: 2.0,
            fade_out_grace: 0.3,
            min_scale: 0.01,
            start_size: 0.5,
            activation_threshold: 0.03,
            collider_timeout: 1.0,
            target_tolerance: 0.01,
            sound_move_threshold: 0.05,
            collision_threshold: 0.1,
        }
    }
}
