use std::{env, net::SocketAddr, time::Duration};

use glam::{Vec2, Vec3};

use crate::domain::scenes::SceneKind;
use crate::domain::{DomeProjection, PlayerTuning, TrackingTuning};
use crate::use_cases::StageSettings;

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("DOME_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tracking_port() -> u16 {
    env::var("TRACKING_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(9000)
}

pub fn sound_host() -> SocketAddr {
    let raw = env::var("SOUND_HOST").unwrap_or_else(|_| "127.0.0.1:9001".to_string());
    raw.parse().unwrap_or_else(|_| {
        tracing::error!(value = %raw, "invalid SOUND_HOST; using default");
        SocketAddr::from(([127, 0, 0, 1], 9001))
    })
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const SOUND_CHANNEL_CAPACITY: usize = 256;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);
// Linger after a scene reports complete before rotating on.
pub const COMPLETE_LINGER: Duration = Duration::from_secs(3);

pub fn stage_settings() -> StageSettings {
    StageSettings {
        tick_interval: TICK_INTERVAL,
        // Zero pins the initial scene forever.
        scene_duration: Duration::from_secs_f32(env_f32("SCENE_DURATION_SECS", 60.0).max(0.0)),
        complete_linger: COMPLETE_LINGER,
        placement_seed: env::var("PLACEMENT_SEED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7),
        initial_scene: env::var("INITIAL_SCENE")
            .ok()
            .and_then(|v| SceneKind::parse(&v))
            .unwrap_or(SceneKind::WithMe),
    }
}

// Venue tuning: defaults match the reference installation, env overrides
// cover the values operators actually adjust per dome.

pub fn dome_projection() -> DomeProjection {
    let defaults = DomeProjection::default();
    DomeProjection {
        max_size: defaults.max_size,
        push_towards_bottom: env_f32("PUSH_TOWARDS_BOTTOM", defaults.push_towards_bottom),
        max_degrees: env_f32("MAX_DEGREES", defaults.max_degrees),
        sphere_radius: env_f32("SPHERE_RADIUS", defaults.sphere_radius),
        min_y: env_f32("MIN_Y", defaults.min_y),
        origin: Vec3::new(
            env_f32("DOME_ORIGIN_X", 0.0),
            env_f32("DOME_ORIGIN_Y", 0.0),
            env_f32("DOME_ORIGIN_Z", 0.0),
        ),
    }
}

pub fn tracking_tuning() -> TrackingTuning {
    let defaults = TrackingTuning::default();
    TrackingTuning {
        camera_resolution: env_f32("CAMERA_RESOLUTION", defaults.camera_resolution),
        remap: Vec2::new(
            env_f32("REMAP_X", defaults.remap.x),
            env_f32("REMAP_Y", defaults.remap.y),
        ),
    }
}

pub fn player_tuning() -> PlayerTuning {
    let defaults = PlayerTuning::default();
    PlayerTuning {
        lerp_speed: env_f32("PLAYER_LERP_SPEED", defaults.lerp_speed),
        fade_in_speed: env_f32("FADE_IN_SPEED", defaults.fade_in_speed),
        fade_out_speed: env_f32("FADE_OUT_SPEED", defaults.fade_out_speed),
        fade_out_grace: env_f32("FADE_OUT_GRACE", defaults.fade_out_grace),
        min_scale: env_f32("MIN_PLAYER_SCALE", defaults.min_scale),
        start_size: env_f32("PLAYER_START_SIZE", defaults.start_size),
        ..defaults
    }
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
