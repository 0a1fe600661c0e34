// Use-case level inputs/outputs for the stage loop.

use glam::{Vec2, Vec3};

use crate::domain::scenes::{Prop, SceneKind};
use crate::domain::{PlayerId, PlayerSnapshot};

/// Inputs flowing from the adapters into the stage task.
#[derive(Debug, Clone)]
pub enum StageEvent {
    /// Tracked blob position in camera-pixel space.
    Position { player_id: PlayerId, raw: Vec2 },
    /// Manual scene change from the control surface.
    SetScene { scene: SceneKind },
}

/// High-level stage state, pushed to feed clients when the scene changes.
#[derive(Debug, Clone, Copy)]
pub struct SceneState {
    pub scene: SceneKind,
    pub changed_at_tick: u64,
}

/// Cheap per-tick stats for the control surface.
#[derive(Debug, Clone, Copy)]
pub struct StageStatus {
    pub scene: SceneKind,
    pub tick: u64,
    pub num_players: usize,
    pub num_active: usize,
}

/// Snapshot of the stage for a given tick.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub scene: SceneKind,
    pub players: Vec<PlayerSnapshot>,
    pub props: Vec<Prop>,
    pub average_position: Vec3,
    pub num_active: usize,
}
