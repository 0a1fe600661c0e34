// Scene rules: each mini-game is a thin strategy layered over the shared
// player substrate.

pub mod flock;
pub mod herd;
pub mod hugs;
pub mod kaleido;
pub mod mimic;
pub mod withme;

use glam::Vec3;

use super::dome::DomeProjection;
use super::player::{Player, StageView};
use super::sound::SoundCommand;
use super::tuning::PlayerTuning;

/// Scenes the installation can run, in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    WithMe,
    Hugs,
    Flock,
    Herd,
    Mimic,
    Kaleido,
}

impl SceneKind {
    pub const ROTATION: [SceneKind; 6] = [
        SceneKind::WithMe,
        SceneKind::Hugs,
        SceneKind::Flock,
        SceneKind::Herd,
        SceneKind::Mimic,
        SceneKind::Kaleido,
    ];

    /// Wire name used by the control surface and the feed.
    pub fn name(self) -> &'static str {
        match self {
            SceneKind::WithMe => "withme",
            SceneKind::Hugs => "hugs",
            SceneKind::Flock => "flock",
            SceneKind::Herd => "herd",
            SceneKind::Mimic => "mimic",
            SceneKind::Kaleido => "kaleido",
        }
    }

    /// Tag baked into sound ids so scenes never share a channel.
    pub fn sound_tag(self) -> &'static str {
        match self {
            SceneKind::WithMe => "WithMe",
            SceneKind::Hugs => "Hugs",
            SceneKind::Flock => "Flock",
            SceneKind::Herd => "Herd",
            SceneKind::Mimic => "Mimic",
            SceneKind::Kaleido => "Kaleido",
        }
    }

    pub fn parse(name: &str) -> Option<SceneKind> {
        SceneKind::ROTATION
            .into_iter()
            .find(|kind| kind.name() == name.trim().to_ascii_lowercase())
    }

    pub fn next(self) -> SceneKind {
        let i = SceneKind::ROTATION
            .iter()
            .position(|&k| k == self)
            .unwrap_or(0);
        SceneKind::ROTATION[(i + 1) % SceneKind::ROTATION.len()]
    }
}

/// What a prop looks like to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Dot,
    Face,
    Boid,
    Sphere,
    Node,
}

impl PropKind {
    pub fn name(self) -> &'static str {
        match self {
            PropKind::Dot => "dot",
            PropKind::Face => "face",
            PropKind::Boid => "boid",
            PropKind::Sphere => "sphere",
            PropKind::Node => "node",
        }
    }
}

/// Coarse prop state for the renderer (free/lit/finished and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropPhase {
    #[default]
    Idle,
    Lit,
    Done,
}

impl PropPhase {
    pub fn name(self) -> &'static str {
        match self {
            PropPhase::Idle => "idle",
            PropPhase::Lit => "lit",
            PropPhase::Done => "done",
        }
    }
}

/// Scene object published in world updates.
#[derive(Debug, Clone)]
pub struct Prop {
    pub id: u32,
    pub kind: PropKind,
    pub position: Vec3,
    pub scale: f32,
    pub phase: PropPhase,
}

/// Scene-specific rules injected into the stage loop. Hooks a scene does
/// not care about keep their empty defaults.
pub trait SceneRules: Send {
    fn kind(&self) -> SceneKind;

    /// Rebuilds scene props for a fresh run.
    fn setup(&mut self, dome: &DomeProjection);

    /// World scale for a player avatar. The default is the plain
    /// visibility-driven scale shared by most scenes.
    fn avatar_scale(&self, player: &Player, tuning: &PlayerTuning) -> f32 {
        tuning.start_size * player.visibility
    }

    /// Radius within which the stage reports player/prop overlap. Zero
    /// disables trigger scanning for the scene.
    fn trigger_radius(&self) -> f32 {
        0.0
    }

    /// An active avatar is inside a prop's trigger radius this tick.
    fn on_player_trigger(
        &mut self,
        _player: &Player,
        _prop_index: usize,
        _out: &mut Vec<SoundCommand>,
    ) {
    }

    /// Two active avatars touched this tick.
    fn on_players_collided(&mut self, _a: &Player, _b: &Player, _out: &mut Vec<SoundCommand>) {}

    /// Per-tick scene simulation.
    fn tick(&mut self, world: &StageView<'_>, dt: f32, out: &mut Vec<SoundCommand>);

    fn props(&self) -> &[Prop];

    /// True once the scene reached its win condition; the stage lingers
    /// briefly and rotates on.
    fn complete(&self) -> bool {
        false
    }
}

/// Builds the rules for a scene. `seed` keeps prop placement deterministic
/// for a given installation config.
pub fn make_scene(kind: SceneKind, seed: u64) -> Box<dyn SceneRules> {
    match kind {
        SceneKind::WithMe => Box::new(withme::WithMeScene::new(seed)),
        SceneKind::Hugs => Box::new(hugs::HugScene::new(seed)),
        SceneKind::Flock => Box::new(flock::FlockScene::new(seed)),
        SceneKind::Herd => Box::new(herd::HerdScene::new(seed)),
        SceneKind::Mimic => Box::new(mimic::MimicScene::new(seed)),
        SceneKind::Kaleido => Box::new(kaleido::KaleidoScene::new()),
    }
}
