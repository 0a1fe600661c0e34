// Kaleido: the dome becomes a kaleidoscope. Every active player is redrawn
// as a ring of rotated copies that breathe in and out of the shell.

use glam::Quat;

use super::{Prop, PropKind, PropPhase, SceneKind, SceneRules};
use crate::domain::dome::DomeProjection;
use crate::domain::player::StageView;
use crate::domain::sound::SoundCommand;

#[derive(Debug, Clone, Copy)]
pub struct KaleidoTuning {
    /// Rotated copies per player.
    pub iterations: usize,
    /// Node scale relative to the player's avatar scale.
    pub size_multiplier: f32,
    /// How far the redrawn radius breathes in and out.
    pub oscillation_size: f32,
    /// How fast it breathes, radians per second.
    pub oscillation_speed: f32,
}

impl Default for KaleidoTuning {
    fn default() -> Self {
        Self {
            iterations: 10,
            size_multiplier: 0.3,
            oscillation_size: 1.0,
            oscillation_speed: 0.8,
        }
    }
}

pub struct KaleidoScene {
    pub tuning: KaleidoTuning,
    elapsed: f32,
    props: Vec<Prop>,
}

impl KaleidoScene {
    pub fn new() -> Self {
        Self {
            tuning: KaleidoTuning::default(),
            elapsed: 0.0,
            props: Vec::new(),
        }
    }
}

impl Default for KaleidoScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRules for KaleidoScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Kaleido
    }

    fn setup(&mut self, _dome: &DomeProjection) {
        self.elapsed = 0.0;
        self.props.clear();
    }

    fn tick(&mut self, world: &StageView<'_>, dt: f32, _out: &mut Vec<SoundCommand>) {
        self.elapsed += dt;
        let radius = world.dome.sphere_radius
            + self.tuning.oscillation_size * (self.elapsed * self.tuning.oscillation_speed).sin();

        self.props.clear();
        let mut id = 0u32;
        for player in world.active_players() {
            let on_shell = player.position.normalize_or_zero() * radius;
            for j in 0..self.tuning.iterations {
                let angle =
                    std::f32::consts::TAU * j as f32 / self.tuning.iterations.max(1) as f32;
                let rotated = Quat::from_rotation_y(angle) * on_shell;
                self.props.push(Prop {
                    id,
                    kind: PropKind::Node,
                    position: rotated,
                    scale: player.scale * self.tuning.size_multiplier,
                    phase: PropPhase::Lit,
                });
                id += 1;
            }
        }
    }

    fn props(&self) -> &[Prop] {
        &self.props
    }
}
