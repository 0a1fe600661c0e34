// Mimic: a constellation of target spheres rolls onto the dome. Players
// cover them with their bodies; covering the whole set at once wins the
// round and rolls a fresh one.

use glam::Vec2;
use rand::prelude::*;

use super::{Prop, PropKind, PropPhase, SceneKind, SceneRules};
use crate::domain::dome::DomeProjection;
use crate::domain::player::StageView;
use crate::domain::sound::SoundCommand;

#[derive(Debug, Clone, Copy)]
pub struct MimicTuning {
    pub num_spheres: usize,
    pub sphere_size: f32,
    /// Radius within which a player keeps a sphere covered.
    pub activation_radius: f32,
    /// Seconds before an unfinished set is re-rolled anyway.
    pub time_between_changes: f32,
}

impl Default for MimicTuning {
    fn default() -> Self {
        Self {
            num_spheres: 4,
            sphere_size: 0.6,
            activation_radius: 1.2,
            time_between_changes: 25.0,
        }
    }
}

pub struct MimicScene {
    pub tuning: MimicTuning,
    rng: StdRng,
    positions: Vec<glam::Vec3>,
    covered: Vec<bool>,
    since_change: f32,
    sets_completed: u32,
    props: Vec<Prop>,
}

impl MimicScene {
    pub fn new(seed: u64) -> Self {
        Self {
            tuning: MimicTuning::default(),
            rng: StdRng::seed_from_u64(seed ^ 0x4d_69_6d_69_63),
            positions: Vec::new(),
            covered: Vec::new(),
            since_change: 0.0,
            sets_completed: 0,
            props: Vec::new(),
        }
    }

    pub fn sets_completed(&self) -> u32 {
        self.sets_completed
    }

    fn roll_new_set(&mut self, dome: &DomeProjection) {
        self.since_change = 0.0;
        self.positions.clear();
        for _ in 0..self.tuning.num_spheres {
            let flat = Vec2::new(
                self.rng.gen_range(-1.0f32..1.0),
                self.rng.gen_range(-1.0f32..1.0),
            );
            self.positions.push(dome.project(flat));
        }
        self.covered = vec![false; self.tuning.num_spheres];
    }

    fn refresh_props(&mut self) {
        self.props.clear();
        self.props.extend(
            self.positions
                .iter()
                .zip(&self.covered)
                .enumerate()
                .map(|(i, (&position, &covered))| Prop {
                    id: i as u32,
                    kind: PropKind::Sphere,
                    position,
                    scale: self.tuning.sphere_size,
                    phase: if covered { PropPhase::Lit } else { PropPhase::Idle },
                }),
        );
    }
}

impl SceneRules for MimicScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Mimic
    }

    fn setup(&mut self, dome: &DomeProjection) {
        self.sets_completed = 0;
        self.roll_new_set(dome);
        self.refresh_props();
    }

    fn tick(&mut self, world: &StageView<'_>, dt: f32, out: &mut Vec<SoundCommand>) {
        self.since_change += dt;
        if self.since_change > self.tuning.time_between_changes {
            self.roll_new_set(world.dome);
        }

        for (i, &position) in self.positions.iter().enumerate() {
            self.covered[i] = world
                .active_players()
                .any(|p| p.position.distance(position) < self.tuning.activation_radius);
        }

        if !self.covered.is_empty() && self.covered.iter().all(|&c| c) {
            self.sets_completed += 1;
            let centroid =
                self.positions.iter().sum::<glam::Vec3>() / self.positions.len() as f32;
            out.push(SoundCommand::OneShot {
                id: format!("set{}MimicShapeComplete", self.sets_completed),
                position: centroid,
            });
            self.roll_new_set(world.dome);
        }

        self.refresh_props();
    }

    fn props(&self) -> &[Prop] {
        &self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::Player;
    use crate::domain::tuning::PlayerTuning;
    use crate::domain::ActivityPhase;
    use glam::Vec3;

    fn player_at(id: u32, position: Vec3) -> Player {
        Player {
            id,
            position,
            target_position: position,
            visibility: 1.0,
            scale: 0.5,
            last_seen: 0.0,
            stationary_time: 0.0,
            phase: ActivityPhase::GracePeriod,
            shown: true,
            collider_enabled: true,
            sound_playing: true,
        }
    }

    #[test]
    fn when_every_sphere_is_covered_then_the_set_completes_and_rerolls() {
        let dome = DomeProjection::default();
        let player_tuning = PlayerTuning::default();
        let mut scene = MimicScene::new(5);
        scene.tuning.num_spheres = 2;
        scene.setup(&dome);

        let players: Vec<Player> = scene
            .positions
            .iter()
            .enumerate()
            .map(|(i, &p)| player_at(i as u32, p))
            .collect();
        let active: Vec<usize> = (0..players.len()).collect();
        let view = StageView {
            players: &players,
            active: &active,
            average_position: Vec3::ZERO,
            dome: &dome,
            tuning: &player_tuning,
        };
        let mut out = Vec::new();

        scene.tick(&view, 1.0 / 60.0, &mut out);

        assert_eq!(scene.sets_completed(), 1);
        assert!(out.iter().any(|c| matches!(c, SoundCommand::OneShot { id, .. }
            if id == "set1MimicShapeComplete")));
        // A fresh set is live and uncovered in the published props.
        assert!(scene.props().iter().all(|p| p.phase == PropPhase::Idle));
    }

    #[test]
    fn when_the_timer_runs_out_then_the_set_rerolls_without_completing() {
        let dome = DomeProjection::default();
        let player_tuning = PlayerTuning::default();
        let mut scene = MimicScene::new(5);
        scene.tuning.time_between_changes = 0.5;
        scene.setup(&dome);
        let before = scene.positions.clone();

        let players: [Player; 0] = [];
        let active: [usize; 0] = [];
        let view = StageView {
            players: &players,
            active: &active,
            average_position: Vec3::ZERO,
            dome: &dome,
            tuning: &player_tuning,
        };
        for _ in 0..60 {
            scene.tick(&view, 1.0 / 60.0, &mut Vec::new());
        }

        assert_eq!(scene.sets_completed(), 0);
        assert_ne!(scene.positions, before);
    }
}
