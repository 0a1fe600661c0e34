// Herd: players shepherd a skittish flock toward a glowing gate on the dome.
// Members that pass through score and respawn on the far side.

use glam::Vec2;
use rand::prelude::*;

use super::flock::{self, Boid, FlockTuning};
use super::{Prop, PropKind, PropPhase, SceneKind, SceneRules};
use crate::domain::dome::DomeProjection;
use crate::domain::player::StageView;
use crate::domain::sound::SoundCommand;

#[derive(Debug, Clone, Copy)]
pub struct HerdTuning {
    pub flock: FlockTuning,
    /// Radius within which a player spooks herd members.
    pub repel_radius: f32,
    pub repel_force: f32,
    /// Radius of the gate on the dome.
    pub gate_radius: f32,
    /// Scored members before the scene completes.
    pub score_target: u32,
}

impl Default for HerdTuning {
    fn default() -> Self {
        Self {
            flock: FlockTuning {
                num_boids: 30,
                attraction_force: 0.0,
                ..FlockTuning::default()
            },
            repel_radius: 2.5,
            repel_force: 6.0,
            gate_radius: 1.5,
            score_target: 20,
        }
    }
}

pub struct HerdScene {
    pub tuning: HerdTuning,
    rng: StdRng,
    boids: Vec<Boid>,
    gate: glam::Vec3,
    scored: u32,
    props: Vec<Prop>,
}

impl HerdScene {
    pub fn new(seed: u64) -> Self {
        Self {
            tuning: HerdTuning::default(),
            rng: StdRng::seed_from_u64(seed ^ 0x48_65_72_64),
            boids: Vec::new(),
            gate: glam::Vec3::ZERO,
            scored: 0,
            props: Vec::new(),
        }
    }

    pub fn scored(&self) -> u32 {
        self.scored
    }

    fn roll_gate(&mut self, dome: &DomeProjection) {
        let flat = Vec2::new(
            self.rng.gen_range(-1.0f32..1.0),
            self.rng.gen_range(-1.0f32..1.0),
        );
        self.gate = dome.project(flat);
    }

    fn refresh_props(&mut self) {
        self.props.clear();
        // The gate rides along as the last prop so the renderer can draw it.
        self.props
            .extend(self.boids.iter().enumerate().map(|(i, b)| Prop {
                id: i as u32,
                kind: PropKind::Boid,
                position: b.position,
                scale: self.tuning.flock.boid_size,
                phase: PropPhase::Idle,
            }));
        self.props.push(Prop {
            id: self.boids.len() as u32,
            kind: PropKind::Node,
            position: self.gate,
            scale: self.tuning.gate_radius,
            phase: PropPhase::Lit,
        });
    }
}

impl SceneRules for HerdScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Herd
    }

    fn setup(&mut self, dome: &DomeProjection) {
        self.boids.clear();
        self.scored = 0;
        self.roll_gate(dome);
        for _ in 0..self.tuning.flock.num_boids {
            let boid = flock::spawn_inside(&mut self.rng, dome);
            self.boids.push(boid);
        }
        self.refresh_props();
    }

    fn tick(&mut self, world: &StageView<'_>, dt: f32, out: &mut Vec<SoundCommand>) {
        let tuning = self.tuning;

        for i in 0..self.boids.len() {
            let mut force = flock::flock_steering(&self.boids, i, &tuning.flock);

            // Players push, never pull; shepherding is all pressure.
            for player in world.active_players() {
                let offset = self.boids[i].position - player.position;
                let distance = offset.length();
                if distance < tuning.repel_radius && distance > f32::EPSILON {
                    force += offset / distance * tuning.repel_force
                        * (1.0 - distance / tuning.repel_radius);
                }
            }

            integrate_and_score(self, i, force, dt, world.dome, out);
        }

        self.refresh_props();
    }

    fn props(&self) -> &[Prop] {
        &self.props
    }

    fn complete(&self) -> bool {
        self.scored >= self.tuning.score_target
    }
}

fn integrate_and_score(
    scene: &mut HerdScene,
    i: usize,
    force: glam::Vec3,
    dt: f32,
    dome: &DomeProjection,
    out: &mut Vec<SoundCommand>,
) {
    let flock_tuning = scene.tuning.flock;
    flock::integrate(
        &mut scene.boids[i],
        force,
        dt,
        dome,
        flock_tuning.min_speed,
        flock_tuning.max_speed,
        flock_tuning.containment_force,
    );

    if scene.boids[i].position.distance(scene.gate) < scene.tuning.gate_radius {
        scene.scored += 1;
        out.push(SoundCommand::OneShot {
            id: format!("herd{}HerdGateScored", i),
            position: scene.gate,
        });
        scene.boids[i] = flock::spawn_inside(&mut scene.rng, dome);
    }
}
