// Flock: a school of boids drifts through the dome and gathers around the
// players' center of mass.

use glam::{Vec2, Vec3};
use rand::prelude::*;

use super::{Prop, PropKind, PropPhase, SceneKind, SceneRules};
use crate::domain::dome::DomeProjection;
use crate::domain::player::StageView;
use crate::domain::sound::SoundCommand;

#[derive(Debug, Clone, Copy)]
pub struct FlockTuning {
    pub num_boids: usize,
    pub boid_size: f32,

    pub separation_radius: f32,
    pub separation_force: f32,
    pub alignment_radius: f32,
    pub alignment_force: f32,
    pub cohesion_radius: f32,
    pub cohesion_force: f32,

    /// Pull toward the active players' average position.
    pub attraction_force: f32,
    /// Pull back inside the playsphere once a boid strays out.
    pub containment_force: f32,

    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for FlockTuning {
    fn default() -> Self {
        Self {
            num_boids: 60,
            boid_size: 0.15,
            separation_radius: 1.5,
            separation_force: 1.5,
            alignment_radius: 2.0,
            alignment_force: 1.0,
            cohesion_radius: 2.5,
            cohesion_force: 1.0,
            attraction_force: 0.8,
            containment_force: 4.0,
            min_speed: 1.0,
            max_speed: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Boid {
    pub position: Vec3,
    pub velocity: Vec3,
}

pub struct FlockScene {
    pub tuning: FlockTuning,
    rng: StdRng,
    boids: Vec<Boid>,
    props: Vec<Prop>,
}

impl FlockScene {
    pub fn new(seed: u64) -> Self {
        Self {
            tuning: FlockTuning::default(),
            rng: StdRng::seed_from_u64(seed ^ 0x46_6c_6f_63_6b),
            boids: Vec::new(),
            props: Vec::new(),
        }
    }

    fn refresh_props(&mut self) {
        self.props.clear();
        self.props
            .extend(self.boids.iter().enumerate().map(|(i, b)| Prop {
                id: i as u32,
                kind: PropKind::Boid,
                position: b.position,
                scale: self.tuning.boid_size,
                phase: PropPhase::Idle,
            }));
    }
}

/// Spawns a point drifting somewhere inside the dome volume.
pub(crate) fn spawn_inside(rng: &mut StdRng, dome: &DomeProjection) -> Boid {
    let flat = Vec2::new(rng.gen_range(-1.0f32..1.0), rng.gen_range(-1.0f32..1.0));
    let position = dome.project(flat) * rng.gen_range(0.5f32..0.9);
    let velocity = Vec3::new(
        rng.gen_range(-1.0f32..1.0),
        rng.gen_range(-0.3f32..0.3),
        rng.gen_range(-1.0f32..1.0),
    );
    Boid { position, velocity }
}

/// Classic three-rule steering over the whole flock for one member.
pub(crate) fn flock_steering(boids: &[Boid], i: usize, tuning: &FlockTuning) -> Vec3 {
    let me = boids[i];
    let mut separation = Vec3::ZERO;
    let mut alignment = Vec3::ZERO;
    let mut cohesion = Vec3::ZERO;
    let (mut n_sep, mut n_ali, mut n_coh) = (0, 0, 0);

    for (j, other) in boids.iter().enumerate() {
        if j == i {
            continue;
        }
        let offset = other.position - me.position;
        let distance = offset.length();
        if distance < tuning.separation_radius && distance > f32::EPSILON {
            separation -= offset.normalize() / distance;
            n_sep += 1;
        }
        if distance < tuning.alignment_radius {
            alignment += other.velocity;
            n_ali += 1;
        }
        if distance < tuning.cohesion_radius {
            cohesion += other.position;
            n_coh += 1;
        }
    }

    let mut force = Vec3::ZERO;
    if n_sep > 0 {
        force += separation / n_sep as f32 * tuning.separation_force;
    }
    if n_ali > 0 {
        force += alignment / n_ali as f32 * tuning.alignment_force;
    }
    if n_coh > 0 {
        force += (cohesion / n_coh as f32 - me.position) * tuning.cohesion_force;
    }
    force
}

/// Integrates one boid with speed clamping and playsphere containment.
pub(crate) fn integrate(
    boid: &mut Boid,
    mut force: Vec3,
    dt: f32,
    dome: &DomeProjection,
    min_speed: f32,
    max_speed: f32,
    containment_force: f32,
) {
    // Spring back toward the shell, harder the further out a boid strays.
    let from_center = boid.position - dome.origin;
    let overshoot = from_center.length() - dome.sphere_radius;
    if overshoot > 0.0 {
        force -= from_center.normalize_or_zero() * containment_force * overshoot;
    }

    boid.velocity += force * dt;
    let speed = boid.velocity.length();
    if speed > f32::EPSILON {
        let clamped = speed.clamp(min_speed, max_speed);
        boid.velocity = boid.velocity / speed * clamped;
    }
    boid.position += boid.velocity * dt;
}

impl SceneRules for FlockScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Flock
    }

    fn setup(&mut self, dome: &DomeProjection) {
        self.boids.clear();
        for _ in 0..self.tuning.num_boids {
            let boid = spawn_inside(&mut self.rng, dome);
            self.boids.push(boid);
        }
        self.refresh_props();
    }

    fn tick(&mut self, world: &StageView<'_>, dt: f32, _out: &mut Vec<SoundCommand>) {
        let tuning = self.tuning;
        let has_players = !world.active.is_empty();

        for i in 0..self.boids.len() {
            let mut force = flock_steering(&self.boids, i, &tuning);
            if has_players {
                force +=
                    (world.average_position - self.boids[i].position) * tuning.attraction_force;
            }
            integrate(
                &mut self.boids[i],
                force,
                dt,
                world.dome,
                tuning.min_speed,
                tuning.max_speed,
                tuning.containment_force,
            );
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
    use crate::domain::tuning::PlayerTuning;

    #[test]
    fn when_ticking_long_enough_then_boids_stay_near_the_playsphere() {
        let dome = DomeProjection::default();
        let player_tuning = PlayerTuning::default();
        let mut scene = FlockScene::new(3);
        scene.setup(&dome);

        let players: [crate::domain::Player; 0] = [];
        let active: [usize; 0] = [];
        let view = StageView {
            players: &players,
            active: &active,
            average_position: Vec3::ZERO,
            dome: &dome,
            tuning: &player_tuning,
        };
        for _ in 0..600 {
            scene.tick(&view, 1.0 / 60.0, &mut Vec::new());
        }

        // Containment is a soft force; allow some overshoot past the shell.
        let limit = dome.sphere_radius * 1.5;
        for boid in &scene.boids {
            assert!(
                boid.position.length() < limit,
                "boid escaped to {:?}",
                boid.position
            );
        }
    }

    #[test]
    fn when_setup_runs_then_prop_count_matches_tuning() {
        let dome = DomeProjection::default();
        let mut scene = FlockScene::new(3);
        scene.setup(&dome);

        assert_eq!(scene.props().len(), scene.tuning.num_boids);
        assert!(scene.props().iter().all(|p| p.kind == PropKind::Boid));
    }
}
