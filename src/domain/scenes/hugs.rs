// Hugs: partner faces hidden around the dome. Players light up the face
// nearest to them; when every partner in a group is lit at once, the group
// completes and stays finished.

use glam::Vec2;
use rand::prelude::*;

use super::{Prop, PropKind, PropPhase, SceneKind, SceneRules};
use crate::domain::dome::DomeProjection;
use crate::domain::player::StageView;
use crate::domain::sound::SoundCommand;

#[derive(Debug, Clone, Copy)]
pub struct HugTuning {
    /// Partner groups on the dome.
    pub num_groups: usize,
    /// Faces per group that must be lit simultaneously.
    pub faces_per_group: usize,
    /// World scale of a face.
    pub face_size: f32,
    /// Radius within which a player lights its nearest face.
    pub activation_radius: f32,
}

impl Default for HugTuning {
    fn default() -> Self {
        Self {
            num_groups: 6,
            faces_per_group: 2,
            face_size: 0.8,
            activation_radius: 1.2,
        }
    }
}

#[derive(Debug, Clone)]
struct Face {
    position: glam::Vec3,
    group: usize,
    lit: bool,
    finished: bool,
}

pub struct HugScene {
    pub tuning: HugTuning,
    rng: StdRng,
    faces: Vec<Face>,
    groups_finished: usize,
    props: Vec<Prop>,
}

impl HugScene {
    pub fn new(seed: u64) -> Self {
        Self {
            tuning: HugTuning::default(),
            rng: StdRng::seed_from_u64(seed ^ 0x48_75_67),
            faces: Vec::new(),
            groups_finished: 0,
            props: Vec::new(),
        }
    }

    pub fn groups_finished(&self) -> usize {
        self.groups_finished
    }

    fn refresh_props(&mut self) {
        self.props.clear();
        self.props
            .extend(self.faces.iter().enumerate().map(|(i, f)| Prop {
                id: i as u32,
                kind: PropKind::Face,
                position: f.position,
                scale: self.tuning.face_size,
                phase: if f.finished {
                    PropPhase::Done
                } else if f.lit {
                    PropPhase::Lit
                } else {
                    PropPhase::Idle
                },
            }));
    }
}

impl SceneRules for HugScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Hugs
    }

    fn setup(&mut self, dome: &DomeProjection) {
        self.faces.clear();
        self.groups_finished = 0;
        for group in 0..self.tuning.num_groups {
            for _ in 0..self.tuning.faces_per_group {
                let flat = Vec2::new(
                    self.rng.gen_range(-1.0f32..1.0),
                    self.rng.gen_range(-1.0f32..1.0),
                );
                self.faces.push(Face {
                    position: dome.project(flat),
                    group,
                    lit: false,
                    finished: false,
                });
            }
        }
        self.refresh_props();
    }

    fn tick(&mut self, world: &StageView<'_>, _dt: f32, out: &mut Vec<SoundCommand>) {
        for face in &mut self.faces {
            if !face.finished {
                face.lit = false;
            }
        }

        // Each player lights only its nearest face, so a single body cannot
        // complete a whole group by standing between partners.
        for player in world.active_players() {
            let nearest = self
                .faces
                .iter_mut()
                .filter(|f| !f.finished)
                .min_by(|a, b| {
                    let da = a.position.distance(player.position);
                    let db = b.position.distance(player.position);
                    da.total_cmp(&db)
                });
            if let Some(face) = nearest {
                if face.position.distance(player.position) < self.tuning.activation_radius {
                    face.lit = true;
                }
            }
        }

        for group in 0..self.tuning.num_groups {
            let members = || self.faces.iter().filter(|f| f.group == group);
            if members().next().is_some()
                && members().all(|f| f.lit || f.finished)
                && members().any(|f| !f.finished)
            {
                let centroid = members().map(|f| f.position).sum::<glam::Vec3>()
                    / members().count().max(1) as f32;
                for face in self.faces.iter_mut().filter(|f| f.group == group) {
                    face.finished = true;
                }
                self.groups_finished += 1;
                out.push(SoundCommand::OneShot {
                    id: format!("group{group}HugsHugComplete"),
                    position: centroid,
                });
            }
        }

        self.refresh_props();
    }

    fn props(&self) -> &[Prop] {
        &self.props
    }

    fn complete(&self) -> bool {
        self.groups_finished == self.tuning.num_groups
    }
}
