// WithMe: players eat dots to grow bigger. When two well-fed players
// collide, their dots are released back into the world.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use rand::prelude::*;

use super::{Prop, PropKind, PropPhase, SceneKind, SceneRules};
use crate::domain::dome::DomeProjection;
use crate::domain::player::{Player, PlayerId, StageView};
use crate::domain::sound::{self, SoundCommand};
use crate::domain::tuning::PlayerTuning;

#[derive(Debug, Clone, Copy)]
pub struct WithMeTuning {
    /// Dots on the dome at setup.
    pub num_dots: usize,
    /// World scale of a dot.
    pub dot_size: f32,
    /// Radius within which a player collects a free dot.
    pub collect_radius: f32,
    /// Hard cap per player.
    pub max_dots_per_player: u32,
    /// Minimum load on both players before a collision releases anything.
    pub min_dots_for_collision: u32,
    /// Avatar growth per collected dot.
    pub size_increment_on_collect: f32,
    /// Seconds between regeneration waves.
    pub regen_interval: f32,
    /// Dots added per wave.
    pub dots_to_regenerate: usize,
    /// Collect total that finishes the level.
    pub total_for_completion: u32,
    /// Spring strength pulling a dot toward its collector (per second).
    pub force_towards_collector: f32,
    /// Velocity damping per second.
    pub dampening: f32,
}

impl Default for WithMeTuning {
    fn default() -> Self {
        Self {
            num_dots: 40,
            dot_size: 0.3,
            collect_radius: 0.6,
            max_dots_per_player: 8,
            min_dots_for_collision: 2,
            size_increment_on_collect: 0.1,
            regen_interval: 30.0,
            dots_to_regenerate: 5,
            total_for_completion: 60,
            force_towards_collector: 8.0,
            dampening: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Dot {
    position: Vec3,
    velocity: Vec3,
    original_position: Vec3,
    collected: bool,
    collector: Option<PlayerId>,
}

pub struct WithMeScene {
    pub tuning: WithMeTuning,
    rng: StdRng,
    dots: Vec<Dot>,
    collected_by: HashMap<PlayerId, u32>,
    total_collected: u32,
    regen_timer: f32,
    level_complete: bool,
    props: Vec<Prop>,
}

impl WithMeScene {
    pub fn new(seed: u64) -> Self {
        Self {
            tuning: WithMeTuning::default(),
            rng: StdRng::seed_from_u64(seed ^ 0x77_49_74_68_4d_65),
            dots: Vec::new(),
            collected_by: HashMap::new(),
            total_collected: 0,
            regen_timer: 0.0,
            level_complete: false,
            props: Vec::new(),
        }
    }

    pub fn dots_collected_by(&self, id: PlayerId) -> u32 {
        self.collected_by.get(&id).copied().unwrap_or(0)
    }

    pub fn total_collected(&self) -> u32 {
        self.total_collected
    }

    fn spawn_dot(&mut self, dome: &DomeProjection) {
        let flat = Vec2::new(
            self.rng.gen_range(-1.0f32..1.0),
            self.rng.gen_range(-1.0f32..1.0),
        );
        let position = dome.project(flat);
        self.dots.push(Dot {
            position,
            velocity: Vec3::ZERO,
            original_position: position,
            collected: false,
            collector: None,
        });
    }

    fn refresh_props(&mut self) {
        self.props.clear();
        self.props.extend(self.dots.iter().enumerate().map(|(i, d)| Prop {
            id: i as u32,
            kind: PropKind::Dot,
            position: d.position,
            scale: self.tuning.dot_size,
            phase: if d.collected {
                PropPhase::Lit
            } else {
                PropPhase::Idle
            },
        }));
    }
}

impl SceneRules for WithMeScene {
    fn kind(&self) -> SceneKind {
        SceneKind::WithMe
    }

    fn setup(&mut self, dome: &DomeProjection) {
        self.dots.clear();
        self.collected_by.clear();
        self.total_collected = 0;
        self.regen_timer = self.tuning.regen_interval;
        self.level_complete = false;
        for _ in 0..self.tuning.num_dots {
            self.spawn_dot(dome);
        }
        self.refresh_props();
    }

    fn avatar_scale(&self, player: &Player, tuning: &PlayerTuning) -> f32 {
        let collected = self.dots_collected_by(player.id) as f32;
        (tuning.start_size + collected * self.tuning.size_increment_on_collect) * player.visibility
    }

    fn trigger_radius(&self) -> f32 {
        self.tuning.collect_radius
    }

    fn on_player_trigger(
        &mut self,
        player: &Player,
        prop_index: usize,
        out: &mut Vec<SoundCommand>,
    ) {
        let Some(dot) = self.dots.get_mut(prop_index) else {
            return;
        };
        // No recollecting.
        if dot.collected {
            return;
        }
        let count = self.collected_by.entry(player.id).or_insert(0);
        if *count >= self.tuning.max_dots_per_player {
            return;
        }

        dot.collected = true;
        dot.collector = Some(player.id);
        *count += 1;
        self.total_collected += 1;

        out.push(SoundCommand::OneShot {
            id: sound::effect_id(SceneKind::WithMe.sound_tag(), player.id, "PointCollision"),
            position: player.position,
        });

        if self.total_collected >= self.tuning.total_for_completion && !self.level_complete {
            self.level_complete = true;
            out.push(SoundCommand::OneShot {
                id: "WithMeLevelComplete".to_string(),
                position: player.position,
            });
        }
    }

    fn on_players_collided(&mut self, a: &Player, b: &Player, out: &mut Vec<SoundCommand>) {
        let min = self.tuning.min_dots_for_collision;
        if self.dots_collected_by(a.id) < min || self.dots_collected_by(b.id) < min {
            return;
        }

        // Both players burst: their dots scatter back to where they spawned.
        for dot in &mut self.dots {
            if dot.collector == Some(a.id) || dot.collector == Some(b.id) {
                dot.collected = false;
                dot.collector = None;
            }
        }
        self.collected_by.insert(a.id, 0);
        self.collected_by.insert(b.id, 0);

        out.push(SoundCommand::OneShot {
            id: sound::effect_id(SceneKind::WithMe.sound_tag(), a.id, "PlayerCollision"),
            position: (a.position + b.position) / 2.0,
        });
    }

    fn tick(&mut self, world: &StageView<'_>, dt: f32, _out: &mut Vec<SoundCommand>) {
        let tuning = self.tuning;

        for dot in &mut self.dots {
            let target = dot
                .collector
                .and_then(|id| world.players.iter().find(|p| p.id == id))
                .map(|p| p.position)
                .unwrap_or(dot.original_position);

            dot.velocity += (target - dot.position) * tuning.force_towards_collector * dt;
            dot.velocity *= (-tuning.dampening * dt).exp();
            dot.position += dot.velocity * dt;
        }

        if !self.level_complete {
            self.regen_timer -= dt;
            if self.regen_timer <= 0.0 {
                self.regen_timer = tuning.regen_interval;
                for _ in 0..tuning.dots_to_regenerate {
                    self.spawn_dot(world.dome);
                }
            }
        }

        self.refresh_props();
    }

    fn props(&self) -> &[Prop] {
        &self.props
    }

    fn complete(&self) -> bool {
        self.level_complete
    }
}
