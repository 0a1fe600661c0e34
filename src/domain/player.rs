// The authoritative player substrate: one record per tracked participant,
// updated from camera input and advanced once per stage tick.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use tracing::{info, warn};

use super::activity::{self, ActivityPhase};
use super::dome::{self, DomeProjection};
use super::sound::{self, SoundCommand};
use super::tuning::{PlayerTuning, TrackingTuning};

/// External identifier assigned by the tracking feed.
pub type PlayerId = u32;

/// One tracked participant. Records are created on first input and hidden,
/// never removed, once tracking loses them.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,

    /// Smoothed position, moved toward `target_position` every tick.
    pub position: Vec3,

    /// Latest committed dome-mapped position.
    pub target_position: Vec3,

    /// Visibility scalar in [0, 1]; drives render scale and activation.
    pub visibility: f32,

    /// World scale of the avatar, recomputed each tick by the scene rules.
    pub scale: f32,

    /// Stage-clock seconds of the last committed input.
    pub last_seen: f64,

    /// Seconds since the last input, regardless of distance moved.
    pub stationary_time: f32,

    pub phase: ActivityPhase,

    /// Whether the render object is on.
    pub shown: bool,

    /// Whether the avatar participates in collisions.
    pub collider_enabled: bool,

    /// Whether the player's continuous loop is currently playing.
    pub sound_playing: bool,
}

impl Player {
    /// Threshold-based projection of the visibility scalar; independent of
    /// the fade phase, so a shrinking player stays active until the scalar
    /// crosses the threshold.
    pub fn active(&self, tuning: &PlayerTuning) -> bool {
        self.visibility >= tuning.activation_threshold
    }
}

/// Per-player state published in world updates.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: Vec3,
    pub scale: f32,
    pub visibility: f32,
    pub active: bool,
}

impl Player {
    fn snapshot(&self, tuning: &PlayerTuning) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            position: self.position,
            scale: self.scale,
            visibility: self.visibility,
            active: self.active(tuning),
        }
    }
}

/// Read-only view of the substrate handed to scene rules each tick.
#[derive(Clone, Copy)]
pub struct StageView<'a> {
    pub players: &'a [Player],
    /// Arena indices of active players.
    pub active: &'a [usize],
    pub average_position: Vec3,
    pub dome: &'a DomeProjection,
    pub tuning: &'a PlayerTuning,
}

impl StageView<'_> {
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.active.iter().map(|&i| &self.players[i])
    }
}

/// Arena of player records plus an external-id index. Insertions append;
/// there is no removal path, so indices stay stable for a whole session.
pub struct PlayerRegistry {
    pub dome: DomeProjection,
    pub tracking: TrackingTuning,
    pub tuning: PlayerTuning,

    players: Vec<Player>,
    index_by_id: HashMap<PlayerId, usize>,
    sound_tag: &'static str,

    /// Mean position of active players, zero when nobody is active.
    pub average_position: Vec3,
    /// Arena indices of active players, rebuilt every tick.
    pub active_players: Vec<usize>,
}

impl PlayerRegistry {
    pub fn new(dome: DomeProjection, tracking: TrackingTuning, tuning: PlayerTuning) -> Self {
        Self {
            dome,
            tracking,
            tuning,
            players: Vec::new(),
            index_by_id: HashMap::new(),
            sound_tag: "",
            average_position: Vec3::ZERO,
            active_players: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_at(&self, index: usize) -> &Player {
        &self.players[index]
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.index_by_id.get(&id).map(|&i| &self.players[i])
    }

    pub fn sound_tag(&self) -> &'static str {
        self.sound_tag
    }

    pub fn view(&self) -> StageView<'_> {
        StageView {
            players: &self.players,
            active: &self.active_players,
            average_position: self.average_position,
            dome: &self.dome,
            tuning: &self.tuning,
        }
    }

    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players
            .iter()
            .map(|p| p.snapshot(&self.tuning))
            .collect()
    }

    /// Registers a new player and starts its continuous loop. A duplicate id
    /// logs and leaves the existing record untouched.
    pub fn create(&mut self, id: PlayerId, now: f64, out: &mut Vec<SoundCommand>) {
        if self.index_by_id.contains_key(&id) {
            warn!(player_id = id, "player already exists; ignoring create");
            return;
        }

        let position = self.dome.project(Vec2::ZERO);
        let player = Player {
            id,
            position,
            target_position: position,
            visibility: 0.001,
            scale: self.tuning.start_size * 0.001,
            last_seen: now,
            stationary_time: 0.0,
            phase: ActivityPhase::Reactivating,
            shown: true,
            collider_enabled: true,
            sound_playing: true,
        };
        self.index_by_id.insert(id, self.players.len());
        self.players.push(player);

        out.push(SoundCommand::Start {
            id: sound::player_loop_id(self.sound_tag, id),
            position,
        });
        info!(player_id = id, ?position, "player created");
    }

    /// Applies one tracking update. An unknown id is registered first: the
    /// camera rig can reorder or drop creation messages, so position updates
    /// are a documented upsert.
    pub fn apply_input(&mut self, id: PlayerId, raw: Vec2, now: f64, out: &mut Vec<SoundCommand>) {
        if !self.index_by_id.contains_key(&id) {
            warn!(player_id = id, "input for unknown player; creating");
            self.create(id, now, out);
        }
        let index = self.index_by_id[&id];

        let flat = dome::remap_camera(raw, self.tracking.camera_resolution, self.tracking.remap);
        let target = self.dome.project(flat);

        let player = &mut self.players[index];
        player.stationary_time = 0.0;

        // Below the tolerance the new target is sensor jitter.
        if player.target_position.distance(target) > self.tuning.target_tolerance {
            player.target_position = target;
            player.last_seen = now;
        }

        // Audio cadence is decoupled from visual smoothing: reposition the
        // loop only for movement the listener could notice.
        if player.sound_playing
            && player.position.distance(target) > self.tuning.sound_move_threshold
        {
            out.push(SoundCommand::Update {
                id: sound::player_loop_id(self.sound_tag, id),
                position: player.position,
            });
        }
    }

    /// Advances every player by one tick and rebuilds the aggregates.
    /// `scale_of` is the scene's avatar-scale rule.
    pub fn tick(
        &mut self,
        dt: f32,
        now: f64,
        scale_of: impl Fn(&Player) -> f32,
        out: &mut Vec<SoundCommand>,
    ) {
        for player in &mut self.players {
            player.stationary_time += dt;

            let t = (self.tuning.lerp_speed * dt).min(1.0);
            player.position = player.position.lerp(player.target_position, t);

            activity::advance(player, dt, now, &self.tuning, self.sound_tag, out);
            player.scale = scale_of(player);
        }

        self.active_players.clear();
        let mut sum = Vec3::ZERO;
        for (i, player) in self.players.iter().enumerate() {
            if player.active(&self.tuning) {
                self.active_players.push(i);
                sum += player.position;
            }
        }
        self.average_position = if self.active_players.is_empty() {
            Vec3::ZERO
        } else {
            sum / self.active_players.len() as f32
        };
    }

    /// Moves every playing loop onto the new scene's sound channels. Called
    /// on scene switches so ids never leak across scenes.
    pub fn set_sound_tag(&mut self, tag: &'static str, out: &mut Vec<SoundCommand>) {
        if tag == self.sound_tag {
            return;
        }
        for player in &self.players {
            if player.sound_playing {
                out.push(SoundCommand::Stop {
                    id: sound::player_loop_id(self.sound_tag, player.id),
                    position: player.position,
                });
                out.push(SoundCommand::Start {
                    id: sound::player_loop_id(tag, player.id),
                    position: player.position,
                });
            }
        }
        self.sound_tag = tag;
    }
}
