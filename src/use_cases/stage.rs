// The stage task: the single authoritative loop for the whole installation.
// All player and scene state lives here; adapters only enqueue inputs and
// consume outputs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};

use crate::domain::scenes::{self, SceneKind, SceneRules};
use crate::domain::{PlayerRegistry, SoundCommand};

use super::types::{SceneState, StageEvent, StageStatus, WorldUpdate};

/// Settings for spawning a stage loop.
#[derive(Debug, Clone)]
pub struct StageSettings {
    /// Fixed tick interval for the stage loop.
    pub tick_interval: Duration,
    /// How long a scene runs before the stage rotates on; zero pins the
    /// current scene.
    pub scene_duration: Duration,
    /// Linger after a scene reports complete before rotating.
    pub complete_linger: Duration,
    /// Seed for deterministic prop placement.
    pub placement_seed: u64,
    pub initial_scene: SceneKind,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

pub async fn stage_task(
    mut registry: PlayerRegistry,
    mut input_rx: mpsc::Receiver<StageEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    scene_tx: watch::Sender<SceneState>,
    status_tx: watch::Sender<StageStatus>,
    sound_tx: mpsc::Sender<SoundCommand>,
    settings: StageSettings,
    shutdown: Arc<tokio::sync::Notify>,
) {
    let mut tick: u64 = 0;
    let mut now: f64 = 0.0;
    let dt = settings.tick_interval.as_secs_f32();

    let mut sounds: Vec<SoundCommand> = Vec::new();
    let mut rules = enter_scene(
        settings.initial_scene,
        &settings,
        &mut registry,
        &mut sounds,
    );
    let mut scene_elapsed = 0.0f32;
    let mut linger: Option<f32> = None;

    let mut interval = tokio::time::interval(settings.tick_interval);
    let mut last_sound_drop_log = Instant::now() - LOG_THROTTLE;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the runtime shuts the stage down.
                break;
            }
            _ = interval.tick() => {}
        }

        tick += 1;
        now += dt as f64;
        scene_elapsed += dt;

        // Apply every queued input in arrival order. Several updates for one
        // player in a single tick all land; the last target wins.
        while let Ok(event) = input_rx.try_recv() {
            match event {
                StageEvent::Position { player_id, raw } => {
                    registry.apply_input(player_id, raw, now, &mut sounds);
                }
                StageEvent::SetScene { scene } => {
                    if scene != rules.kind() {
                        info!(scene = scene.name(), "manual scene switch");
                        rules = enter_scene(scene, &settings, &mut registry, &mut sounds);
                        scene_elapsed = 0.0;
                        linger = None;
                        // send_replace keeps the stored value fresh even
                        // while no feed client is subscribed.
                        scene_tx.send_replace(SceneState {
                            scene,
                            changed_at_tick: tick,
                        });
                    }
                }
            }
        }

        let player_tuning = registry.tuning;
        registry.tick(dt, now, |p| rules.avatar_scale(p, &player_tuning), &mut sounds);

        run_triggers(&registry, rules.as_mut(), &mut sounds);
        run_collisions(&registry, rules.as_mut(), &mut sounds);
        rules.tick(&registry.view(), dt, &mut sounds);

        // Scene scheduling: a completed scene lingers briefly, a long-running
        // one rotates on the clock.
        if rules.complete() && linger.is_none() {
            info!(scene = rules.kind().name(), "scene complete");
            linger = Some(settings.complete_linger.as_secs_f32());
        }
        let rotate = match linger.as_mut() {
            Some(left) => {
                *left -= dt;
                *left <= 0.0
            }
            None => {
                !settings.scene_duration.is_zero()
                    && scene_elapsed >= settings.scene_duration.as_secs_f32()
            }
        };
        if rotate {
            let next = rules.kind().next();
            rules = enter_scene(next, &settings, &mut registry, &mut sounds);
            scene_elapsed = 0.0;
            linger = None;
            scene_tx.send_replace(SceneState {
                scene: next,
                changed_at_tick: tick,
            });
        }

        let _ = world_tx.send(WorldUpdate {
            tick,
            scene: rules.kind(),
            players: registry.snapshots(),
            props: rules.props().to_vec(),
            average_position: registry.average_position,
            num_active: registry.active_players.len(),
        });
        status_tx.send_replace(StageStatus {
            scene: rules.kind(),
            tick,
            num_players: registry.len(),
            num_active: registry.active_players.len(),
        });

        for command in sounds.drain(..) {
            match sound_tx.try_send(command) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if should_log(&mut last_sound_drop_log) {
                        warn!("sound channel full; dropping commands");
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if should_log(&mut last_sound_drop_log) {
                        warn!("sound channel closed; commands are discarded");
                    }
                }
            }
        }
    }
}

/// Builds and initializes the rules for a scene, moving player loops onto
/// the new scene's sound channels.
fn enter_scene(
    kind: SceneKind,
    settings: &StageSettings,
    registry: &mut PlayerRegistry,
    sounds: &mut Vec<SoundCommand>,
) -> Box<dyn SceneRules> {
    info!(scene = kind.name(), "entering scene");
    registry.set_sound_tag(kind.sound_tag(), sounds);
    let mut rules = scenes::make_scene(kind, settings.placement_seed);
    rules.setup(&registry.dome);
    rules
}

/// Reports every (active player, prop) overlap to the scene.
fn run_triggers(
    registry: &PlayerRegistry,
    rules: &mut dyn SceneRules,
    sounds: &mut Vec<SoundCommand>,
) {
    let radius = rules.trigger_radius();
    if radius <= 0.0 {
        return;
    }

    let mut hits: Vec<(usize, usize)> = Vec::new();
    for &player_index in &registry.active_players {
        let player = registry.player_at(player_index);
        for (prop_index, prop) in rules.props().iter().enumerate() {
            if player.position.distance(prop.position) < radius {
                hits.push((player_index, prop_index));
            }
        }
    }
    for (player_index, prop_index) in hits {
        rules.on_player_trigger(registry.player_at(player_index), prop_index, sounds);
    }
}

/// Reports touching pairs of live avatars to the scene.
fn run_collisions(
    registry: &PlayerRegistry,
    rules: &mut dyn SceneRules,
    sounds: &mut Vec<SoundCommand>,
) {
    let threshold = registry.tuning.collision_threshold;
    let active = &registry.active_players;
    for (i, &a_index) in active.iter().enumerate() {
        for &b_index in &active[i + 1..] {
            let a = registry.player_at(a_index);
            let b = registry.player_at(b_index);
            if !a.collider_enabled || !b.collider_enabled {
                continue;
            }
            let gap = a.position.distance(b.position) - a.scale / 2.0 - b.scale / 2.0;
            if gap < threshold {
                rules.on_players_collided(a, b, sounds);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomeProjection, PlayerTuning, TrackingTuning};
    use glam::Vec2;

    fn registry() -> PlayerRegistry {
        PlayerRegistry::new(
            DomeProjection::default(),
            TrackingTuning::default(),
            PlayerTuning::default(),
        )
    }

    fn settings() -> StageSettings {
        StageSettings {
            tick_interval: Duration::from_millis(1000 / 60),
            scene_duration: Duration::from_secs(0),
            complete_linger: Duration::from_millis(100),
            placement_seed: 7,
            initial_scene: SceneKind::WithMe,
        }
    }

    #[tokio::test]
    async fn when_inputs_arrive_then_the_stage_publishes_matching_updates() {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (world_tx, mut world_rx) = broadcast::channel(64);
        let (scene_tx, _scene_rx) = watch::channel(SceneState {
            scene: SceneKind::WithMe,
            changed_at_tick: 0,
        });
        let (status_tx, status_rx) = watch::channel(StageStatus {
            scene: SceneKind::WithMe,
            tick: 0,
            num_players: 0,
            num_active: 0,
        });
        let (sound_tx, mut sound_rx) = mpsc::channel(256);
        let shutdown = Arc::new(tokio::sync::Notify::new());

        tokio::spawn(stage_task(
            registry(),
            input_rx,
            world_tx,
            scene_tx,
            status_tx,
            sound_tx,
            settings(),
            shutdown.clone(),
        ));

        input_tx
            .send(StageEvent::Position {
                player_id: 7,
                raw: Vec2::new(320.0, 320.0),
            })
            .await
            .expect("stage input should be open");

        // The player appears in an update within a few ticks.
        let update = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match world_rx.recv().await {
                    Ok(update) if update.players.iter().any(|p| p.id == 7) => break update,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => panic!("world channel closed"),
                }
            }
        })
        .await
        .expect("expected player 7 in a world update");

        assert_eq!(update.scene, SceneKind::WithMe);
        assert_eq!(status_rx.borrow().num_players, 1);

        // Creating the player started its loop.
        let first = tokio::time::timeout(Duration::from_secs(1), sound_rx.recv())
            .await
            .expect("expected a sound command")
            .expect("sound channel open");
        assert!(matches!(first, SoundCommand::Start { .. }));

        shutdown.notify_waiters();
    }

    #[tokio::test]
    async fn when_a_scene_switch_is_requested_then_feed_state_changes() {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (world_tx, _world_rx) = broadcast::channel(64);
        let (scene_tx, mut scene_rx) = watch::channel(SceneState {
            scene: SceneKind::WithMe,
            changed_at_tick: 0,
        });
        let (status_tx, _status_rx) = watch::channel(StageStatus {
            scene: SceneKind::WithMe,
            tick: 0,
            num_players: 0,
            num_active: 0,
        });
        let (sound_tx, _sound_rx) = mpsc::channel(256);
        let shutdown = Arc::new(tokio::sync::Notify::new());

        tokio::spawn(stage_task(
            registry(),
            input_rx,
            world_tx,
            scene_tx,
            status_tx,
            sound_tx,
            settings(),
            shutdown.clone(),
        ));

        input_tx
            .send(StageEvent::SetScene {
                scene: SceneKind::Mimic,
            })
            .await
            .expect("stage input should be open");

        tokio::time::timeout(Duration::from_secs(2), scene_rx.changed())
            .await
            .expect("expected a scene change")
            .expect("scene channel open");
        assert_eq!(scene_rx.borrow().scene, SceneKind::Mimic);

        shutdown.notify_waiters();
    }
}
