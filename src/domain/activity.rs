// Per-player visibility state machine, advanced once per tick from the time
// since the player's last committed input.

use tracing::debug;

use super::dome::lerp;
use super::player::Player;
use super::sound::{self, SoundCommand};
use super::tuning::PlayerTuning;

/// Phases a tracked player moves through between fresh input and full
/// deactivation. Purely descriptive: transitions derive from the visibility
/// scalar and input age, never the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityPhase {
    /// Fresh input, visibility climbing back toward full.
    Reactivating,
    /// Fresh input and fully visible.
    GracePeriod,
    /// Input went stale; shrinking toward the minimum scale.
    ShrinkingOut,
    /// Shrunk out completely; render object off, loop stopped.
    Hidden,
}

/// Slack for float comparisons against the scalar's endpoints.
const VISIBILITY_EPSILON: f32 = 0.001;

/// Advances one player's visibility, phase, collider and sound state.
/// Never fails: a player in any state tolerates any input history.
pub fn advance(
    player: &mut Player,
    dt: f32,
    now: f64,
    tuning: &PlayerTuning,
    sound_tag: &str,
    out: &mut Vec<SoundCommand>,
) {
    let age = (now - player.last_seen) as f32;

    if age <= tuning.fade_out_grace {
        let t = (tuning.fade_in_speed * dt).min(1.0);
        player.visibility = lerp(player.visibility, 1.0, t).clamp(0.0, 1.0);
        player.collider_enabled = true;
        player.phase = if player.visibility >= 1.0 - VISIBILITY_EPSILON {
            ActivityPhase::GracePeriod
        } else {
            ActivityPhase::Reactivating
        };
    } else {
        let t = (tuning.fade_out_speed * dt).min(1.0);
        player.visibility = lerp(player.visibility, tuning.min_scale, t);
        if age >= tuning.collider_timeout {
            // The blob is stale; stop blocking live players while the avatar
            // is still shrinking on screen.
            player.collider_enabled = false;
        }
        player.phase = if player.visibility <= tuning.min_scale + VISIBILITY_EPSILON {
            ActivityPhase::Hidden
        } else {
            ActivityPhase::ShrinkingOut
        };
    }

    apply_visibility(player, tuning, sound_tag, out);
}

/// Shows or hides the render object on the activation threshold and keeps
/// the continuous loop in step with it.
fn apply_visibility(
    player: &mut Player,
    tuning: &PlayerTuning,
    sound_tag: &str,
    out: &mut Vec<SoundCommand>,
) {
    if player.visibility < tuning.activation_threshold {
        if player.shown {
            player.shown = false;
            if player.sound_playing {
                player.sound_playing = false;
                out.push(SoundCommand::Stop {
                    id: sound::player_loop_id(sound_tag, player.id),
                    position: player.position,
                });
            }
            debug!(player_id = player.id, "player hidden and silenced");
        }
    } else if !player.shown {
        player.shown = true;
        if !player.sound_playing {
            player.sound_playing = true;
            out.push(SoundCommand::Start {
                id: sound::player_loop_id(sound_tag, player.id),
                position: player.position,
            });
        }
        debug!(player_id = player.id, "player shown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dome::DomeProjection;
    use crate::domain::player::PlayerRegistry;
    use crate::domain::tuning::TrackingTuning;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn registry() -> PlayerRegistry {
        PlayerRegistry::new(
            DomeProjection::default(),
            TrackingTuning::default(),
            PlayerTuning::default(),
        )
    }

    fn scale(tuning: PlayerTuning) -> impl Fn(&Player) -> f32 {
        move |p| tuning.start_size * p.visibility
    }

    /// Alternating blob positions far enough apart to beat the jitter
    /// tolerance on every update.
    fn jiggle(i: usize) -> Vec2 {
        Vec2::new(300.0 + (i % 2) as f32 * 40.0, 320.0)
    }

    #[test]
    fn when_input_is_fresh_then_visibility_climbs_toward_one() {
        let mut reg = registry();
        let mut out = Vec::new();
        let scale = scale(reg.tuning);

        reg.apply_input(1, Vec2::new(320.0, 320.0), 0.0, &mut out);
        let mut last = reg.get(1).unwrap().visibility;
        let mut now = 0.0;
        for i in 0..240 {
            now += DT as f64;
            // Jiggle the blob: a target inside the jitter tolerance does not
            // refresh the last-seen clock.
            reg.apply_input(1, jiggle(i), now, &mut out);
            reg.tick(DT, now, &scale, &mut out);
            let v = reg.get(1).unwrap().visibility;
            assert!(v >= last);
            last = v;
        }
        assert!(last > 0.99);
        assert_eq!(reg.get(1).unwrap().phase, ActivityPhase::GracePeriod);
    }

    #[test]
    fn when_input_stops_then_fade_is_monotonic_and_active_flips_once() {
        let mut reg = registry();
        let mut out = Vec::new();
        let scale = scale(reg.tuning);

        reg.apply_input(3, Vec2::new(320.0, 320.0), 0.0, &mut out);
        // Fade in fully first.
        let mut now = 0.0;
        for i in 0..120 {
            now += DT as f64;
            reg.apply_input(3, jiggle(i), now, &mut out);
            reg.tick(DT, now, &scale, &mut out);
        }

        // Silence. Let the grace window burn off first; the scalar still
        // climbs until the input is properly stale.
        for _ in 0..30 {
            now += DT as f64;
            reg.tick(DT, now, &scale, &mut out);
        }

        // Count activation edges while the scalar decays.
        let mut last = reg.get(3).unwrap().visibility;
        let mut was_active = true;
        let mut deactivations = 0;
        for _ in 0..1200 {
            now += DT as f64;
            reg.tick(DT, now, &scale, &mut out);
            let p = reg.get(3).unwrap();
            assert!(p.visibility <= last + 1e-6, "fade-out must be monotonic");
            last = p.visibility;
            let active = p.active(&reg.tuning);
            if was_active && !active {
                deactivations += 1;
            }
            was_active = active;
        }

        assert_eq!(deactivations, 1);
        let p = reg.get(3).unwrap();
        assert_eq!(p.phase, ActivityPhase::Hidden);
        assert!(!p.active(&reg.tuning));
        assert!(p.visibility <= reg.tuning.min_scale + 0.002);
    }

    #[test]
    fn when_player_shrinks_out_then_stop_fires_exactly_once() {
        let mut reg = registry();
        let mut out = Vec::new();
        let scale = scale(reg.tuning);

        reg.apply_input(3, Vec2::new(320.0, 320.0), 0.0, &mut out);
        let mut now = 0.0;
        for _ in 0..1200 {
            now += DT as f64;
            reg.tick(DT, now, &scale, &mut out);
        }

        let stops = out
            .iter()
            .filter(|c| matches!(c, SoundCommand::Stop { .. }))
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn when_collider_times_out_then_avatar_stops_colliding_before_hiding() {
        let mut reg = registry();
        let mut out = Vec::new();
        let scale = scale(reg.tuning);

        reg.apply_input(6, Vec2::new(320.0, 320.0), 0.0, &mut out);
        let mut now = 0.0;
        for i in 0..120 {
            now += DT as f64;
            reg.apply_input(6, jiggle(i), now, &mut out);
            reg.tick(DT, now, &scale, &mut out);
        }

        // Just past the collider timeout the avatar is still shrinking but
        // no longer collides.
        for _ in 0..70 {
            now += DT as f64;
            reg.tick(DT, now, &scale, &mut out);
        }
        let p = reg.get(6).unwrap();
        assert_eq!(p.phase, ActivityPhase::ShrinkingOut);
        assert!(!p.collider_enabled);
        assert!(p.shown);
    }

    #[test]
    fn when_hidden_player_gets_input_then_it_reuses_its_slot_and_restarts() {
        let mut reg = registry();
        let mut out = Vec::new();
        let scale = scale(reg.tuning);

        reg.apply_input(5, Vec2::new(320.0, 320.0), 0.0, &mut out);
        // Ten minutes of silence.
        let mut now = 0.0;
        for _ in 0..600 {
            now += 1.0;
            reg.tick(1.0, now, &scale, &mut out);
        }
        assert_eq!(reg.get(5).unwrap().phase, ActivityPhase::Hidden);
        out.clear();

        reg.apply_input(5, Vec2::new(200.0, 200.0), now, &mut out);
        for _ in 0..10 {
            now += DT as f64;
            reg.tick(DT, now, &scale, &mut out);
        }

        assert_eq!(reg.len(), 1, "the slot must be reused, not duplicated");
        let p = reg.get(5).unwrap();
        assert!(p.visibility > reg.tuning.min_scale + VISIBILITY_EPSILON);
        assert!(p.sound_playing);
        assert_eq!(
            out.iter()
                .filter(|c| matches!(c, SoundCommand::Start { .. }))
                .count(),
            1
        );
    }
}
