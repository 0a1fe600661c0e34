// Domain layer: dome math, player substrate, and scene rules.

pub mod activity;
pub mod dome;
pub mod player;
pub mod scenes;
pub mod sound;
pub mod tuning;

pub use activity::ActivityPhase;
pub use dome::DomeProjection;
pub use player::{Player, PlayerId, PlayerRegistry, PlayerSnapshot, StageView};
pub use sound::SoundCommand;
pub use tuning::{PlayerTuning, TrackingTuning};
