// Use cases layer: application workflows for the stage server.

pub mod stage;
pub mod types;

pub use stage::{StageSettings, stage_task};
pub use types::{SceneState, StageEvent, StageStatus, WorldUpdate};
