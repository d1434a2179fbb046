#![deny(warnings)]
pub mod config;
pub mod model;
pub mod replay;
pub mod risk;

pub use config::{ConfigError, GameConfig};
pub use model::{GameMeta, InMemoryLog, StackModel, TurnRecord, TurnSource};
pub use replay::{Replay, ReplayEngine, ReplayWarning};
pub use risk::{StateReport, compute_game_state};
