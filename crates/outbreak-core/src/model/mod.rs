//! Domain data model for the infection deck tracker.
//!
//! This module is composed of:
//! - `city`: immutable reference data and the `CityId` key type.
//! - `stack`: the deck as ordered strata of indistinguishable cards.
//! - `turn`: typed event-log entries.
//! - `game`: per-game metadata and the event-log seam.

pub mod city;
pub mod game;
pub mod stack;
pub mod turn;

pub use city::{City, CityColor, CityId};
pub use game::{GameMeta, InMemoryLog, TurnSource};
pub use stack::{
    CityCounts, DISCARD, EXILE_BOX, FORECAST_OFFSET, SETASIDE_BOX, StackModel, StackWarning,
};
pub use turn::{CityInfection, ExileRecord, ForecastRecord, TurnRecord};
