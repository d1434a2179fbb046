//! Game-log files: the YAML stand-in for the external event-log store.
//!
//! A file holds one game — its metadata, optional overrides of the
//! standard configuration, and the recorded turns with cities referred
//! to by name. Resolution turns names into ids against the final city
//! table and validates everything the engine would otherwise have to
//! trust.

use outbreak_core::config::{ConfigError, GameConfig};
use outbreak_core::model::city::{City, CityColor, CityId};
use outbreak_core::model::game::GameMeta;
use outbreak_core::model::stack::EXILE_BOX;
use outbreak_core::model::turn::{CityInfection, ExileRecord, ForecastRecord, TurnRecord};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_EPIDEMICS_PER_TURN: usize = 2;
const MAX_FORECASTS_PER_TURN: usize = 8;

#[derive(Debug, Error)]
pub enum LogFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("turn {turn}: unknown city '{name}'")]
    UnknownCity { turn: i32, name: String },
    #[error("unknown color '{color}' for city '{name}'")]
    UnknownColor { name: String, color: String },
    #[error("turn {turn}: {message}")]
    InvalidTurn { turn: i32, message: String },
    #[error("setup: {0}")]
    InvalidSetup(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Root of a game-log file.
#[derive(Debug, Clone, Deserialize)]
pub struct GameLogFile {
    pub game: GameSection,
    #[serde(default)]
    pub setup: SetupSection,
    pub turns: Vec<TurnEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameSection {
    #[serde(default = "default_game_id")]
    pub id: u64,
    pub funding_rate: u32,
    pub turn_num: i32,
}

fn default_game_id() -> u64 {
    1
}

/// Optional overrides of [`GameConfig::standard`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupSection {
    pub players: Option<u32>,
    pub extra_cards: Option<u32>,
    pub infection_rates: Option<Vec<u32>>,
    pub cities: Option<Vec<CityEntry>>,
    /// Name of the city to treat as the wildcard.
    pub wildcard: Option<String>,
    #[serde(default)]
    pub setaside: Vec<SetasideEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub color: String,
    #[serde(default = "default_card_count")]
    pub player_cards: u32,
    #[serde(default = "default_card_count")]
    pub infection_cards: u32,
}

fn default_card_count() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetasideEntry {
    pub city: String,
    #[serde(default)]
    pub player_cards: u32,
    #[serde(default)]
    pub infection_cards: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnEntry {
    pub turn: i32,
    #[serde(default)]
    pub epidemics: Vec<String>,
    #[serde(default)]
    pub infections: Vec<InfectionEntry>,
    #[serde(default)]
    pub exiles: Vec<ExileEntry>,
    #[serde(default)]
    pub forecasts: Vec<ForecastEntry>,
    #[serde(default)]
    pub monitor: u32,
    #[serde(default)]
    pub skipped_epidemics: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfectionEntry {
    pub city: String,
    #[serde(default = "default_card_count")]
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExileEntry {
    pub city: String,
    #[serde(default = "default_card_count")]
    pub count: u32,
    #[serde(default = "default_exile_target")]
    pub to: i32,
}

fn default_exile_target() -> i32 {
    EXILE_BOX
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub city: String,
    pub position: i32,
}

/// A log file resolved against its final configuration.
#[derive(Debug, Clone)]
pub struct ResolvedGame {
    pub config: GameConfig,
    pub meta: GameMeta,
    pub turns: Vec<TurnRecord>,
}

impl GameLogFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LogFileError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LogFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| LogFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the final configuration, resolves every city name, and
    /// validates the turn structure.
    pub fn resolve(self) -> Result<ResolvedGame, LogFileError> {
        let config = self.build_config()?;
        config.validate()?;

        let meta = GameMeta {
            id: self.game.id,
            funding_rate: self.game.funding_rate,
            turn_num: self.game.turn_num,
        };

        let mut turns = Vec::with_capacity(self.turns.len());
        let mut seen_turns = Vec::new();
        for entry in &self.turns {
            let turn = Self::resolve_turn(&config, entry)?;
            if seen_turns.contains(&turn.turn_num) {
                return Err(LogFileError::InvalidTurn {
                    turn: turn.turn_num,
                    message: "duplicate turn number".into(),
                });
            }
            seen_turns.push(turn.turn_num);
            turns.push(turn);
        }

        Ok(ResolvedGame {
            config,
            meta,
            turns,
        })
    }

    fn build_config(&self) -> Result<GameConfig, LogFileError> {
        let mut config = GameConfig::standard();

        if let Some(entries) = &self.setup.cities {
            let mut cities = Vec::with_capacity(entries.len());
            for entry in entries {
                let color = CityColor::from_str(&entry.color).ok_or_else(|| {
                    LogFileError::UnknownColor {
                        name: entry.name.clone(),
                        color: entry.color.clone(),
                    }
                })?;
                cities.push(
                    City::new(entry.name.clone(), color)
                        .with_cards(entry.player_cards, entry.infection_cards),
                );
            }
            config.cities = cities;
        }
        if let Some(players) = self.setup.players {
            config.num_players = players;
        }
        if let Some(extra) = self.setup.extra_cards {
            config.extra_cards = extra;
        }
        if let Some(rates) = &self.setup.infection_rates {
            config.infection_rates = rates.clone();
        }
        if let Some(name) = &self.setup.wildcard {
            let id = config
                .city_id_by_name(name)
                .ok_or_else(|| LogFileError::InvalidSetup(format!("unknown wildcard '{name}'")))?;
            config.cities[id.index()].wildcard = true;
        }

        let mut player_setaside = BTreeMap::new();
        let mut infection_setaside = BTreeMap::new();
        for entry in &self.setup.setaside {
            let id = config.city_id_by_name(&entry.city).ok_or_else(|| {
                LogFileError::InvalidSetup(format!("unknown set-aside city '{}'", entry.city))
            })?;
            if entry.player_cards > 0 {
                player_setaside.insert(id, entry.player_cards);
            }
            if entry.infection_cards > 0 {
                infection_setaside.insert(id, entry.infection_cards);
            }
        }
        config.player_setaside = player_setaside;
        config.infection_setaside = infection_setaside;

        Ok(config)
    }

    fn resolve_turn(config: &GameConfig, entry: &TurnEntry) -> Result<TurnRecord, LogFileError> {
        let turn = entry.turn;
        if turn < -1 {
            return Err(LogFileError::InvalidTurn {
                turn,
                message: "turn numbers start at -1".into(),
            });
        }
        if entry.epidemics.len() > MAX_EPIDEMICS_PER_TURN {
            return Err(LogFileError::InvalidTurn {
                turn,
                message: format!("at most {MAX_EPIDEMICS_PER_TURN} epidemics per turn"),
            });
        }
        if entry.forecasts.len() > MAX_FORECASTS_PER_TURN {
            return Err(LogFileError::InvalidTurn {
                turn,
                message: format!("at most {MAX_FORECASTS_PER_TURN} forecast entries"),
            });
        }

        let lookup = |name: &str| -> Result<CityId, LogFileError> {
            config
                .city_id_by_name(name)
                .ok_or_else(|| LogFileError::UnknownCity {
                    turn,
                    name: name.to_string(),
                })
        };

        let mut record = TurnRecord::new(turn);
        for name in &entry.epidemics {
            record.epidemics.push(lookup(name)?);
        }
        for infection in &entry.infections {
            if infection.count == 0 {
                return Err(LogFileError::InvalidTurn {
                    turn,
                    message: format!("infection of {} has count 0", infection.city),
                });
            }
            record.infections.push(CityInfection {
                city: lookup(&infection.city)?,
                count: infection.count,
            });
        }
        for exile in &entry.exiles {
            if exile.count == 0 {
                return Err(LogFileError::InvalidTurn {
                    turn,
                    message: format!("exile of {} has count 0", exile.city),
                });
            }
            record.exiles.push(ExileRecord {
                city: lookup(&exile.city)?,
                count: exile.count,
                target_stratum: exile.to,
            });
        }
        for forecast in &entry.forecasts {
            if !(1..=MAX_FORECASTS_PER_TURN as i32).contains(&forecast.position) {
                return Err(LogFileError::InvalidTurn {
                    turn,
                    message: format!(
                        "forecast position {} outside 1..={MAX_FORECASTS_PER_TURN}",
                        forecast.position
                    ),
                });
            }
            record.forecasts.push(ForecastRecord {
                city: lookup(&forecast.city)?,
                position: forecast.position,
            });
        }
        record.monitor = entry.monitor;
        record.skipped_epidemics = entry.skipped_epidemics;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::{GameLogFile, LogFileError};

    const SAMPLE: &str = r#"
game:
  funding_rate: 4
  turn_num: 1
turns:
  - turn: -1
    infections:
      - { city: "Atlanta" }
      - { city: "Cairo" }
  - turn: 0
    infections:
      - { city: "Tokyo", count: 1 }
  - turn: 1
    epidemics: ["Lima"]
    exiles:
      - { city: "Cairo" }
"#;

    fn parse(yaml: &str) -> GameLogFile {
        serde_yaml::from_str(yaml).expect("sample parses")
    }

    #[test]
    fn sample_log_resolves_against_standard_table() {
        let resolved = parse(SAMPLE).resolve().unwrap();
        assert_eq!(resolved.turns.len(), 3);
        assert_eq!(resolved.meta.funding_rate, 4);
        assert_eq!(resolved.turns[2].epidemics.len(), 1);
        // exile defaults to the exile box with one card
        assert_eq!(resolved.turns[2].exiles[0].target_stratum, -1);
        assert_eq!(resolved.turns[2].exiles[0].count, 1);
    }

    #[test]
    fn unknown_city_is_rejected_with_its_turn() {
        let yaml = SAMPLE.replace("Tokyo", "Gotham");
        let err = parse(&yaml).resolve().unwrap_err();
        match err {
            LogFileError::UnknownCity { turn, name } => {
                assert_eq!(turn, 0);
                assert_eq!(name, "Gotham");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn too_many_epidemics_are_rejected() {
        let yaml = SAMPLE.replace(
            r#"epidemics: ["Lima"]"#,
            r#"epidemics: ["Lima", "Paris", "Essen"]"#,
        );
        assert!(matches!(
            parse(&yaml).resolve(),
            Err(LogFileError::InvalidTurn { turn: 1, .. })
        ));
    }

    #[test]
    fn duplicate_turn_numbers_are_rejected() {
        let yaml = SAMPLE.replace("turn: 0", "turn: -1");
        assert!(matches!(
            parse(&yaml).resolve(),
            Err(LogFileError::InvalidTurn { .. })
        ));
    }

    #[test]
    fn wildcard_override_marks_the_city() {
        let yaml = format!(
            "{SAMPLE}setup:\n  wildcard: \"Osaka\"\n"
        );
        let resolved = parse(&yaml).resolve().unwrap();
        let id = resolved.config.city_id_by_name("Osaka").unwrap();
        assert!(resolved.config.city(id).wildcard);
        assert_eq!(resolved.config.wildcard(), Some(id));
    }

    #[test]
    fn forecast_position_is_bounded() {
        let yaml = format!(
            "{}\n  - turn: 2\n    forecasts:\n      - {{ city: \"Paris\", position: 9 }}\n",
            SAMPLE.trim_end()
        );
        assert!(matches!(
            parse(&yaml).resolve(),
            Err(LogFileError::InvalidTurn { turn: 2, .. })
        ));
    }
}
