//! Static game configuration: the city table, epidemic brackets, and the
//! per-count lookup tables the estimator consumes.
//!
//! Configuration problems are build defects, so validation fails hard
//! before any game-specific computation begins. Everything here is
//! immutable after validation.

use crate::model::city::{City, CityColor, CityId};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Epidemic-count bracket: games whose city-card total is at most
/// `max_city_cards` play with `epidemics` epidemic cards. Brackets are
/// matched inclusively in ascending order; totals beyond every bracket
/// fall back to `GameConfig::fallback_epidemics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpidemicBracket {
    pub max_city_cards: u32,
    pub epidemics: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub cities: Vec<City>,
    /// Infection rate per epidemic count. The last entry doubles as the
    /// setup-round burst (epidemic counter −1).
    pub infection_rates: Vec<u32>,
    pub epidemic_brackets: Vec<EpidemicBracket>,
    pub fallback_epidemics: u32,
    pub num_players: u32,
    /// Initial hand size per player count.
    pub initial_hand_sizes: BTreeMap<u32, u32>,
    /// Player cards drawn per turn.
    pub draw_per_turn: u32,
    /// Non-city, non-epidemic cards shuffled into the player deck.
    pub extra_cards: u32,
    /// Cards consumed from the player deck per monitor action.
    pub monitor_draw: u32,
    /// Cap on the per-city risk-list length reported to hosts.
    pub max_tracked_infections: u32,
    /// Player cards per city starting in the set-aside box.
    #[serde(default)]
    pub player_setaside: BTreeMap<CityId, u32>,
    /// Infection cards per city starting in the set-aside box.
    #[serde(default)]
    pub infection_setaside: BTreeMap<CityId, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NoCities,
    NoInfectionRates,
    NoPlayers,
    MissingHandSize { players: u32 },
    MultipleWildcards,
    SetasideExceedsCards { city: String },
    HandsExceedDeck,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoCities => f.write_str("city table is empty"),
            ConfigError::NoInfectionRates => f.write_str("infection-rate table is empty"),
            ConfigError::NoPlayers => f.write_str("player count must be at least one"),
            ConfigError::MissingHandSize { players } => {
                write!(f, "no initial hand size configured for {players} players")
            }
            ConfigError::MultipleWildcards => {
                f.write_str("at most one city may carry the wildcard flag")
            }
            ConfigError::SetasideExceedsCards { city } => {
                write!(f, "{city} has more cards set aside than it contributes")
            }
            ConfigError::HandsExceedDeck => {
                f.write_str("initial hands exceed the post-setup player deck")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl GameConfig {
    /// Validates the static tables. Called once by the estimator before
    /// any computation; hosts embedding the core should call it at
    /// startup so defects surface before the first query.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cities.is_empty() {
            return Err(ConfigError::NoCities);
        }
        if self.infection_rates.is_empty() {
            return Err(ConfigError::NoInfectionRates);
        }
        if self.num_players == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if !self.initial_hand_sizes.contains_key(&self.num_players) {
            return Err(ConfigError::MissingHandSize {
                players: self.num_players,
            });
        }
        if self.cities.iter().filter(|city| city.wildcard).count() > 1 {
            return Err(ConfigError::MultipleWildcards);
        }
        for (id, city) in self.cities.iter().enumerate() {
            let id = CityId(id as u16);
            let player_aside = self.player_setaside.get(&id).copied().unwrap_or(0);
            let infection_aside = self.infection_setaside.get(&id).copied().unwrap_or(0);
            if player_aside > city.player_cards || infection_aside > city.infection_cards {
                return Err(ConfigError::SetasideExceedsCards {
                    city: city.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn city(&self, id: CityId) -> &City {
        &self.cities[id.index()]
    }

    pub fn city_ids(&self) -> impl Iterator<Item = CityId> + '_ {
        (0..self.cities.len()).map(|index| CityId(index as u16))
    }

    pub fn city_id_by_name(&self, name: &str) -> Option<CityId> {
        self.cities
            .iter()
            .position(|city| city.name == name)
            .map(|index| CityId(index as u16))
    }

    /// The wildcard city, when one is configured.
    pub fn wildcard(&self) -> Option<CityId> {
        self.cities
            .iter()
            .position(|city| city.wildcard)
            .map(|index| CityId(index as u16))
    }

    /// Infection rate for the given epidemic counter. −1 (the setup
    /// round) reads the table's last entry; counts past the end clamp to
    /// the last entry.
    pub fn infection_rate(&self, epidemics: i32) -> u32 {
        let last = *self.infection_rates.last().unwrap_or(&0);
        if epidemics < 0 {
            return last;
        }
        self.infection_rates
            .get(epidemics as usize)
            .copied()
            .unwrap_or(last)
    }

    /// Number of epidemic cards shuffled into a deck with `city_cards`
    /// city cards.
    pub fn epidemics_for(&self, city_cards: u32) -> u32 {
        self.epidemic_brackets
            .iter()
            .filter(|bracket| bracket.max_city_cards >= city_cards)
            .min_by_key(|bracket| bracket.max_city_cards)
            .map(|bracket| bracket.epidemics)
            .unwrap_or(self.fallback_epidemics)
    }

    pub fn initial_hand_size(&self) -> u32 {
        self.initial_hand_sizes
            .get(&self.num_players)
            .copied()
            .unwrap_or(0)
    }

    /// City cards actually shuffled into the player deck (total minus
    /// set-aside).
    pub fn city_cards_in_deck(&self) -> u32 {
        let total: u32 = self.cities.iter().map(|city| city.player_cards).sum();
        let aside: u32 = self.player_setaside.values().sum();
        total.saturating_sub(aside)
    }

    pub fn infection_deck_total(&self) -> u32 {
        self.cities.iter().map(|city| city.infection_cards).sum()
    }

    pub fn infection_setaside_for(&self, id: CityId) -> u32 {
        self.infection_setaside.get(&id).copied().unwrap_or(0)
    }

    /// The standard 48-city four-player configuration.
    pub fn standard() -> Self {
        let blue = [
            "Atlanta",
            "Chicago",
            "Essen",
            "London",
            "Madrid",
            "Milan",
            "Montreal",
            "New York",
            "Paris",
            "San Francisco",
            "St. Petersburg",
            "Washington",
        ];
        let yellow = [
            "Bogotá",
            "Buenos Aires",
            "Johannesburg",
            "Khartoum",
            "Kinshasa",
            "Lagos",
            "Lima",
            "Los Angeles",
            "Mexico City",
            "Miami",
            "Santiago",
            "São Paulo",
        ];
        let black = [
            "Algiers",
            "Baghdad",
            "Cairo",
            "Chennai",
            "Delhi",
            "Istanbul",
            "Karachi",
            "Kolkata",
            "Moscow",
            "Mumbai",
            "Riyadh",
            "Tehran",
        ];
        let red = [
            "Bangkok",
            "Beijing",
            "Ho Chi Minh City",
            "Hong Kong",
            "Jakarta",
            "Manila",
            "Osaka",
            "Seoul",
            "Shanghai",
            "Sydney",
            "Taipei",
            "Tokyo",
        ];

        let mut cities = Vec::with_capacity(48);
        for (names, color) in [
            (&blue, CityColor::Blue),
            (&yellow, CityColor::Yellow),
            (&black, CityColor::Black),
            (&red, CityColor::Red),
        ] {
            cities.extend(names.iter().map(|name| City::new(*name, color)));
        }

        Self {
            cities,
            infection_rates: vec![2, 2, 2, 3, 3, 4, 4, 9],
            epidemic_brackets: vec![
                EpidemicBracket {
                    max_city_cards: 48,
                    epidemics: 5,
                },
                EpidemicBracket {
                    max_city_cards: 60,
                    epidemics: 6,
                },
                EpidemicBracket {
                    max_city_cards: 72,
                    epidemics: 7,
                },
            ],
            fallback_epidemics: 8,
            num_players: 4,
            initial_hand_sizes: BTreeMap::from([(2, 4), (3, 3), (4, 2)]),
            draw_per_turn: 2,
            extra_cards: 0,
            monitor_draw: 3,
            max_tracked_infections: 3,
            player_setaside: BTreeMap::new(),
            infection_setaside: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GameConfig};
    use crate::model::city::CityId;

    #[test]
    fn standard_config_validates() {
        let config = GameConfig::standard();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.cities.len(), 48);
        assert_eq!(config.city_cards_in_deck(), 48);
        assert_eq!(config.infection_deck_total(), 48);
    }

    #[test]
    fn setup_round_reads_last_infection_rate() {
        let config = GameConfig::standard();
        assert_eq!(config.infection_rate(-1), 9);
        assert_eq!(config.infection_rate(0), 2);
        assert_eq!(config.infection_rate(3), 3);
        // counts past the table clamp instead of indexing out of range
        assert_eq!(config.infection_rate(50), 9);
    }

    #[test]
    fn epidemic_brackets_match_inclusively() {
        let config = GameConfig::standard();
        assert_eq!(config.epidemics_for(48), 5);
        assert_eq!(config.epidemics_for(49), 6);
        assert_eq!(config.epidemics_for(60), 6);
        assert_eq!(config.epidemics_for(99), 8);
    }

    #[test]
    fn missing_hand_size_is_fatal() {
        let mut config = GameConfig::standard();
        config.num_players = 5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingHandSize { players: 5 })
        );
    }

    #[test]
    fn second_wildcard_is_rejected() {
        let mut config = GameConfig::standard();
        config.cities[0].wildcard = true;
        config.cities[1].wildcard = true;
        assert_eq!(config.validate(), Err(ConfigError::MultipleWildcards));
    }

    #[test]
    fn oversized_setaside_is_rejected() {
        let mut config = GameConfig::standard();
        config.infection_setaside.insert(CityId(0), 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SetasideExceedsCards { .. })
        ));
    }

    #[test]
    fn setaside_reduces_player_deck() {
        let mut config = GameConfig::standard();
        config.player_setaside.insert(CityId(3), 1);
        assert_eq!(config.city_cards_in_deck(), 47);
    }
}
