use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityColor {
    Blue = 0,
    Yellow = 1,
    Black = 2,
    Red = 3,
}

impl CityColor {
    pub const ALL: [CityColor; 4] = [
        CityColor::Blue,
        CityColor::Yellow,
        CityColor::Black,
        CityColor::Red,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CityColor::Blue => "blue",
            CityColor::Yellow => "yellow",
            CityColor::Black => "black",
            CityColor::Red => "red",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "blue" => Some(CityColor::Blue),
            "yellow" => Some(CityColor::Yellow),
            "black" => Some(CityColor::Black),
            "red" => Some(CityColor::Red),
            _ => None,
        }
    }
}

impl fmt::Display for CityColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index into the configured city table. Cities are immutable reference
/// data, so the id alone is enough to key every multiset in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub u16);

impl CityId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "city#{}", self.0)
    }
}

/// Static per-city reference data loaded once from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub color: CityColor,
    /// Cards this city contributes to the player deck.
    pub player_cards: u32,
    /// Cards this city contributes to the infection deck.
    pub infection_cards: u32,
    /// Wildcard cities start in the discard pile and are scored through
    /// the negative-binomial channel instead of the per-city one.
    #[serde(default)]
    pub wildcard: bool,
}

impl City {
    pub fn new(name: impl Into<String>, color: CityColor) -> Self {
        Self {
            name: name.into(),
            color,
            player_cards: 1,
            infection_cards: 1,
            wildcard: false,
        }
    }

    pub fn with_cards(mut self, player_cards: u32, infection_cards: u32) -> Self {
        self.player_cards = player_cards;
        self.infection_cards = infection_cards;
        self
    }

    pub fn as_wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{City, CityColor, CityId};

    #[test]
    fn color_round_trips_through_str() {
        for color in CityColor::ALL {
            assert_eq!(CityColor::from_str(color.as_str()), Some(color));
        }
        assert_eq!(CityColor::from_str("mauve"), None);
    }

    #[test]
    fn city_builder_sets_card_counts() {
        let city = City::new("Atlanta", CityColor::Blue).with_cards(2, 3);
        assert_eq!(city.player_cards, 2);
        assert_eq!(city.infection_cards, 3);
        assert!(!city.wildcard);
    }

    #[test]
    fn wildcard_flag_is_opt_in() {
        let city = City::new("Hollow Men", CityColor::Yellow).as_wildcard();
        assert!(city.wildcard);
    }

    #[test]
    fn city_id_displays_index() {
        assert_eq!(CityId(7).to_string(), "city#7");
    }
}
