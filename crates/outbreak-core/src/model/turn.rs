use crate::model::city::CityId;
use serde::{Deserialize, Serialize};

/// Cards of one city moved out of the discard/draw cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExileRecord {
    pub city: CityId,
    pub count: u32,
    pub target_stratum: i32,
}

/// One forecast reordering: `city` pinned at draw `position` (1..=8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub city: CityId,
    pub position: i32,
}

/// Recorded infection draws for one city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityInfection {
    pub city: CityId,
    pub count: u32,
}

/// One round of the event log. Turn −1 is the pre-game setup round.
///
/// The payloads are stored in whatever order the host recorded them; the
/// replay engine applies them in the canonical order (monitor, epidemic,
/// exile, forecast, infection) regardless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn_num: i32,
    #[serde(default)]
    pub epidemics: Vec<CityId>,
    #[serde(default)]
    pub exiles: Vec<ExileRecord>,
    #[serde(default)]
    pub forecasts: Vec<ForecastRecord>,
    #[serde(default)]
    pub infections: Vec<CityInfection>,
    /// Number of monitor (look-ahead) actions taken this turn.
    #[serde(default)]
    pub monitor: u32,
    /// Epidemics pre-emptively discarded by those monitor actions.
    #[serde(default)]
    pub skipped_epidemics: u32,
}

impl TurnRecord {
    pub fn new(turn_num: i32) -> Self {
        Self {
            turn_num,
            ..Self::default()
        }
    }

    pub const fn is_setup(&self) -> bool {
        self.turn_num == -1
    }

    pub fn infected(mut self, city: CityId, count: u32) -> Self {
        self.infections.push(CityInfection { city, count });
        self
    }

    pub fn with_epidemic(mut self, city: CityId) -> Self {
        self.epidemics.push(city);
        self
    }

    pub fn with_exile(mut self, city: CityId, count: u32, target_stratum: i32) -> Self {
        self.exiles.push(ExileRecord {
            city,
            count,
            target_stratum,
        });
        self
    }

    pub fn with_forecast(mut self, city: CityId, position: i32) -> Self {
        self.forecasts.push(ForecastRecord { city, position });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::TurnRecord;
    use crate::model::city::CityId;

    #[test]
    fn setup_turn_is_minus_one() {
        assert!(TurnRecord::new(-1).is_setup());
        assert!(!TurnRecord::new(0).is_setup());
    }

    #[test]
    fn builders_accumulate_payloads() {
        let turn = TurnRecord::new(3)
            .with_epidemic(CityId(0))
            .infected(CityId(1), 2)
            .with_exile(CityId(1), 1, -1)
            .with_forecast(CityId(2), 4);
        assert_eq!(turn.epidemics.len(), 1);
        assert_eq!(turn.infections[0].count, 2);
        assert_eq!(turn.exiles[0].target_stratum, -1);
        assert_eq!(turn.forecasts[0].position, 4);
    }

    #[test]
    fn serializes_without_empty_payload_noise() {
        let turn = TurnRecord::new(0).infected(CityId(0), 1);
        let json = serde_json::to_string(&turn).unwrap();
        let back: TurnRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
