//! The deck as an ordered collection of strata.
//!
//! A stratum groups cards known to sit at the same depth of the infection
//! deck relative to other strata, with no ordering inside the group. The
//! stratum index is the only ordering the engine ever learns, so every
//! mutation here preserves the total card count: cards move between
//! strata, they are never created or destroyed.

use crate::model::city::CityId;
use core::fmt;
use serde::Serialize;
use std::collections::BTreeMap;

/// Face-up discard pile.
pub const DISCARD: i32 = 0;
/// Cards removed from the draw/discard cycle by a resilient-population
/// style effect.
pub const EXILE_BOX: i32 = -1;
/// Cards set aside in the box at game start. While it holds cards,
/// epidemics resolve from here instead of the deck bottom.
pub const SETASIDE_BOX: i32 = -6;
/// Forecast reorderings occupy strata `1..=FORECAST_OFFSET`; pre-existing
/// draw strata are renumbered upward past this offset.
pub const FORECAST_OFFSET: i32 = 8;

/// Multiset of city cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CityCounts {
    counts: BTreeMap<CityId, u32>,
}

impl CityCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, city: CityId) -> u32 {
        self.counts.get(&city).copied().unwrap_or(0)
    }

    pub fn add(&mut self, city: CityId, count: u32) {
        if count > 0 {
            *self.counts.entry(city).or_insert(0) += count;
        }
    }

    /// Removes up to `count` cards of `city`, returning how many were
    /// actually removed.
    pub fn remove(&mut self, city: CityId, count: u32) -> u32 {
        let Some(held) = self.counts.get_mut(&city) else {
            return 0;
        };
        let removed = count.min(*held);
        *held -= removed;
        if *held == 0 {
            self.counts.remove(&city);
        }
        removed
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &CityCounts) {
        for (&city, &count) in &other.counts {
            self.add(city, count);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CityId, u32)> + '_ {
        self.counts.iter().map(|(&city, &count)| (city, count))
    }

    fn drop_zeroes(&mut self) {
        self.counts.retain(|_, count| *count > 0);
    }
}

impl FromIterator<(CityId, u32)> for CityCounts {
    fn from_iter<T: IntoIterator<Item = (CityId, u32)>>(iter: T) -> Self {
        let mut counts = CityCounts::new();
        for (city, count) in iter {
            counts.add(city, count);
        }
        counts
    }
}

/// A recoverable inconsistency between the event log and the model.
///
/// The log is manually entered and takes precedence over the model, so
/// these surface to the caller as advisories and never abort a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StackWarning {
    /// The recorded epidemic city is absent from the epidemic source
    /// stratum.
    ImpossibleEpidemic { city: CityId, stratum: i32 },
    /// An exile removed fewer cards than the log requested.
    ExileShortfall {
        city: CityId,
        requested: u32,
        removed: u32,
    },
    /// A forecasted city is nowhere in the draw pile.
    ForecastMissing { city: CityId },
    /// A recorded infection cannot be satisfied from the imminent-draw
    /// group.
    InfectedTooEarly { city: CityId },
    /// The draw pile ran out of cards while infections remained.
    DeckExhausted,
}

impl fmt::Display for StackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackWarning::ImpossibleEpidemic { city, stratum } => write!(
                f,
                "epidemic on {city} is not possible from stratum {stratum}, check records"
            ),
            StackWarning::ExileShortfall {
                city,
                requested,
                removed,
            } => write!(
                f,
                "could only exile {removed} of {requested} {city} cards, check records"
            ),
            StackWarning::ForecastMissing { city } => {
                write!(f, "forecasted {city} is not in the draw pile, check records")
            }
            StackWarning::InfectedTooEarly { city } => {
                write!(f, "{city} was infected too early, check records")
            }
            StackWarning::DeckExhausted => {
                f.write_str("draw pile exhausted with infections still recorded")
            }
        }
    }
}

/// Sparse map from stratum index to the cards known to sit there.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackModel {
    strata: BTreeMap<i32, CityCounts>,
}

impl StackModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stratum(&self, index: i32) -> Option<&CityCounts> {
        self.strata.get(&index)
    }

    pub fn count(&self, index: i32, city: CityId) -> u32 {
        self.stratum(index).map_or(0, |counts| counts.count(city))
    }

    pub fn stratum_total(&self, index: i32) -> u32 {
        self.stratum(index).map_or(0, CityCounts::total)
    }

    pub fn add(&mut self, index: i32, city: CityId, count: u32) {
        if count > 0 {
            self.strata.entry(index).or_default().add(city, count);
        }
    }

    pub fn total_cards(&self) -> u32 {
        self.strata.values().map(CityCounts::total).sum()
    }

    pub fn city_total(&self, city: CityId) -> u32 {
        self.strata.values().map(|counts| counts.count(city)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &CityCounts)> {
        self.strata.iter().map(|(&index, counts)| (index, counts))
    }

    /// Deepest stratum of the draw pile, if any positive stratum holds
    /// cards.
    pub fn bottom_stratum(&self) -> Option<i32> {
        self.strata
            .range(1..)
            .filter(|(_, counts)| !counts.is_empty())
            .map(|(&index, _)| index)
            .next_back()
    }

    /// Stratum the next epidemic card is revealed from: the set-aside box
    /// while it holds cards, otherwise the bottom of the mapping.
    pub fn epidemic_source(&self) -> Option<i32> {
        if self.stratum_total(SETASIDE_BOX) > 0 {
            return Some(SETASIDE_BOX);
        }
        self.strata
            .iter()
            .filter(|(_, counts)| !counts.is_empty())
            .map(|(&index, _)| index)
            .next_back()
    }

    pub fn has_draw_cards(&self) -> bool {
        self.strata
            .range(1..)
            .any(|(_, counts)| !counts.is_empty())
    }

    /// Removes zero-count cities and zero-total strata. Idempotent.
    pub fn clean(&mut self) {
        for counts in self.strata.values_mut() {
            counts.drop_zeroes();
        }
        self.strata.retain(|_, counts| !counts.is_empty());
    }

    /// Renumbers every stratum `i >= 0` to `i + 1`. Models the epidemic
    /// reshuffle: the discard pile becomes the new imminent draw group
    /// and every known group below it sinks one position.
    pub fn shift_toward_draw(&mut self) {
        let old = std::mem::take(&mut self.strata);
        for (index, counts) in old {
            let target = if index >= 0 { index + 1 } else { index };
            self.strata.insert(target, counts);
        }
    }

    /// Renumbers every stratum `i > 0` to `i - 1`, merging into any
    /// existing occupant. Callers only invoke this while the imminent
    /// group is empty, so nothing real ever merges into the discard.
    pub fn shift_toward_discard(&mut self) {
        let old = std::mem::take(&mut self.strata);
        for (index, counts) in old {
            let target = if index > 0 { index - 1 } else { index };
            self.strata.entry(target).or_default().merge(&counts);
        }
    }

    /// Moves one card of `city` from the epidemic source stratum to the
    /// discard. A missing card leaves the model untouched.
    pub fn resolve_epidemic(&mut self, city: CityId) -> Option<StackWarning> {
        let source = self.epidemic_source().unwrap_or(DISCARD);
        if self.count(source, city) < 1 {
            return Some(StackWarning::ImpossibleEpidemic {
                city,
                stratum: source,
            });
        }
        if let Some(counts) = self.strata.get_mut(&source) {
            counts.remove(city, 1);
        }
        self.add(DISCARD, city, 1);
        None
    }

    /// Removes up to `count` cards of `city`, scanning from the discard
    /// upward through the draw pile, and places what was removed at
    /// `target`. Only removed cards move, so the total is conserved even
    /// when the log asks for more than the model holds.
    pub fn apply_exile(&mut self, city: CityId, count: u32, target: i32) -> Option<StackWarning> {
        let mut removed = 0;
        let indices: Vec<i32> = self.strata.range(0..).map(|(&index, _)| index).collect();
        for index in indices {
            if removed == count {
                break;
            }
            if let Some(counts) = self.strata.get_mut(&index) {
                removed += counts.remove(city, count - removed);
            }
        }
        self.add(target, city, removed);
        if removed < count {
            Some(StackWarning::ExileShortfall {
                city,
                requested: count,
                removed,
            })
        } else {
            None
        }
    }

    /// Applies up to eight `(city, position)` reorderings to the top of
    /// the draw pile. Each card is pulled from the first stratum holding
    /// one (most imminent outward) and pinned at its forecast position;
    /// the prior draw strata are renumbered past `FORECAST_OFFSET` so the
    /// forecasted ordering becomes canonical.
    pub fn apply_forecast(&mut self, reorderings: &[(CityId, i32)]) -> Vec<StackWarning> {
        let mut warnings = Vec::new();
        let old = std::mem::take(&mut self.strata);
        let mut drawn: BTreeMap<i32, CityCounts> = BTreeMap::new();
        for (index, counts) in old {
            if index < 1 {
                self.strata.insert(index, counts);
            } else {
                drawn.insert(index, counts);
            }
        }

        for &(city, position) in reorderings {
            let found = drawn
                .iter()
                .find(|(_, counts)| counts.count(city) > 0)
                .map(|(&index, _)| index);
            match found {
                Some(index) => {
                    if let Some(counts) = drawn.get_mut(&index) {
                        counts.remove(city, 1);
                    }
                    self.add(position, city, 1);
                }
                None => warnings.push(StackWarning::ForecastMissing { city }),
            }
        }

        for (index, counts) in drawn {
            self.strata
                .entry(index + FORECAST_OFFSET)
                .or_default()
                .merge(&counts);
        }
        self.clean();
        warnings
    }

    /// Moves one card of `city` from the imminent-draw group to the
    /// discard.
    pub fn draw_infection(&mut self, city: CityId) -> Option<StackWarning> {
        if self.count(1, city) < 1 {
            return Some(StackWarning::InfectedTooEarly { city });
        }
        if let Some(counts) = self.strata.get_mut(&1) {
            counts.remove(city, 1);
        }
        self.add(DISCARD, city, 1);
        None
    }
}
