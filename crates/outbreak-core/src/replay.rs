//! Event replay: folds an ordered turn log into a [`StackModel`].
//!
//! The engine rebuilds the deck state from scratch on every query. Within
//! a turn the payloads are applied in the canonical order (monitor,
//! epidemic, exile, forecast, infection) no matter how the host recorded
//! them, because the downstream risk arithmetic assumes that sequencing.
//! Inconsistencies never abort a replay: the log takes precedence over
//! the model, so the engine records a warning and keeps going.

use crate::config::GameConfig;
use crate::model::city::CityId;
use crate::model::game::GameMeta;
use crate::model::stack::{CityCounts, DISCARD, SETASIDE_BOX, StackModel, StackWarning};
use crate::model::turn::TurnRecord;
use core::fmt;
use serde::Serialize;
use tracing::debug;

/// A [`StackWarning`] tagged with the turn that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayWarning {
    pub turn_num: i32,
    pub warning: StackWarning,
}

impl fmt::Display for ReplayWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn {}: {}", self.turn_num, self.warning)
    }
}

/// Best-effort reconstruction of the deck state plus the counters the
/// risk estimator consumes.
#[derive(Debug, Clone)]
pub struct Replay {
    pub stack: StackModel,
    /// Epidemic cards resolved so far; −1 while the game is still in
    /// setup (indexes the setup burst in the rate table).
    pub epidemics_seen: i32,
    /// Player cards drawn since setup, including monitor look-aheads.
    pub cards_drawn: u32,
    pub warnings: Vec<ReplayWarning>,
}

pub struct ReplayEngine<'a> {
    config: &'a GameConfig,
}

impl<'a> ReplayEngine<'a> {
    pub fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Deck state at true game start: every city's infection cards in the
    /// imminent group, less any set-aside cards, which wait in the box.
    /// Wildcard cards begin in the discard and only join the draw pile
    /// through an epidemic reshuffle.
    pub fn initial_stack(&self) -> StackModel {
        let mut stack = StackModel::new();
        for id in self.config.city_ids() {
            let city = self.config.city(id);
            if city.wildcard {
                stack.add(DISCARD, id, city.infection_cards);
            } else {
                let aside = self.config.infection_setaside_for(id);
                stack.add(1, id, city.infection_cards.saturating_sub(aside));
                stack.add(SETASIDE_BOX, id, aside);
            }
        }
        stack
    }

    pub fn replay(&self, meta: &GameMeta, draw_phase: bool, turns: &[TurnRecord]) -> Replay {
        let mut stack = self.initial_stack();
        let mut warnings: Vec<ReplayWarning> = Vec::new();

        let mut epidemics_seen: i32 = if meta.in_setup() { -1 } else { 0 };
        let mut cards_drawn: u32 = if meta.in_setup() {
            0
        } else {
            let completed = turns.len().saturating_sub(1 + usize::from(draw_phase));
            completed as u32 * self.config.draw_per_turn
        };

        for turn in turns {
            stack.clean();
            debug!(turn = turn.turn_num, "replaying turn");

            if turn.monitor > 0 {
                debug!(
                    monitor = turn.monitor,
                    skipped = turn.skipped_epidemics,
                    "monitor actions"
                );
                epidemics_seen += turn.skipped_epidemics as i32;
                cards_drawn += turn.monitor * self.config.monitor_draw;
            }

            for &city in &turn.epidemics {
                epidemics_seen += 1;
                debug!(city = city.index(), "epidemic");
                if let Some(warning) = stack.resolve_epidemic(city) {
                    warnings.push(ReplayWarning {
                        turn_num: turn.turn_num,
                        warning,
                    });
                }
                stack.clean();
                stack.shift_toward_draw();
            }

            for exile in &turn.exiles {
                debug!(
                    city = exile.city.index(),
                    count = exile.count,
                    target = exile.target_stratum,
                    "exile"
                );
                if let Some(warning) =
                    stack.apply_exile(exile.city, exile.count, exile.target_stratum)
                {
                    warnings.push(ReplayWarning {
                        turn_num: turn.turn_num,
                        warning,
                    });
                }
            }

            if !turn.forecasts.is_empty() {
                debug!(count = turn.forecasts.len(), "forecast");
                let pairs: Vec<(CityId, i32)> = turn
                    .forecasts
                    .iter()
                    .map(|forecast| (forecast.city, forecast.position))
                    .collect();
                for warning in stack.apply_forecast(&pairs) {
                    warnings.push(ReplayWarning {
                        turn_num: turn.turn_num,
                        warning,
                    });
                }
            }

            stack.clean();
            self.apply_infections(turn, &mut stack, &mut warnings);

            while stack.stratum_total(1) == 0 && stack.has_draw_cards() {
                stack.shift_toward_discard();
            }
        }

        stack.clean();
        Replay {
            stack,
            epidemics_seen,
            cards_drawn,
            warnings,
        }
    }

    fn apply_infections(
        &self,
        turn: &TurnRecord,
        stack: &mut StackModel,
        warnings: &mut Vec<ReplayWarning>,
    ) {
        let mut remaining: CityCounts = turn
            .infections
            .iter()
            .map(|infection| (infection.city, infection.count))
            .collect();

        while remaining.total() > 0 {
            while stack.stratum_total(1) == 0 {
                if !stack.has_draw_cards() {
                    warnings.push(ReplayWarning {
                        turn_num: turn.turn_num,
                        warning: StackWarning::DeckExhausted,
                    });
                    return;
                }
                stack.shift_toward_discard();
            }

            // infected cities present in the imminent group right now
            let possible: Vec<(CityId, u32)> = remaining
                .iter()
                .filter_map(|(city, wanted)| {
                    let take = wanted.min(stack.count(1, city));
                    (take > 0).then_some((city, take))
                })
                .collect();

            if possible.is_empty() {
                if let Some((city, _)) = remaining.iter().next() {
                    warnings.push(ReplayWarning {
                        turn_num: turn.turn_num,
                        warning: StackWarning::InfectedTooEarly { city },
                    });
                }
                return;
            }

            for (city, take) in possible {
                debug!(city = city.index(), count = take, "infected");
                for _ in 0..take {
                    if let Some(warning) = stack.draw_infection(city) {
                        warnings.push(ReplayWarning {
                            turn_num: turn.turn_num,
                            warning,
                        });
                    }
                }
                remaining.remove(city, take);
            }
        }
    }
}
