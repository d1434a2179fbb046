//! Risk estimation over the reconstructed deck state.
//!
//! Every query replays the full event log, then derives three families of
//! numbers from the resulting stack model:
//!
//! - the epidemic outlook for the next player-deck draws, from exact
//!   block-position arithmetic over the periodic epidemic placement;
//! - per-city infection odds for the coming infection step, hypergeometric
//!   over each stratum in drawing range;
//! - the wildcard outlook, negative-binomial over the ordinary-vs-wildcard
//!   composition of the strata in range.

use crate::config::{ConfigError, GameConfig};
use crate::model::city::{CityColor, CityId};
use crate::model::game::{GameMeta, TurnSource};
use crate::model::stack::{CityCounts, DISCARD, EXILE_BOX, StackModel};
use crate::replay::{ReplayEngine, ReplayWarning};
use crate::risk::combinatorics::{hypergeometric_pmf, negative_binomial_pmf};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Risk numbers for one city, ready for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct CityRisk {
    pub name: String,
    pub color: CityColor,
    /// Marginal probability per remaining copy of surfacing during the
    /// next infection step, assuming no epidemic interrupts it.
    pub inf_risk: Vec<f64>,
    /// Probability this city is revealed by the next epidemic.
    pub epi_risk: f64,
    /// Same as `inf_risk`, but for the scenario where the next player
    /// draw is an epidemic and the discard has been reshuffled on top.
    pub epi_inf_risk: Vec<f64>,
}

/// Full risk report for one game position.
#[derive(Debug, Clone, Serialize)]
pub struct StateReport {
    pub game_id: u64,
    pub turn_num: i32,
    pub funding_rate: u32,
    pub deck_size: i64,
    /// Expected epidemics among the next two player draws; in `[0, 2]`.
    pub epidemic_risk: f64,
    /// Upper bound on cards until the next epidemic must surface.
    pub epidemic_countdown: u32,
    pub epidemics_seen: i32,
    pub infection_rate: u32,
    pub cities: Vec<CityRisk>,
    /// Marginal probability that the j-th wildcard card surfaces during
    /// the next infection step. Empty when no wildcard is configured.
    pub wildcard_risk: Vec<f64>,
    pub epi_wildcard_risk: Vec<f64>,
    pub stack: StackModel,
    pub warnings: Vec<ReplayWarning>,
}

/// Replays the game's event log and computes the full risk report.
///
/// Pure with respect to its inputs: no ambient state, so independent
/// queries may run concurrently. Configuration defects surface here as
/// hard errors before any game-specific work.
pub fn compute_game_state(
    config: &GameConfig,
    meta: &GameMeta,
    source: &dyn TurnSource,
    draw_phase: bool,
) -> Result<StateReport, ConfigError> {
    config.validate()?;
    let turns = source.turns_up_to(meta);

    let city_cards = config.city_cards_in_deck();
    let epidemic_cards = config.epidemics_for(city_cards);
    let hands = config.num_players * config.initial_hand_size();
    let post_setup = (city_cards + epidemic_cards + meta.funding_rate + config.extra_cards) as i64
        - hands as i64;
    if post_setup <= 0 {
        return Err(ConfigError::HandsExceedDeck);
    }
    let post_setup = post_setup as u32;
    debug!(city_cards, epidemic_cards, post_setup, "deck composition");

    let replay = ReplayEngine::new(config).replay(meta, draw_phase, &turns);
    let deck_size = post_setup as i64 - replay.cards_drawn as i64;

    let (epidemic_risk, epidemic_countdown) = epidemic_position(
        post_setup,
        epidemic_cards,
        replay.cards_drawn,
        replay.epidemics_seen,
        meta.in_setup(),
    );

    let wildcard = config.wildcard();
    let epi_risk = epidemic_city_risks(&replay.stack);

    let rate = config.infection_rate(replay.epidemics_seen);
    let next_rate = config.infection_rate(replay.epidemics_seen + 1);
    // a risk above 1 means the no-epidemic scenario is impossible
    let p_no_epi = (1.0 - epidemic_risk).clamp(0.0, 1.0);
    let p_epi = epidemic_risk.clamp(0.0, 1.0);

    let inf = infection_risks(config, &replay.stack, rate, p_no_epi, wildcard);
    let epi_inf = epidemic_infection_risks(
        config,
        &replay.stack,
        next_rate,
        p_epi,
        &epi_risk,
        wildcard,
    );

    let (wildcard_risk, epi_wildcard_risk) = match wildcard {
        Some(id) => (
            wildcard_risks(config, &replay.stack, rate, p_no_epi, id, false),
            wildcard_risks(config, &replay.stack, next_rate, p_epi, id, true),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let cities = config
        .city_ids()
        .filter(|id| Some(*id) != wildcard)
        .map(|id| {
            let city = config.city(id);
            CityRisk {
                name: city.name.clone(),
                color: city.color,
                inf_risk: inf.get(&id).cloned().unwrap_or_default(),
                epi_risk: epi_risk.get(&id).copied().unwrap_or(0.0),
                epi_inf_risk: epi_inf.get(&id).cloned().unwrap_or_default(),
            }
        })
        .collect();

    Ok(StateReport {
        game_id: meta.id,
        turn_num: meta.turn_num,
        funding_rate: meta.funding_rate,
        deck_size,
        epidemic_risk,
        epidemic_countdown,
        epidemics_seen: replay.epidemics_seen,
        infection_rate: rate,
        cities,
        wildcard_risk,
        epi_wildcard_risk,
        stack: replay.stack,
        warnings: replay.warnings,
    })
}

/// Exact epidemic outlook from the periodic deck construction: the
/// player deck is built in one block per epidemic card, each holding
/// exactly one. Knowing the draw position inside the current block pins
/// the answer down in closed form.
fn epidemic_position(
    post_setup: u32,
    epidemic_cards: u32,
    cards_drawn: u32,
    epidemics_seen: i32,
    in_setup: bool,
) -> (f64, u32) {
    if epidemic_cards == 0 {
        return (0.0, 0);
    }
    let deck = post_setup as usize;
    let blocks = epidemic_cards as usize;
    if cards_drawn as usize + 1 >= deck {
        // nothing (or one card) left; no meaningful two-draw window
        return (0.0, 0);
    }

    let mut sizes = vec![0u32; blocks];
    for position in 0..deck {
        sizes[position % blocks] += 1;
    }
    let mut block_of = Vec::with_capacity(deck);
    for (block, &size) in sizes.iter().enumerate() {
        block_of.extend(std::iter::repeat(block).take(size as usize));
    }

    let i_block = block_of[cards_drawn as usize];
    let j_block = block_of[cards_drawn as usize + 1];

    let mut remaining = sizes;
    for position in 0..cards_drawn as usize {
        remaining[block_of[position]] -= 1;
    }

    if in_setup {
        return (0.0, remaining[0]);
    }

    if (i_block as i32) < epidemics_seen {
        let risk = if (j_block as i32) < epidemics_seen {
            debug_assert_eq!(i_block, j_block);
            // this block's epidemic has already been drawn
            0.0
        } else {
            debug_assert_eq!(remaining[i_block], 1);
            // only the second card could be one
            1.0 / remaining[j_block] as f64
        };
        let next = remaining.get(i_block + 1).copied().unwrap_or(0);
        (risk, remaining[i_block] + next)
    } else if i_block == j_block {
        // both draws land in a block whose epidemic is still out there
        (2.0 / remaining[i_block] as f64, remaining[i_block])
    } else {
        debug_assert_eq!(remaining[i_block], 1);
        // the first card is certainly the epidemic; the second might be
        // the next block's
        (1.0 + 1.0 / remaining[j_block] as f64, remaining[j_block])
    }
}

/// Uniform distribution over the epidemic source stratum.
fn epidemic_city_risks(stack: &StackModel) -> BTreeMap<CityId, f64> {
    let mut risks = BTreeMap::new();
    let Some(source) = stack.epidemic_source() else {
        return risks;
    };
    let Some(counts) = stack.stratum(source) else {
        return risks;
    };
    let total = counts.total();
    if total == 0 {
        return risks;
    }
    for (city, count) in counts.iter() {
        risks.insert(city, count as f64 / total as f64);
    }
    risks
}

/// Walks the draw strata from the imminent group outward, spending the
/// draw budget stratum by stratum, and appends one marginal per copy to
/// each city's list. Wildcard cards neither consume budget nor appear
/// here; they live in their own channel.
fn stratum_walk(
    stack: &StackModel,
    mut budget: i64,
    cond_p: f64,
    wildcard: Option<CityId>,
    risks: &mut BTreeMap<CityId, Vec<f64>>,
) {
    let Some(bottom) = stack.bottom_stratum() else {
        return;
    };
    for index in 1..=bottom {
        if budget <= 0 {
            break;
        }
        let Some(counts) = stack.stratum(index) else {
            continue;
        };
        let population: u32 = counts
            .iter()
            .filter(|(city, _)| Some(*city) != wildcard)
            .map(|(_, count)| count)
            .sum();
        if population == 0 {
            continue;
        }
        for (city, count) in counts.iter() {
            if Some(city) == wildcard {
                continue;
            }
            let entry = risks.entry(city).or_default();
            for copy in 1..=count {
                entry.push(cond_p * hypergeometric_pmf(copy, population, count, budget as u32));
            }
        }
        budget -= population as i64;
    }
}

fn infection_risks(
    config: &GameConfig,
    stack: &StackModel,
    rate: u32,
    cond_p: f64,
    wildcard: Option<CityId>,
) -> BTreeMap<CityId, Vec<f64>> {
    let mut risks = BTreeMap::new();
    stratum_walk(stack, rate as i64, cond_p, wildcard, &mut risks);

    // copies already exiled or discarded carry no forward risk but still
    // pad the list, so every remaining copy is accounted for in order
    for index in [EXILE_BOX, DISCARD] {
        if let Some(counts) = stack.stratum(index) {
            for (city, count) in counts.iter() {
                if Some(city) == wildcard {
                    continue;
                }
                let entry: &mut Vec<f64> = risks.entry(city).or_default();
                entry.extend(std::iter::repeat(0.0).take(count as usize));
            }
        }
    }
    trim_risks(config, risks, rate)
}

/// The epidemic scenario: the revealed card joins the discard and the
/// whole pile is reshuffled on top, so the imminent population is the
/// discard plus one, with this city holding one extra copy exactly when
/// it is the revealed card.
fn epidemic_infection_risks(
    config: &GameConfig,
    stack: &StackModel,
    next_rate: u32,
    p_epi: f64,
    epi_risk: &BTreeMap<CityId, f64>,
    wildcard: Option<CityId>,
) -> BTreeMap<CityId, Vec<f64>> {
    let mut risks: BTreeMap<CityId, Vec<f64>> = BTreeMap::new();

    let population: u32 = stack
        .stratum(DISCARD)
        .map(|counts| {
            counts
                .iter()
                .filter(|(city, _)| Some(*city) != wildcard)
                .map(|(_, count)| count)
                .sum()
        })
        .unwrap_or(0);

    if let Some(counts) = stack.stratum(DISCARD) {
        for (city, count) in counts.iter() {
            if Some(city) == wildcard {
                continue;
            }
            let weight = epi_risk.get(&city).copied().unwrap_or(0.0);
            let entry = risks.entry(city).or_default();
            for copy in 1..=count {
                let as_revealed = hypergeometric_pmf(copy, population + 1, count + 1, next_rate);
                let as_bystander = hypergeometric_pmf(copy, population + 1, count, next_rate);
                entry.push(p_epi * (weight * as_revealed + (1.0 - weight) * as_bystander));
            }
        }
    }

    // whatever budget the reshuffled discard leaves spills into the old
    // draw strata underneath
    stratum_walk(
        stack,
        next_rate as i64 - population as i64,
        p_epi,
        wildcard,
        &mut risks,
    );
    trim_risks(config, risks, next_rate)
}

/// Pads and truncates every city's list to the reporting length.
fn trim_risks(
    config: &GameConfig,
    mut risks: BTreeMap<CityId, Vec<f64>>,
    rate: u32,
) -> BTreeMap<CityId, Vec<f64>> {
    let len = rate.min(config.max_tracked_infections) as usize;
    let wildcard = config.wildcard();
    for id in config.city_ids() {
        if Some(id) == wildcard {
            continue;
        }
        risks.entry(id).or_default().resize(len, 0.0);
    }
    risks
}

/// Marginal probability that the j-th wildcard card surfaces while the
/// infection step draws its `rate` ordinary cards: negative-binomial
/// over the ordinary-vs-wildcard composition of the strata in range.
fn wildcard_risks(
    config: &GameConfig,
    stack: &StackModel,
    rate: u32,
    cond_p: f64,
    wildcard: CityId,
    after_epidemic: bool,
) -> Vec<f64> {
    if rate == 0 {
        return Vec::new();
    }

    let mut ordinary: u32 = 0;
    let mut wild: u32 = 0;
    let mut budget = rate as i64;

    let mut tally = |counts: &CityCounts| {
        let mut plain = 0u32;
        for (city, count) in counts.iter() {
            if city == wildcard {
                wild += count;
            } else {
                plain += count;
            }
        }
        ordinary += plain;
        plain
    };

    if after_epidemic {
        // the reshuffled discard is the first group in range
        if let Some(counts) = stack.stratum(DISCARD) {
            budget -= tally(counts) as i64;
        }
    }
    if let Some(bottom) = stack.bottom_stratum() {
        for index in 1..=bottom {
            if budget <= 0 {
                break;
            }
            if let Some(counts) = stack.stratum(index) {
                budget -= tally(counts) as i64;
            }
        }
    }

    if wild == 0 {
        return Vec::new();
    }

    let len = (rate.min(config.max_tracked_infections) as usize).min(wild as usize);
    let mut below = 0.0;
    let mut out = Vec::with_capacity(len);
    for j in 0..len as u32 {
        below += negative_binomial_pmf(j, rate, ordinary, wild);
        out.push(cond_p * (1.0 - below).clamp(0.0, 1.0));
    }
    out
}
