//! Probabilistic risk estimation.
//!
//! This module is composed of:
//! - `combinatorics`: exact pmf building blocks.
//! - `estimator`: the closed-form risk report over a replayed game.
//! - `sampler`: empirical cross-checking of the closed forms.

pub mod combinatorics;
pub mod estimator;
pub mod sampler;

pub use combinatorics::{hypergeometric_pmf, n_choose_r, negative_binomial_pmf};
pub use estimator::{CityRisk, StateReport, compute_game_state};
pub use sampler::DrawSampler;
