//! Exact probability mass functions over small integer parameters.
//!
//! Binomial coefficients are accumulated in integer arithmetic (each
//! intermediate step is itself a binomial coefficient, so the stepwise
//! division is exact) and only converted to `f64` at the end. Degenerate
//! parameters yield 0.0 rather than an error: an empty population
//! carries no probability mass, not a fault.

/// Binomial coefficient as `f64`; 0.0 outside `0 <= r <= n`.
pub fn n_choose_r(n: i64, r: i64) -> f64 {
    if n < 0 || r < 0 || r > n {
        return 0.0;
    }
    let r = r.min(n - r);
    let mut exact: u128 = 1;
    for i in 1..=r {
        let factor = (n - r + i) as u128;
        match exact.checked_mul(factor) {
            Some(product) => exact = product / i as u128,
            // parameters large enough to overflow u128 are far outside
            // exact-f64 territory anyway; finish multiplicatively
            None => {
                let mut approx = exact as f64;
                for j in i..=r {
                    approx *= (n - r + j) as f64 / j as f64;
                }
                return approx;
            }
        }
    }
    exact as f64
}

/// P(exactly `k` successes when drawing `draws` cards without
/// replacement from `population` cards of which `successes` qualify).
///
/// `draws` beyond the population clamp down to it: the model treats an
/// oversized infection rate as "draw the whole remaining pile".
pub fn hypergeometric_pmf(k: u32, population: u32, successes: u32, draws: u32) -> f64 {
    let draws = draws.min(population);
    let denominator = n_choose_r(population as i64, draws as i64);
    if denominator == 0.0 {
        return 0.0;
    }
    n_choose_r(successes as i64, k as i64)
        * n_choose_r(
            population as i64 - successes as i64,
            draws as i64 - k as i64,
        )
        / denominator
}

/// P(exactly `k` wildcard draws before the `r`-th ordinary draw), with
/// the per-draw ordinary probability fixed at
/// `successes / (successes + failures)`.
pub fn negative_binomial_pmf(k: u32, r: u32, successes: u32, failures: u32) -> f64 {
    let total = successes + failures;
    if total == 0 {
        return 0.0;
    }
    let p = successes as f64 / total as f64;
    if p == 1.0 {
        // no failures exist to be drawn
        return 1.0;
    }
    n_choose_r(k as i64 + r as i64 - 1, k as i64) * p.powi(r as i32) * (1.0 - p).powi(k as i32)
}

#[cfg(test)]
mod tests {
    use super::{hypergeometric_pmf, n_choose_r, negative_binomial_pmf};
    use statrs::distribution::{Discrete, Hypergeometric};

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn small_coefficients_are_exact() {
        assert_eq!(n_choose_r(0, 0), 1.0);
        assert_eq!(n_choose_r(5, 2), 10.0);
        assert_eq!(n_choose_r(48, 2), 1128.0);
        assert_eq!(n_choose_r(52, 5), 2_598_960.0);
    }

    #[test]
    fn out_of_range_coefficients_are_zero() {
        assert_eq!(n_choose_r(3, 5), 0.0);
        assert_eq!(n_choose_r(3, -1), 0.0);
        assert_eq!(n_choose_r(-1, 0), 0.0);
    }

    #[test]
    fn large_coefficients_stay_finite() {
        let value = n_choose_r(300, 150);
        assert!(value.is_finite());
        assert!(value > 1e88);
    }

    #[test]
    fn hypergeometric_sums_to_one() {
        for (population, successes, draws) in [(48, 3, 2), (10, 4, 9), (7, 7, 3), (5, 2, 8)] {
            let sum: f64 = (0..=successes.min(draws))
                .map(|k| hypergeometric_pmf(k, population, successes, draws))
                .sum();
            assert!(
                (sum - 1.0).abs() < TOLERANCE,
                "pmf over ({population},{successes},{draws}) sums to {sum}"
            );
        }
    }

    #[test]
    fn hypergeometric_matches_reference_implementation() {
        let reference = Hypergeometric::new(48, 3, 2).unwrap();
        for k in 0..=2u32 {
            let ours = hypergeometric_pmf(k, 48, 3, 2);
            let theirs = reference.pmf(k as u64);
            assert!((ours - theirs).abs() < TOLERANCE, "k={k}: {ours} vs {theirs}");
        }
    }

    #[test]
    fn oversized_draws_clamp_to_population() {
        // drawing 9 from a 3-card pile is drawing all 3
        assert_eq!(hypergeometric_pmf(1, 3, 1, 9), 1.0);
        assert_eq!(hypergeometric_pmf(0, 3, 1, 9), 0.0);
    }

    #[test]
    fn empty_population_is_silent_zero() {
        assert_eq!(hypergeometric_pmf(0, 0, 0, 2), 0.0);
    }

    #[test]
    fn two_of_three_scenario_matches_hand_computation() {
        // next 2 draws from {A, B, C}: each city surfaces with p = 2/3
        let p = hypergeometric_pmf(1, 3, 1, 2);
        assert!((p - 2.0 / 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn negative_binomial_degenerate_p_is_one() {
        assert_eq!(negative_binomial_pmf(0, 2, 5, 0), 1.0);
    }

    #[test]
    fn negative_binomial_zero_population_is_zero() {
        assert_eq!(negative_binomial_pmf(1, 2, 0, 0), 0.0);
    }

    #[test]
    fn negative_binomial_matches_closed_form() {
        // P(1 wildcard before the 2nd ordinary draw) with p = 3/4:
        // C(2,1) * (3/4)^2 * (1/4)
        let p = negative_binomial_pmf(1, 2, 3, 1);
        assert!((p - 2.0 * 0.5625 * 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn negative_binomial_mass_accumulates_toward_one() {
        let sum: f64 = (0..200).map(|k| negative_binomial_pmf(k, 3, 2, 2)).sum();
        assert!((sum - 1.0).abs() < 1e-6, "partial mass {sum}");
    }
}
