//! Concrete draw sampling consistent with a stack model.
//!
//! The estimator is entirely closed-form; this sampler exists so hosts
//! (and our own tests) can cross-check those numbers empirically by
//! drawing many infection steps from the same partial knowledge.

use crate::model::city::CityId;
use crate::model::stack::StackModel;
use rand::Rng;

/// Samples infection-step outcomes: cards come off the imminent group
/// uniformly at random, and deeper groups move forward as groups empty.
#[derive(Debug, Default)]
pub struct DrawSampler;

impl DrawSampler {
    /// Draws up to `count` cards from a copy of `stack`, returning the
    /// cities in draw order. Stops early if the draw pile runs dry.
    pub fn sample_draws<R: Rng + ?Sized>(
        stack: &StackModel,
        count: u32,
        rng: &mut R,
    ) -> Vec<CityId> {
        let mut stack = stack.clone();
        let mut drawn = Vec::with_capacity(count as usize);

        for _ in 0..count {
            while stack.stratum_total(1) == 0 {
                if !stack.has_draw_cards() {
                    return drawn;
                }
                stack.shift_toward_discard();
            }
            let Some(city) = Self::pick_uniform(&stack, rng) else {
                return drawn;
            };
            stack.draw_infection(city);
            drawn.push(city);
        }
        drawn
    }

    fn pick_uniform<R: Rng + ?Sized>(stack: &StackModel, rng: &mut R) -> Option<CityId> {
        let counts = stack.stratum(1)?;
        let total = counts.total();
        if total == 0 {
            return None;
        }
        let mut pick = rng.gen_range(0..total);
        for (city, count) in counts.iter() {
            if pick < count {
                return Some(city);
            }
            pick -= count;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::DrawSampler;
    use crate::model::city::CityId;
    use crate::model::stack::StackModel;
    use crate::risk::combinatorics::hypergeometric_pmf;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const A: CityId = CityId(0);
    const B: CityId = CityId(1);
    const C: CityId = CityId(2);

    #[test]
    fn sampling_stops_when_the_pile_is_dry() {
        let mut stack = StackModel::new();
        stack.add(1, A, 1);
        let mut rng = SmallRng::seed_from_u64(1);
        let drawn = DrawSampler::sample_draws(&stack, 5, &mut rng);
        assert_eq!(drawn, vec![A]);
    }

    #[test]
    fn deeper_groups_come_forward_in_order() {
        let mut stack = StackModel::new();
        stack.add(1, A, 1);
        stack.add(2, B, 1);
        stack.add(3, C, 1);
        let mut rng = SmallRng::seed_from_u64(2);
        let drawn = DrawSampler::sample_draws(&stack, 3, &mut rng);
        assert_eq!(drawn, vec![A, B, C]);
    }

    #[test]
    fn empirical_frequency_matches_the_closed_form() {
        let mut stack = StackModel::new();
        stack.add(1, A, 1);
        stack.add(1, B, 1);
        stack.add(1, C, 1);

        let trials = 20_000;
        let mut rng = SmallRng::seed_from_u64(1729);
        let mut hits = 0u32;
        for _ in 0..trials {
            let drawn = DrawSampler::sample_draws(&stack, 2, &mut rng);
            if drawn.contains(&A) {
                hits += 1;
            }
        }

        let expected = hypergeometric_pmf(1, 3, 1, 2);
        let observed = hits as f64 / trials as f64;
        // 2/3 with ~0.003 standard error; 0.02 is a generous band
        assert!(
            (observed - expected).abs() < 0.02,
            "observed {observed}, expected {expected}"
        );
    }
}
