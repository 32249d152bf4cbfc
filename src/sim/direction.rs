//! Run-length biased steering for the corridor
//!
//! Instead of rolling a new direction every row, the bias holds one
//! direction for a sampled number of rows, giving long sweeping turns and
//! straights.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{RUN_LENGTH_MAX, RUN_LENGTH_MIN};

/// Lateral heading of the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Straight,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Left, Direction::Straight, Direction::Right];

    /// -1, 0 or 1
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Straight => 0.0,
            Direction::Right => 1.0,
        }
    }
}

/// Direction plus the countdown until it is re-rolled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionBias {
    direction: Direction,
    steps_since_change: u32,
    next_change_at: u32,
    /// Inclusive bounds for `next_change_at`
    run_length: (u32, u32),
}

impl DirectionBias {
    /// Start heading straight with a freshly sampled run
    ///
    /// `run_length` must satisfy `1 <= min <= max`; settings validation
    /// guarantees this.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, run_length: (u32, u32)) -> Self {
        let mut bias = Self {
            direction: Direction::Straight,
            steps_since_change: 0,
            next_change_at: run_length.0,
            run_length,
        };
        bias.next_change_at = bias.sample_run(rng);
        bias
    }

    pub fn with_default_runs<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng, (RUN_LENGTH_MIN, RUN_LENGTH_MAX))
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn steps_since_change(&self) -> u32 {
        self.steps_since_change
    }

    #[inline]
    pub fn next_change_at(&self) -> u32 {
        self.next_change_at
    }

    /// Count one generated row; re-roll when the run is used up.
    ///
    /// Returns true if a new direction was drawn this call.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.steps_since_change += 1;
        if self.steps_since_change < self.next_change_at {
            return false;
        }

        self.direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        self.next_change_at = self.sample_run(rng);
        self.steps_since_change = 0;
        log::trace!(
            "Direction now {:?} for {} rows",
            self.direction,
            self.next_change_at
        );
        true
    }

    fn sample_run<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let (min, max) = self.run_length;
        rng.random_range(min.max(1)..=max.max(min.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_direction_constant_between_rerolls() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut bias = DirectionBias::with_default_runs(&mut rng);
        let mut current = bias.direction();

        for _ in 0..500 {
            let countdown_elapsed = bias.steps_since_change() + 1 == bias.next_change_at();
            let rerolled = bias.advance(&mut rng);
            assert_eq!(rerolled, countdown_elapsed);
            if !rerolled {
                assert_eq!(bias.direction(), current);
            }
            current = bias.direction();
        }
    }

    #[test]
    fn test_run_lengths_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut bias = DirectionBias::new(&mut rng, (5, 16));
        for _ in 0..1000 {
            assert!((5..=16).contains(&bias.next_change_at()));
            assert!(bias.steps_since_change() < bias.next_change_at());
            bias.advance(&mut rng);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let run = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut bias = DirectionBias::with_default_runs(&mut rng);
            (0..200)
                .map(|_| {
                    bias.advance(&mut rng);
                    bias.direction()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(1234), run(1234));
    }

    #[test]
    fn test_fixed_run_length_rerolls_on_schedule() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut bias = DirectionBias::new(&mut rng, (4, 4));
        let rerolls: Vec<bool> = (0..8).map(|_| bias.advance(&mut rng)).collect();
        assert_eq!(rerolls, vec![false, false, false, true, false, false, false, true]);
    }
}
