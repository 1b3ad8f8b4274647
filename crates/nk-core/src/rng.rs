//! Seedable subtractive lagged-Fibonacci generator.
//!
//! Every random decision a landscape makes flows through this generator, so two landscapes built
//! from the same seed are identical bit for bit. The recurrence is Knuth's subtractive method:
//! a 55-entry history mixed with four warm-up passes, two cursors 31 apart, and draws scaled by
//! `1 / MODULUS` into `[0, 1)`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::LandscapeError;

/// Modulus of the recurrence; seeds must be strictly below it.
pub const MODULUS: i64 = 1_000_000_000;

const SCALE: f64 = 1.0 / MODULUS as f64;
const HISTORY: usize = 55;
const WARM_UP_PASSES: usize = 4;
const CURSOR_GAP: usize = 31;

/// Deterministic `[0, 1)` source owned by one landscape construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    // Slot 0 is never read; slots 1..=55 hold the history.
    state: [i64; HISTORY + 1],
    inext: usize,
    inextp: usize,
    seed: u64,
}

impl Generator {
    /// Seed a new generator. Negative seeds are replaced by the current wall-clock second.
    pub fn new(seed: i64) -> Result<Self, LandscapeError> {
        let mut generator = Self {
            state: [0; HISTORY + 1],
            inext: 0,
            inextp: CURSOR_GAP,
            seed: 0,
        };
        generator.reseed(seed)?;
        Ok(generator)
    }

    /// Reinitialise the state in place, returning the seed actually used.
    pub fn reseed(&mut self, seed: i64) -> Result<u64, LandscapeError> {
        let seed = if seed < 0 { clock_seed()? } else { seed };
        if seed >= MODULUS {
            return Err(LandscapeError::SeedTooLarge { seed });
        }

        let mut mj = seed;
        let mut mk = 1_i64;
        self.state[HISTORY] = mj;
        for i in 1..HISTORY {
            let ii = (21 * i) % HISTORY;
            self.state[ii] = mk;
            mk = mj - mk;
            if mk < 0 {
                mk += MODULUS;
            }
            mj = self.state[ii];
        }

        for _ in 0..WARM_UP_PASSES {
            for i in 1..=HISTORY {
                self.state[i] -= self.state[1 + (i + 30) % HISTORY];
                if self.state[i] < 0 {
                    self.state[i] += MODULUS;
                }
            }
        }

        self.inext = 0;
        self.inextp = CURSOR_GAP;
        self.seed = seed as u64;
        Ok(self.seed)
    }

    /// Seed in use, after any wall-clock substitution.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Next uniformly distributed value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.inext = advance(self.inext);
        self.inextp = advance(self.inextp);

        let mut mj = self.state[self.inext] - self.state[self.inextp];
        if mj < 0 {
            mj += MODULUS;
        }
        self.state[self.inext] = mj;
        mj as f64 * SCALE
    }

    /// Uniform integer in `[0, n)`, computed as `floor(next_f64() * n)`.
    #[inline]
    pub fn uniform(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize
    }
}

#[inline]
const fn advance(cursor: usize) -> usize {
    if cursor == HISTORY { 1 } else { cursor + 1 }
}

fn clock_seed() -> Result<i64, LandscapeError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| LandscapeError::ClockUnavailable(err.to_string()))?;
    // Epoch seconds passed the modulus in 2001; fold them back into range.
    Ok((elapsed.as_secs() % MODULUS as u64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_one_matches_reference_sequence() {
        let mut rng = Generator::new(1).expect("generator");
        let draws: Vec<f64> = (0..5).map(|_| rng.next_f64()).collect();
        assert_eq!(
            draws,
            vec![
                0.849306556,
                0.37891870800000005,
                0.495791191,
                0.917173428,
                0.14970352
            ]
        );
    }

    #[test]
    fn warm_up_state_matches_reference() {
        let rng = Generator::new(1).expect("generator");
        assert_eq!(&rng.state[1..4], &[89320604, 577544758, 463496939]);
        assert_eq!(rng.inext, 0);
        assert_eq!(rng.inextp, 31);
    }

    #[test]
    fn zero_seed_is_valid() {
        let mut rng = Generator::new(0).expect("generator");
        assert_eq!(rng.seed(), 0);
        assert_eq!(rng.next_f64(), 0.613610054);
        assert_eq!(rng.next_f64(), 0.771029073);
    }

    #[test]
    fn identical_seeds_produce_identical_streams() {
        let mut a = Generator::new(424_242).expect("generator");
        let mut b = Generator::new(424_242).expect("generator");
        for _ in 0..1_000 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn reseed_restarts_the_stream() {
        let mut rng = Generator::new(42).expect("generator");
        let first: Vec<f64> = (0..3).map(|_| rng.next_f64()).collect();
        assert_eq!(first, vec![0.512863138, 0.302393743, 0.5871889020000001]);
        let used = rng.reseed(42).expect("reseed");
        assert_eq!(used, 42);
        let again: Vec<f64> = (0..3).map(|_| rng.next_f64()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn draws_stay_in_unit_interval() {
        let mut rng = Generator::new(987_654_321).expect("generator");
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value), "draw {value} out of range");
        }
    }

    #[test]
    fn uniform_respects_bound() {
        let mut rng = Generator::new(17).expect("generator");
        let mut seen = [false; 7];
        for _ in 0..2_000 {
            let value = rng.uniform(7);
            assert!(value < 7);
            seen[value] = true;
        }
        assert!(seen.iter().all(|&hit| hit), "every bucket should be drawn");
    }

    #[test]
    fn seed_at_modulus_is_rejected() {
        assert!(matches!(
            Generator::new(MODULUS),
            Err(LandscapeError::SeedTooLarge { seed }) if seed == MODULUS
        ));
        assert!(Generator::new(MODULUS - 1).is_ok());
    }

    #[test]
    fn negative_seed_uses_wall_clock() {
        let rng = Generator::new(-1).expect("clock seeded generator");
        assert!(rng.seed() < MODULUS as u64);
    }
}
