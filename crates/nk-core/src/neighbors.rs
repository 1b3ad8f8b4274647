//! Influencer selection: which K loci shape each locus's fitness contribution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::LandscapeError;
use crate::rng::Generator;

/// Neighborhood policy used to pick each locus's influencers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// K distinct loci drawn uniformly at random.
    #[default]
    Random,
    /// The nearest K loci on a ring, split between left and right.
    Ring,
}

impl Topology {
    /// Map the legacy numeric codes (0 random, 1 ring).
    pub fn from_code(code: i64) -> Result<Self, LandscapeError> {
        match code {
            0 => Ok(Self::Random),
            1 => Ok(Self::Ring),
            other => Err(LandscapeError::UnknownTopology(other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Ring => "ring",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topology {
    type Err = LandscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "ring" | "nearest" | "nextdoor" => Ok(Self::Ring),
            _ => Err(LandscapeError::UnknownTopology(s.to_string())),
        }
    }
}

/// Picks influencer sets for the loci of one landscape.
///
/// Holds the "already picked" markers used by random selection so they are allocated once per
/// landscape rather than once per locus.
#[derive(Debug, Clone)]
pub struct NeighborSelector {
    n: usize,
    picked: Vec<bool>,
}

impl NeighborSelector {
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            n,
            picked: vec![false; n],
        }
    }

    /// Append the `k` influencers of `locus` to `out`, in selection order.
    ///
    /// When `k == n - 1` every other locus is returned in increasing order and the generator is
    /// left untouched. Fails without drawing when `locus` or `k` does not fit the selector's `n`.
    pub fn select(
        &mut self,
        locus: usize,
        k: usize,
        topology: Topology,
        rng: &mut Generator,
        out: &mut Vec<usize>,
    ) -> Result<(), LandscapeError> {
        let n = self.n;
        if locus >= n {
            return Err(LandscapeError::LocusOutOfRange { locus, n });
        }
        if k >= n {
            return Err(LandscapeError::EpistasisTooLarge {
                k: i64::try_from(k).unwrap_or(i64::MAX),
                n: i64::try_from(n).unwrap_or(i64::MAX),
            });
        }
        let start = out.len();

        if k + 1 == n {
            out.extend((0..n).filter(|&other| other != locus));
            return Ok(());
        }

        match topology {
            Topology::Random => self.select_random(locus, k, rng, out),
            Topology::Ring => select_ring(locus, n, k, rng, out),
        }
        trace!(locus, influencers = ?&out[start..], "selected influencers");
        Ok(())
    }

    fn select_random(&mut self, locus: usize, k: usize, rng: &mut Generator, out: &mut Vec<usize>) {
        self.picked.fill(false);
        let mut count = 0;
        while count < k {
            let candidate = rng.uniform(self.n);
            if candidate != locus && !self.picked[candidate] {
                self.picked[candidate] = true;
                out.push(candidate);
                count += 1;
            }
        }
    }
}

fn select_ring(locus: usize, n: usize, k: usize, rng: &mut Generator, out: &mut Vec<usize>) {
    let mut left = k / 2;
    let mut right = k / 2;
    if k % 2 == 1 {
        if rng.uniform(2) == 0 {
            right += 1;
        } else {
            left += 1;
        }
    }

    if locus >= left {
        out.extend(locus - left..locus);
    } else {
        out.extend(0..locus);
        out.extend(n - (left - locus)..n);
    }

    if locus + right < n {
        out.extend(locus + 1..=locus + right);
    } else {
        out.extend(locus + 1..n);
        out.extend(0..=locus + right - n);
    }
}
