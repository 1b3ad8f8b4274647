//! NK fitness landscapes with tunable epistasis.
//!
//! A landscape over `n` loci, each holding one of `a` alleles, is built once from a
//! [`LandscapeConfig`] and then answers fitness queries for arbitrary genotypes. All randomness
//! comes from a seeded [`Generator`], so the same configuration and seed always produce the same
//! landscape and the same fitness values.
//!
//! ```
//! use nk_core::{Landscape, LandscapeConfig, Topology};
//!
//! let config = LandscapeConfig {
//!     n: 8,
//!     k: 2,
//!     a: 2,
//!     base_allele: i64::from(b'0'),
//!     topology: Topology::Ring,
//!     seed: 12345,
//!     ..LandscapeConfig::default()
//! };
//! let landscape = Landscape::build(&config)?;
//! let fitness = landscape.fitness(b"01100101")?;
//! assert!((0.0..1.0).contains(&fitness));
//! # Ok::<(), nk_core::LandscapeError>(())
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod landscape;
pub mod neighbors;
pub mod rng;
pub mod stats;

pub use landscape::{JumpEntry, Landscape};
pub use neighbors::{NeighborSelector, Topology};
pub use rng::{Generator, MODULUS};
pub use stats::{HitCounts, InstrumentedLandscape};

/// Destination slots per unit of epistasis; the jump table holds `max(n, k * JUMP_MULTIPLIER)`
/// slots so walks do not fall into short cycles.
pub const JUMP_MULTIPLIER: usize = 128;

/// Broad failure classes reported by [`LandscapeError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Parameters that cannot describe a landscape.
    Configuration,
    /// Storage for the landscape could not be reserved.
    Resource,
    /// The host environment (wall clock) misbehaved.
    Environment,
    /// A genotype did not fit the landscape it was evaluated against.
    Genotype,
    /// Writing a diagnostic report failed.
    Report,
}

/// Errors raised while building or querying a landscape.
#[derive(Debug, Error)]
pub enum LandscapeError {
    /// `n` is not positive or does not fit a `usize`.
    #[error("landscape needs at least one locus (n={n})")]
    LociOutOfRange { n: i64 },
    /// `k` is negative.
    #[error("epistasis must be non-negative (k={k})")]
    NegativeEpistasis { k: i64 },
    /// `k` is not below `n`.
    #[error("epistasis must be below the locus count (k={k}, n={n})")]
    EpistasisTooLarge { k: i64, n: i64 },
    /// Fewer than two alleles.
    #[error("allele alphabet needs at least two symbols (a={a})")]
    AlphabetTooSmall { a: i64 },
    /// `base_allele` is negative.
    #[error("base allele must be non-negative (base_allele={base_allele})")]
    NegativeBaseAllele { base_allele: i64 },
    /// The highest allele code does not fit in a `u8`.
    #[error("alleles {base_allele}..{base_allele}+{a} do not fit in a byte")]
    AlphabetOverflow { base_allele: i64, a: i64 },
    /// A topology name or legacy code that maps to no [`Topology`].
    #[error("unknown neighborhood topology `{0}`")]
    UnknownTopology(String),
    /// Explicit seed at or above [`MODULUS`].
    #[error("seed {seed} must be below 1000000000")]
    SeedTooLarge { seed: i64 },
    /// The jump table or influencer lists could not be reserved, or their size overflowed.
    #[error("could not reserve a jump table of {slots} slots x {alleles} alleles")]
    Allocation { slots: usize, alleles: usize },
    /// The wall clock reads before the Unix epoch.
    #[error("could not read the wall clock for seeding: {0}")]
    ClockUnavailable(String),
    /// Genotype length differs from `n`.
    #[error("genotype has {actual} loci, landscape expects {expected}")]
    GenotypeLength { expected: usize, actual: usize },
    /// A genotype value outside `base_allele..base_allele + a`.
    #[error("allele {value} at locus {locus} is outside {min}..={max}")]
    AlleleOutOfRange {
        locus: usize,
        value: u8,
        min: u8,
        max: u8,
    },
    /// Locus index at or above `n`.
    #[error("locus {locus} is outside a landscape of {n} loci")]
    LocusOutOfRange { locus: usize, n: usize },
    /// The epistasis or statistics sink returned an I/O error.
    #[error("failed to write landscape report: {0}")]
    Report(#[from] io::Error),
}

impl LandscapeError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::LociOutOfRange { .. }
            | Self::NegativeEpistasis { .. }
            | Self::EpistasisTooLarge { .. }
            | Self::AlphabetTooSmall { .. }
            | Self::NegativeBaseAllele { .. }
            | Self::AlphabetOverflow { .. }
            | Self::UnknownTopology(_)
            | Self::SeedTooLarge { .. } => ErrorKind::Configuration,
            Self::Allocation { .. } => ErrorKind::Resource,
            Self::ClockUnavailable(_) => ErrorKind::Environment,
            Self::GenotypeLength { .. }
            | Self::AlleleOutOfRange { .. }
            | Self::LocusOutOfRange { .. } => ErrorKind::Genotype,
            Self::Report(_) => ErrorKind::Report,
        }
    }
}

/// Parameters describing one landscape.
///
/// Counts are signed so configurations read from files or command lines can be rejected with a
/// precise error instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LandscapeConfig {
    /// Number of loci in each genotype.
    pub n: i64,
    /// Number of other loci influencing each locus.
    pub k: i64,
    /// Size of the allele alphabet.
    pub a: i64,
    /// Code of the first allele; genotypes use `base_allele..base_allele + a`.
    pub base_allele: i64,
    /// How influencers are chosen.
    pub topology: Topology,
    /// Generator seed; negative values seed from the wall clock.
    pub seed: i64,
    /// Write the influencer lists when building with a report sink.
    pub show_epistasis: bool,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            n: 16,
            k: 2,
            a: 2,
            base_allele: 0,
            topology: Topology::Random,
            seed: -1,
            show_epistasis: false,
        }
    }
}

/// Validated landscape dimensions derived from a [`LandscapeConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Loci per genotype.
    pub n: usize,
    /// Influencers per locus.
    pub k: usize,
    /// Alleles per locus.
    pub a: usize,
    /// Code of allele zero.
    pub base_allele: u8,
    /// Slots in the jump table, `max(n, k * JUMP_MULTIPLIER)`.
    pub jump_table_size: usize,
}

impl LandscapeConfig {
    /// Check the parameters, returning the derived dimensions.
    pub fn validate(&self) -> Result<Dimensions, LandscapeError> {
        let Self {
            n,
            k,
            a,
            base_allele,
            seed,
            ..
        } = *self;
        if n <= 0 {
            return Err(LandscapeError::LociOutOfRange { n });
        }
        if k < 0 {
            return Err(LandscapeError::NegativeEpistasis { k });
        }
        if k >= n {
            return Err(LandscapeError::EpistasisTooLarge { k, n });
        }
        if a < 2 {
            return Err(LandscapeError::AlphabetTooSmall { a });
        }
        if base_allele < 0 {
            return Err(LandscapeError::NegativeBaseAllele { base_allele });
        }
        if base_allele.saturating_add(a) - 1 > i64::from(u8::MAX) {
            return Err(LandscapeError::AlphabetOverflow { base_allele, a });
        }
        if seed >= MODULUS {
            return Err(LandscapeError::SeedTooLarge { seed });
        }

        let n = usize::try_from(n).map_err(|_| LandscapeError::LociOutOfRange { n })?;
        let k = k as usize;
        let jump_table_size = k
            .checked_mul(JUMP_MULTIPLIER)
            .ok_or(LandscapeError::Allocation {
                slots: usize::MAX,
                alleles: a as usize,
            })?
            .max(n);
        Ok(Dimensions {
            n,
            k,
            a: a as usize,
            base_allele: base_allele as u8,
            jump_table_size,
        })
    }
}
