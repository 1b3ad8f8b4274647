//! Landscape construction and the fitness walk.
//!
//! The jump table is the heart of the model. Each slot holds, per allele, a fitness contribution
//! and a destination slot. Evaluating a locus starts at the slot with the locus's own index and
//! takes `k + 1` steps: each step reads the next allele of the locus's neighborhood (its own
//! allele, then its influencers' alleles), adds that slot's contribution, and jumps to the
//! destination. The fractional part of the sum is the locus's contribution, and the landscape's
//! fitness is the mean over all loci.

use std::io::{self, Write};
use std::iter;

use rand::Rng;
use tracing::debug;

use crate::neighbors::{NeighborSelector, Topology};
use crate::rng::Generator;
use crate::{Dimensions, LandscapeConfig, LandscapeError};

/// Read-only view of one jump-table slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpEntry<'a> {
    destinations: &'a [usize],
    fitness: &'a [f64],
}

impl JumpEntry<'_> {
    /// Slot the walk moves to after consuming `allele` here.
    #[must_use]
    pub fn destination(&self, allele: usize) -> Option<usize> {
        self.destinations.get(allele).copied()
    }

    /// Contribution added to the running sum when `allele` is consumed here.
    #[must_use]
    pub fn fitness(&self, allele: usize) -> Option<f64> {
        self.fitness.get(allele).copied()
    }

    #[must_use]
    pub const fn destinations(&self) -> &[usize] {
        self.destinations
    }

    #[must_use]
    pub const fn fitnesses(&self) -> &[f64] {
        self.fitness
    }
}

/// An immutable NK landscape.
///
/// Queries borrow the landscape immutably and keep their neighborhood on the stack, so one
/// landscape can serve any number of threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Landscape {
    dims: Dimensions,
    topology: Topology,
    seed: u64,
    // Both indexed by `slot * a + allele`.
    destinations: Vec<usize>,
    fitness: Vec<f64>,
    // `k` entries per locus, empty when `k == 0`.
    influencers: Vec<usize>,
}

impl Landscape {
    /// Build a landscape, discarding any epistasis report.
    pub fn build(config: &LandscapeConfig) -> Result<Self, LandscapeError> {
        Self::build_with_report(config, &mut io::sink())
    }

    /// Build a landscape, writing the influencer lists to `report` when
    /// [`LandscapeConfig::show_epistasis`] is set.
    pub fn build_with_report<W: Write + ?Sized>(
        config: &LandscapeConfig,
        report: &mut W,
    ) -> Result<Self, LandscapeError> {
        let dims = config.validate()?;
        let Dimensions {
            n,
            k,
            a,
            jump_table_size,
            ..
        } = dims;

        let too_large = || LandscapeError::Allocation {
            slots: jump_table_size,
            alleles: a,
        };
        let cells = jump_table_size.checked_mul(a).ok_or_else(too_large)?;
        let links = n.checked_mul(k).ok_or_else(too_large)?;
        let mut destinations = reserve(cells, jump_table_size, a)?;
        let mut fitness = reserve(cells, jump_table_size, a)?;
        let mut influencers = reserve(links, jump_table_size, a)?;

        let mut rng = Generator::new(config.seed)?;

        // Destinations for a slot are drawn before its fitness values.
        for _ in 0..jump_table_size {
            for _ in 0..a {
                destinations.push(rng.uniform(jump_table_size));
            }
            for _ in 0..a {
                fitness.push(rng.next_f64());
            }
        }

        if k > 0 {
            let mut selector = NeighborSelector::new(n);
            for locus in 0..n {
                selector.select(locus, k, config.topology, &mut rng, &mut influencers)?;
            }
        }

        let landscape = Self {
            dims,
            topology: config.topology,
            seed: rng.seed(),
            destinations,
            fitness,
            influencers,
        };
        debug!(
            n,
            k,
            a,
            slots = jump_table_size,
            seed = landscape.seed,
            topology = %landscape.topology,
            "built NK landscape"
        );

        if config.show_epistasis {
            landscape.write_epistasis_report(report)?;
        }
        Ok(landscape)
    }

    #[must_use]
    pub const fn n(&self) -> usize {
        self.dims.n
    }

    #[must_use]
    pub const fn k(&self) -> usize {
        self.dims.k
    }

    #[must_use]
    pub const fn alleles(&self) -> usize {
        self.dims.a
    }

    #[must_use]
    pub const fn base_allele(&self) -> u8 {
        self.dims.base_allele
    }

    #[must_use]
    pub const fn jump_table_size(&self) -> usize {
        self.dims.jump_table_size
    }

    #[must_use]
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Seed the generator actually used, including wall-clock substitutions.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn entry(&self, slot: usize) -> Option<JumpEntry<'_>> {
        if slot >= self.dims.jump_table_size {
            return None;
        }
        let range = slot * self.dims.a..(slot + 1) * self.dims.a;
        Some(JumpEntry {
            destinations: &self.destinations[range.clone()],
            fitness: &self.fitness[range],
        })
    }

    /// Influencers of `locus` in stored order; empty when `k == 0` or the locus is out of range.
    #[must_use]
    pub fn influencers(&self, locus: usize) -> &[usize] {
        let k = self.dims.k;
        self.influencers
            .get(locus * k..(locus + 1) * k)
            .unwrap_or(&[])
    }

    /// Mean locus contribution of `genotype`, in `[0, 1)`.
    pub fn fitness(&self, genotype: &[u8]) -> Result<f64, LandscapeError> {
        self.evaluate(genotype, |_, _| {})
    }

    /// Contribution of a single locus, in `[0, 1)`.
    pub fn locus_fitness(&self, locus: usize, genotype: &[u8]) -> Result<f64, LandscapeError> {
        if locus >= self.dims.n {
            return Err(LandscapeError::LocusOutOfRange {
                locus,
                n: self.dims.n,
            });
        }
        self.check_genotype(genotype)?;
        Ok(self.walk_locus(locus, genotype, &mut |_, _| {}))
    }

    /// Draw a genotype uniformly from the allele alphabet.
    pub fn random_genotype<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u8> {
        let base = usize::from(self.dims.base_allele);
        (0..self.dims.n)
            .map(|_| (base + rng.random_range(0..self.dims.a)) as u8)
            .collect()
    }

    /// Write each locus's influencer list in human-readable form.
    pub fn write_epistasis_report<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        if self.dims.k == 0 {
            return writeln!(out, "There are no epistatic interactions (k = 0).");
        }
        writeln!(out, "The landscape's epistatic interactions are as follows:")?;
        for locus in 0..self.dims.n {
            write!(out, "Locus {locus}: ")?;
            for influencer in self.influencers(locus) {
                write!(out, "{influencer} ")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Validate `genotype`, then walk every locus, reporting each `(destination slot, allele)`
    /// pair to `visit` right after the walk moves there.
    pub(crate) fn evaluate<F>(&self, genotype: &[u8], mut visit: F) -> Result<f64, LandscapeError>
    where
        F: FnMut(usize, usize),
    {
        self.check_genotype(genotype)?;
        let mut total = 0.0;
        for locus in 0..self.dims.n {
            total += self.walk_locus(locus, genotype, &mut visit);
        }
        Ok(total / self.dims.n as f64)
    }

    #[inline]
    fn walk_locus<F>(&self, locus: usize, genotype: &[u8], visit: &mut F) -> f64
    where
        F: FnMut(usize, usize),
    {
        let a = self.dims.a;
        let base = self.dims.base_allele;
        let neighborhood = iter::once(genotype[locus]).chain(
            self.influencers(locus)
                .iter()
                .map(|&influencer| genotype[influencer]),
        );

        let mut slot = locus;
        let mut sum = 0.0;
        for value in neighborhood {
            let allele = usize::from(value - base);
            let cell = slot * a + allele;
            sum += self.fitness[cell];
            slot = self.destinations[cell];
            visit(slot, allele);
        }
        sum - sum.floor()
    }

    fn check_genotype(&self, genotype: &[u8]) -> Result<(), LandscapeError> {
        if genotype.len() != self.dims.n {
            return Err(LandscapeError::GenotypeLength {
                expected: self.dims.n,
                actual: genotype.len(),
            });
        }
        let min = self.dims.base_allele;
        let max = (usize::from(min) + self.dims.a - 1) as u8;
        match genotype
            .iter()
            .position(|value| !(min..=max).contains(value))
        {
            Some(locus) => Err(LandscapeError::AlleleOutOfRange {
                locus,
                value: genotype[locus],
                min,
                max,
            }),
            None => Ok(()),
        }
    }
}

fn reserve<T>(len: usize, slots: usize, alleles: usize) -> Result<Vec<T>, LandscapeError> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(len)
        .map_err(|_| LandscapeError::Allocation { slots, alleles })?;
    Ok(storage)
}
