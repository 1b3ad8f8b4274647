//! Jump-table usage counters for checking how evenly evaluations spread over the table.
//!
//! Counting is kept out of [`Landscape`] so plain landscapes stay immutable and carry no
//! per-slot counters. Wrap a landscape in an [`InstrumentedLandscape`] to count visits.
//!
//! A visit is recorded for the slot the walk moves *to* and the allele that was just consumed,
//! not for the slot whose contribution was added. Existing hit tables depend on that pairing, so
//! it is kept as is. Fitness values are unaffected either way.

use std::io::{self, Write};

use tracing::debug;

use crate::{Landscape, LandscapeError};

/// Visit counts indexed by jump-table slot and allele.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitCounts {
    alleles: usize,
    counts: Vec<u64>,
}

impl HitCounts {
    fn new(slots: usize, alleles: usize) -> Self {
        Self {
            alleles,
            counts: vec![0; slots * alleles],
        }
    }

    #[inline]
    fn record(&mut self, slot: usize, allele: usize) {
        self.counts[slot * self.alleles + allele] += 1;
    }

    #[must_use]
    pub fn get(&self, slot: usize, allele: usize) -> Option<u64> {
        if allele >= self.alleles {
            return None;
        }
        self.counts.get(slot * self.alleles + allele).copied()
    }

    /// Counts for every allele of `slot`.
    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<&[u64]> {
        self.counts
            .get(slot * self.alleles..(slot + 1) * self.alleles)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn clear(&mut self) {
        self.counts.fill(0);
    }
}

/// A landscape that counts jump-table visits while evaluating fitness.
#[derive(Debug, Clone)]
pub struct InstrumentedLandscape {
    landscape: Landscape,
    hits: HitCounts,
}

impl InstrumentedLandscape {
    #[must_use]
    pub fn new(landscape: Landscape) -> Self {
        let hits = HitCounts::new(landscape.jump_table_size(), landscape.alleles());
        Self { landscape, hits }
    }

    /// Same value as [`Landscape::fitness`], recording every step of the walk.
    pub fn fitness(&mut self, genotype: &[u8]) -> Result<f64, LandscapeError> {
        let hits = &mut self.hits;
        self.landscape
            .evaluate(genotype, |slot, allele| hits.record(slot, allele))
    }

    /// Number of times the walk arrived at `slot` after consuming `allele`.
    #[must_use]
    pub fn hits(&self, slot: usize, allele: usize) -> Option<u64> {
        self.hits.get(slot, allele)
    }

    #[must_use]
    pub const fn counts(&self) -> &HitCounts {
        &self.hits
    }

    #[must_use]
    pub fn total_hits(&self) -> u64 {
        self.hits.total()
    }

    pub fn reset(&mut self) {
        debug!(total = self.hits.total(), "resetting jump table hit counts");
        self.hits.clear();
    }

    #[must_use]
    pub const fn landscape(&self) -> &Landscape {
        &self.landscape
    }

    #[must_use]
    pub fn into_inner(self) -> Landscape {
        self.landscape
    }

    /// Dump the jump table with hit counts, one line per slot:
    /// `Entry <slot> [<allele>, <destination>, <fitness>, <hits>] ...`.
    pub fn write_report<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let slots = self.landscape.jump_table_size();
        let width = digits(slots);
        let base = self.landscape.base_allele();

        writeln!(out, "Jump table statistics:")?;
        writeln!(out)?;
        writeln!(
            out,
            "One line per jump table entry, one [allele, destination, fitness, hits] group per allele."
        )?;
        writeln!(
            out,
            "Hits count arrivals at the entry; random genotypes should spread them evenly."
        )?;
        writeln!(out)?;

        for slot in 0..slots {
            let Some(entry) = self.landscape.entry(slot) else {
                break;
            };
            write!(out, "Entry {slot:>width$}")?;
            for (allele, (destination, fitness)) in entry
                .destinations()
                .iter()
                .zip(entry.fitnesses())
                .enumerate()
            {
                let hits = self.hits.get(slot, allele).unwrap_or(0);
                write!(
                    out,
                    " [{}, {destination:>width$}, {fitness:.6}, {hits:>3}]",
                    AlleleLabel(base as usize + allele)
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn digits(value: usize) -> usize {
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}

struct AlleleLabel(usize);

impl std::fmt::Display for AlleleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match u8::try_from(self.0) {
            Ok(byte) if byte.is_ascii_graphic() => write!(f, "{}", char::from(byte)),
            _ => write!(f, "{}", self.0),
        }
    }
}
