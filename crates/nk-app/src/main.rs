use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nk_core::{InstrumentedLandscape, Landscape, LandscapeConfig, Topology};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "nk-landscape",
    version,
    about = "Build an NK fitness landscape and evaluate genotypes against it"
)]
struct Cli {
    /// JSON file holding a landscape configuration; flags below override its fields.
    #[arg(short, long, env = "NK_LANDSCAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Number of loci.
    #[arg(short = 'n', long)]
    n: Option<i64>,

    /// Number of other loci influencing each locus.
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    k: Option<i64>,

    /// Size of the allele alphabet.
    #[arg(short = 'a', long)]
    alleles: Option<i64>,

    /// Code of the first allele (48 lets genotypes be written as "0101").
    #[arg(long, allow_negative_numbers = true)]
    base_allele: Option<i64>,

    /// Influencer topology: random or ring.
    #[arg(short, long)]
    topology: Option<Topology>,

    /// Generator seed; negative seeds from the wall clock.
    #[arg(short, long, allow_negative_numbers = true)]
    seed: Option<i64>,

    /// Print each locus's influencers after building.
    #[arg(long)]
    show_epistasis: bool,

    /// Character-coded genotype to evaluate; may be repeated.
    #[arg(short, long = "genotype")]
    genotypes: Vec<String>,

    /// Number of uniformly random genotypes to evaluate.
    #[arg(long, default_value_t = 0)]
    samples: usize,

    /// Seed for drawing random genotypes.
    #[arg(long, default_value_t = 0x5EED)]
    sample_seed: u64,

    /// Count jump-table visits and print the usage table afterwards.
    #[arg(long)]
    stats: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn landscape_config(&self) -> Result<LandscapeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str::<LandscapeConfig>(&raw)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => LandscapeConfig::default(),
        };
        if let Some(n) = self.n {
            config.n = n;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(a) = self.alleles {
            config.a = a;
        }
        if let Some(base_allele) = self.base_allele {
            config.base_allele = base_allele;
        }
        if let Some(topology) = self.topology {
            config.topology = topology;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.show_epistasis |= self.show_epistasis;
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.landscape_config()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.print_config {
        serde_json::to_writer_pretty(&mut out, &config)?;
        writeln!(out)?;
        return Ok(());
    }

    let landscape =
        Landscape::build_with_report(&config, &mut out).context("failed to build landscape")?;
    info!(
        n = landscape.n(),
        k = landscape.k(),
        alleles = landscape.alleles(),
        slots = landscape.jump_table_size(),
        seed = landscape.seed(),
        "landscape ready"
    );

    let mut rng = SmallRng::seed_from_u64(cli.sample_seed);
    let mut genotypes: Vec<Vec<u8>> = cli
        .genotypes
        .iter()
        .map(|g| g.as_bytes().to_vec())
        .collect();
    genotypes.extend((0..cli.samples).map(|_| landscape.random_genotype(&mut rng)));
    if genotypes.is_empty() {
        warn!("no genotypes given; pass --genotype or --samples to evaluate fitness");
    }

    let mut evaluator = Evaluator::new(landscape, cli.stats);
    for genotype in &genotypes {
        let fitness = evaluator
            .fitness(genotype)
            .with_context(|| format!("failed to evaluate {}", String::from_utf8_lossy(genotype)))?;
        writeln!(out, "{} {fitness:.9}", render_genotype(genotype))?;
    }

    if let Evaluator::Instrumented(instrumented) = &evaluator {
        writeln!(out)?;
        instrumented.write_report(&mut out)?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

enum Evaluator {
    Plain(Landscape),
    Instrumented(InstrumentedLandscape),
}

impl Evaluator {
    fn new(landscape: Landscape, stats: bool) -> Self {
        if stats {
            Self::Instrumented(InstrumentedLandscape::new(landscape))
        } else {
            Self::Plain(landscape)
        }
    }

    fn fitness(&mut self, genotype: &[u8]) -> Result<f64, nk_core::LandscapeError> {
        match self {
            Self::Plain(landscape) => landscape.fitness(genotype),
            Self::Instrumented(instrumented) => instrumented.fitness(genotype),
        }
    }
}

/// Printable genotypes as text, anything else as space-separated codes.
fn render_genotype(genotype: &[u8]) -> String {
    if genotype.iter().all(u8::is_ascii_graphic) {
        String::from_utf8_lossy(genotype).into_owned()
    } else {
        genotype
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
