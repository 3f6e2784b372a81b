use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod corpus;
mod workloads;

use corpus::Corpus;
use workloads::Workload;

#[derive(Parser)]
#[command(name = "zerobridge-bench")]
#[command(about = "Compares copy-translation and zero-copy sort throughput across the runtime boundary")]
#[command(version)]
struct Cli {
    /// Number of times each workload runs
    #[arg(short = 'n', long, default_value_t = 10_000)]
    iterations: usize,

    /// Number of random strings to sort
    #[arg(long, default_value_t = 100)]
    strings: usize,

    /// Length of each random string
    #[arg(long, default_value_t = 100)]
    string_length: usize,

    /// Seed for the string generator (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Workloads to run (can be specified multiple times; all if omitted)
    #[arg(short, long, value_enum)]
    workload: Vec<Workload>,

    /// Skip loading native libraries before running
    #[arg(long)]
    no_load: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if !cli.no_load {
        let loaded = zerobridge_loader::load_at_startup(&[])?;
        log::info!("loaded {loaded} native libraries");
    }

    let seed = cli.seed.unwrap_or_else(|| fastrand::u64(..));
    let corpus = Corpus::generate(cli.strings, cli.string_length, seed);
    log::info!(
        "sorting {} strings of length {} (seed {seed}), {} iterations",
        corpus.len(),
        cli.string_length,
        cli.iterations
    );

    let workloads = if cli.workload.is_empty() {
        Workload::ALL.to_vec()
    } else {
        cli.workload
    };
    for workload in workloads {
        log::info!("Running {} test ...", workload.title());
        let elapsed = workload.run(&corpus, cli.iterations)?;
        log::info!("... done in {elapsed:?}.");
    }
    Ok(())
}
