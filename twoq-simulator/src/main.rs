use clap::{Parser, Subcommand};
use std::num::NonZeroU64;
use std::path::PathBuf;

use twoq_cache::config::{DEFAULT_PROBATIONARY_RATIO, DEFAULT_PROTECTED_RATIO};
use twoq_simulator::generator::{TrafficLogConfig, TrafficLogGenerator};
use twoq_simulator::models::{Policy, SimulationConfig};
use twoq_simulator::runner::SimulationRunner;
use twoq_simulator::stats::SimulationStats;

/// 2Q cache simulator CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay request logs against the 2Q cache and an LRU baseline
    Simulate {
        /// Directory containing log files
        #[arg(short, long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Total byte budget of the cache
        /// Example: 104857600 for 100MB
        #[arg(long, default_value = "104857600")]
        max_bytes: u64,

        /// Fraction of max-bytes given to the probationary segment
        #[arg(long, default_value_t = DEFAULT_PROBATIONARY_RATIO)]
        probationary_ratio: f64,

        /// Fraction of max-bytes given to the protected segment
        #[arg(long, default_value_t = DEFAULT_PROTECTED_RATIO)]
        protected_ratio: f64,

        /// Policies to simulate (2q, lru)
        /// If not provided, all policies will be used
        #[arg(short, long, value_name = "POLICIES", num_args = 1.., value_delimiter = ',')]
        policies: Option<Vec<String>>,

        /// Export results to CSV file
        #[arg(long, value_name = "PATH")]
        output_csv: Option<PathBuf>,
    },

    /// Generate synthetic hot-set plus scan traffic logs
    Generate {
        /// Total number of requests
        #[arg(long, default_value = "100000")]
        requests: u64,

        /// Number of keys in the hot working set
        #[arg(long, default_value = "1000")]
        hot_keys: u32,

        /// Percentage of traffic going to the hot set (default: 70%)
        #[arg(long, default_value = "70")]
        hot_traffic: u8,

        /// Minimum object size in bytes
        #[arg(long, default_value = "512")]
        min_size: u64,

        /// Maximum object size in bytes
        #[arg(long, default_value = "16384")]
        max_size: u64,

        /// Number of files to split the trace into
        #[arg(long, default_value = "1")]
        files: u32,

        /// Requests per simulated second
        #[arg(long, default_value = "100")]
        rps: u32,

        /// RNG seed for a reproducible trace
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "traces")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            requests,
            hot_keys,
            hot_traffic,
            min_size,
            max_size,
            files,
            rps,
            seed,
            output_dir,
        } => {
            let config = TrafficLogConfig {
                requests,
                hot_keys,
                hot_traffic_percent: hot_traffic,
                min_size,
                max_size,
                files,
                rps,
                seed,
                output_dir,
                ..TrafficLogConfig::default()
            };
            TrafficLogGenerator::new(config).generate()?;
            Ok(())
        }

        Commands::Simulate {
            input_dir,
            max_bytes,
            probationary_ratio,
            protected_ratio,
            policies,
            output_csv,
        } => {
            let max_bytes =
                NonZeroU64::new(max_bytes).ok_or("--max-bytes must be greater than zero")?;
            let config = SimulationConfig {
                input_dir,
                max_bytes,
                probationary_ratio,
                protected_ratio,
                policies: parse_policies(policies.as_deref()),
            };
            run_simulation(config, output_csv)
        }
    }
}

/// Parse policy names, falling back to every policy
fn parse_policies(names: Option<&[String]>) -> Vec<Policy> {
    let Some(names) = names.filter(|n| !n.is_empty()) else {
        return Policy::all();
    };

    let mut selected = Vec::new();
    for name in names {
        match Policy::parse(name) {
            Some(policy) if !selected.contains(&policy) => selected.push(policy),
            Some(_) => {}
            None => println!("Warning: Unknown policy '{name}', skipping"),
        }
    }
    if selected.is_empty() {
        println!("No valid policies selected, using all available policies");
        Policy::all()
    } else {
        selected
    }
}

/// Run the simulation with the given configuration
fn run_simulation(
    config: SimulationConfig,
    output_csv: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("2Q Cache Simulation");
    println!("===================");
    println!("Input directory: {}", config.input_dir.display());
    println!(
        "Max cache size: {} bytes ({:.2} MB)",
        config.max_bytes,
        config.max_bytes.get() as f64 / 1_048_576.0
    );
    println!(
        "Segment ratios: probationary {:.2}, protected {:.2}",
        config.probationary_ratio, config.protected_ratio
    );
    println!(
        "Policies: {:?}",
        config.policies.iter().map(Policy::as_str).collect::<Vec<_>>()
    );
    println!();

    let result = SimulationRunner::new(config).run().map_err(|e| {
        eprintln!("Error running simulation: {e}");
        e
    })?;

    println!("\nSimulation completed in {:.2?}", result.duration);
    println!("Total requests: {}", result.total_requests);
    println!("Unique objects: {}", result.unique_objects);
    println!(
        "Total bytes: {} ({:.2} MB)",
        result.total_bytes,
        result.total_bytes as f64 / (1024.0 * 1024.0)
    );

    let stats = SimulationStats::from_result(&result);
    stats.print_summary();

    if let Some(csv_path) = output_csv {
        match stats.export_csv(&csv_path) {
            Ok(()) => println!("\nResults exported to: {}", csv_path.display()),
            Err(e) => eprintln!("Failed to export CSV: {e}"),
        }
    }

    Ok(())
}
