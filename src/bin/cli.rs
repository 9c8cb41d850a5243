//! tracerefine CLI - Debug tool for trajectory post-processing
//!
//! Usage:
//!   tracerefine-cli combine <csv>... [--output <file>]
//!   tracerefine-cli densify <csv> [--threshold <deg>] [--granularity <n>] [--merge]
//!   tracerefine-cli refine <csv> --network <graph.json> [--delete-off-road] [--tolerance <deg>]
//!   tracerefine-cli process <csv>... [--output <file>]
//!
//! Tables are CSV with `lat`, `lon` and (where needed) `Time` columns.
//! Results go to `--output` or stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use tracerefine::{
    densify_curves, merge_by_time, sequence_trajectories, InMemoryRoadNetwork, PipelineConfig,
    Result, Table, TrajectoryRefiner,
};

#[derive(Parser)]
#[command(name = "tracerefine-cli")]
#[command(about = "Debug tool for GPS trajectory post-processing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (flags override its values)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct CurveArgs {
    /// Bearing change in degrees above which a point is a curve
    #[arg(long)]
    threshold: Option<f64>,

    /// Points generated per densified segment, endpoints included
    #[arg(long)]
    granularity: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge partial trajectories into one nearest-neighbour ordered trajectory
    Combine {
        /// Input CSV files, in priority order (the first row of the first file starts the path)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect curves and densify the path around them
    Densify {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        curves: CurveArgs,

        /// Fold densified points back into the input instead of replacing it
        #[arg(long)]
        merge: bool,
    },

    /// Interpolate corners at road transitions of a map-matched trajectory
    Refine {
        /// Map-matched input CSV file
        input: PathBuf,

        /// Road graph JSON file
        #[arg(short, long)]
        network: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop points farther than the tolerance from their nearest road
        #[arg(long)]
        delete_off_road: bool,

        /// Off-road tolerance in degrees
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Combine, then densify curves (everything before map matching)
    Process {
        /// Input CSV files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        curves: CurveArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Combine { inputs, output } => {
            let combined = combine(&inputs)?;
            write_table(&combined, output.as_deref())
        }
        Commands::Densify {
            input,
            output,
            curves,
            merge,
        } => {
            apply_curve_args(&mut config, &curves);
            config.validate()?;

            let points = Table::from_path(&input)?.to_trajectory(&config.table)?;
            let densified = densify_curves(&points, &config.curves)?;
            let result = if merge {
                merge_by_time(&points, &densified)
            } else {
                densified
            };
            info!("[Densify] {} -> {} points", points.len(), result.len());
            let table = Table::from_trajectory(&result, &config.table);
            write_table(&table, output.as_deref())
        }
        Commands::Refine {
            input,
            network,
            output,
            delete_off_road,
            tolerance,
        } => {
            if delete_off_road {
                config.refine.delete_off_road_points = true;
            }
            if let Some(t) = tolerance {
                config.refine.tolerance = t;
            }
            config.validate()?;

            let matched = Table::from_path(&input)?.to_trajectory(&config.table)?;
            let adapter = InMemoryRoadNetwork::load(&network)?;
            let refiner = TrajectoryRefiner::new(config.refine.clone());
            let refined = refiner.refine(&adapter, &matched)?;
            info!("[Refine] {} -> {} points", matched.len(), refined.len());
            let table = Table::from_trajectory(&refined, &config.table);
            write_table(&table, output.as_deref())
        }
        Commands::Process {
            inputs,
            output,
            curves,
        } => {
            apply_curve_args(&mut config, &curves);
            config.validate()?;

            let combined = combine(&inputs)?.to_trajectory(&config.table)?;
            let densified = densify_curves(&combined, &config.curves)?;
            let result = merge_by_time(&combined, &densified);
            info!("[Process] {} -> {} points", combined.len(), result.len());
            let table = Table::from_trajectory(&result, &config.table);
            write_table(&table, output.as_deref())
        }
    }
}

fn apply_curve_args(config: &mut PipelineConfig, args: &CurveArgs) {
    if let Some(t) = args.threshold {
        config.curves.threshold = t;
    }
    if let Some(g) = args.granularity {
        config.curves.granularity = g;
    }
}

/// Load every input table and sequence the rows into one table.
fn combine(inputs: &[PathBuf]) -> Result<Table> {
    let tables = inputs
        .iter()
        .map(|path| {
            let table = Table::from_path(path)?;
            info!("  [OK] {} - {} rows", path.display(), table.len());
            Ok(table)
        })
        .collect::<Result<Vec<_>>>()?;

    let concatenated = Table::concat(&tables);
    let ordered = sequence_trajectories(&[concatenated.rows().to_vec()])?;
    Ok(concatenated.with_rows(ordered))
}

fn write_table(table: &Table, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            table.write_path(path)?;
            info!("Written: {} ({} rows)", path.display(), table.len());
            Ok(())
        }
        None => table.write(io::stdout().lock()),
    }
}
