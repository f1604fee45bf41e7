use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use signal_grid::config::{ConfigOverrides, RunConfig};
use signal_grid::data::loader::{load_points, write_points_csv};
use signal_grid::data::sample::{generate_sample_points, SampleConfig};
use signal_grid::export::{export_cell_table, export_json, records_for, AggregateStore};
use signal_grid::{GridAggregationEngine, Result};

#[derive(Parser)]
#[command(name = "signal-grid", version, about = "Bin geotagged signal samples into hexagon or square cells")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write synthesized signal samples to a CSV file
    Sample {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1000)]
        count: usize,
        #[arg(long, allow_hyphen_values = true)]
        center_lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        center_lon: Option<f64>,
        #[arg(long)]
        radius_km: Option<f64>,
        /// Share of points placed near the center (0-1)
        #[arg(long)]
        concentration: Option<f64>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Aggregate points onto a grid and write the cell table, grid JSON and aggregate rows
    Aggregate {
        /// Point file (.csv or .json)
        #[arg(short, long)]
        data: PathBuf,
        /// JSON run configuration; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Flatten a flight record JSON into a point CSV
    ParseFlight {
        #[arg(short, long)]
        input: PathBuf,
        /// Defaults to the input path with a .csv extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Sample {
            output,
            count,
            center_lat,
            center_lon,
            radius_km,
            concentration,
            seed,
        } => {
            let defaults = SampleConfig::default();
            let config = SampleConfig {
                center_lat: center_lat.unwrap_or(defaults.center_lat),
                center_lon: center_lon.unwrap_or(defaults.center_lon),
                count,
                radius_km: radius_km.unwrap_or(defaults.radius_km),
                concentration: concentration.unwrap_or(defaults.concentration),
                seed,
                ..defaults
            };
            let points = generate_sample_points(&config);
            write_points_csv(&output, &points)
        }
        Command::Aggregate {
            data,
            config,
            overrides,
        } => {
            let mut run_config = match &config {
                Some(path) => RunConfig::load(path)?,
                None => RunConfig::default(),
            };
            run_config.apply(&overrides);
            run_aggregate(&data, &run_config)
        }
        Command::ParseFlight { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("csv"));
            let points = load_points(&input)?;
            write_points_csv(&output, &points)
        }
    }
}

fn run_aggregate(data: &Path, config: &RunConfig) -> Result<()> {
    let points = load_points(data)?;
    let spec = config.grid_spec(&points)?;
    let fields = config.tracked_fields(&points);
    tracing::info!("Tracking fields: {}", fields.join(", "));

    let engine = GridAggregationEngine::new(spec)?;
    let result = if config.shards > 1 {
        engine.aggregate_sharded(&points, &fields, config.shards)?
    } else {
        engine.aggregate(&points, &fields)?
    };

    std::fs::create_dir_all(&config.output_dir)?;
    let shape = spec.shape.label();
    export_cell_table(&config.output_dir.join(format!("{shape}_grid_data.csv")), &result)?;
    export_json(&config.output_dir.join(format!("{shape}_grid_data.json")), &result)?;

    let records = match config.aggregate_field(&fields) {
        Some(field) => records_for(&result, &config.device_id, &field),
        None => Vec::new(),
    };
    AggregateStore::persist(&config.output_dir.join(format!("{shape}_aggregates.csv")), records)?;

    tracing::info!("{}", result.summary.report());
    for field in &result.fields {
        if let Some(dist) = result.mean_distribution(field) {
            tracing::info!("{}", dist.report(&format!("{field} cell means")));
        }
    }
    Ok(())
}
