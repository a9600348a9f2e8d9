//! powerplex entry point: CLI wiring, config loading and output export.

mod cli;

use std::process;

use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use powerplex::config::PipelineConfig;
use powerplex::io::{ExportTargets, export_outputs};
use powerplex::pipeline::rebuild_from_config;
use powerplex::report::RunSummary;

use crate::cli::{CliOptions, parse_args, print_usage};

/// Loads the base configuration and applies command-line overrides.
fn resolve_config(cli: &CliOptions) -> Result<PipelineConfig, String> {
    let mut cfg = if let Some(ref path) = cli.config {
        PipelineConfig::from_toml_file(path).map_err(|e| e.to_string())?
    } else if let Some(ref name) = cli.preset {
        PipelineConfig::from_preset(name).map_err(|e| e.to_string())?
    } else {
        PipelineConfig::baseline()
    };

    if let Some(ref history) = cli.history {
        cfg.source.history = Some(history.clone());
    }
    if let Some(horizon) = cli.horizon {
        cfg.forecast.horizon = horizon;
    }
    if let Some(step) = cli.step_deg {
        cfg.grid.step_deg = step;
    }
    if let Some(g) = cli.demand_growth {
        cfg.adequacy.demand_growth = g;
    }
    if let Some(m) = cli.reserve_margin {
        cfg.adequacy.reserve_margin = m;
    }
    if let Some(seed) = cli.seed {
        cfg.heat.seed = seed;
    }
    Ok(cfg)
}

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };
    if cli.help {
        print_usage();
        process::exit(0);
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level.unwrap_or(Level::INFO))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install log subscriber: {e}");
    }

    let cfg = match resolve_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    info!("rebuilding with {cfg}");

    // Nothing is written unless the whole run succeeds.
    let output = match rebuild_from_config(&cfg) {
        Ok(output) => output,
        Err(e) => {
            error!("rebuild failed: {e}");
            process::exit(1);
        }
    };

    for r in &output.adequacy {
        println!(
            "{}: generation={:.2} peak_demand={:.2} adequacy_index={:+.3}",
            r.year, r.total_generation, r.peak_demand, r.adequacy_index
        );
    }
    println!("\n{}", RunSummary::from_output(&output));

    let targets = ExportTargets {
        frames_csv: cli.frames_out.as_deref(),
        heat_csv: cli.heat_out.as_deref(),
        geojson_dir: cli.geojson_dir.as_deref(),
    };
    if let Err(e) = export_outputs(&output, targets) {
        error!("export failed, previous outputs left in place: {e}");
        process::exit(1);
    }
    if let Some(path) = targets.frames_csv {
        info!("frames written to {}", path.display());
    }
    if let Some(path) = targets.heat_csv {
        info!("heat samples written to {}", path.display());
    }
    if let Some(dir) = targets.geojson_dir {
        info!("GeoJSON layers written to {}", dir.display());
    }
}
