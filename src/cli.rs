use std::env;
use std::path::PathBuf;

use tracing::Level;

/// Parsed command-line options.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub history: Option<PathBuf>,
    pub horizon: Option<usize>,
    pub step_deg: Option<f64>,
    pub demand_growth: Option<f64>,
    pub reserve_margin: Option<f64>,
    pub seed: Option<u64>,
    pub frames_out: Option<PathBuf>,
    pub heat_out: Option<PathBuf>,
    pub geojson_dir: Option<PathBuf>,
    pub log_level: Option<Level>,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

pub fn parse_args_from(args: &[String]) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => opts.help = true,
            "--config" => set_once(&mut opts.config, flag, next_value(args, &mut i, flag)?)?,
            "--preset" => set_once(&mut opts.preset, flag, next_value(args, &mut i, flag)?)?,
            "--history" => set_once(&mut opts.history, flag, next_value(args, &mut i, flag)?)?,
            "--horizon" => set_once(&mut opts.horizon, flag, next_value(args, &mut i, flag)?)?,
            "--step-deg" => set_once(&mut opts.step_deg, flag, next_value(args, &mut i, flag)?)?,
            "--demand-growth" => {
                set_once(&mut opts.demand_growth, flag, next_value(args, &mut i, flag)?)?
            }
            "--reserve-margin" => {
                set_once(&mut opts.reserve_margin, flag, next_value(args, &mut i, flag)?)?
            }
            "--seed" => set_once(&mut opts.seed, flag, next_value(args, &mut i, flag)?)?,
            "--frames-out" => {
                set_once(&mut opts.frames_out, flag, next_value(args, &mut i, flag)?)?
            }
            "--heat-out" => set_once(&mut opts.heat_out, flag, next_value(args, &mut i, flag)?)?,
            "--geojson-dir" => {
                set_once(&mut opts.geojson_dir, flag, next_value(args, &mut i, flag)?)?
            }
            "--log-level" => {
                set_once(&mut opts.log_level, flag, next_value(args, &mut i, flag)?)?
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn set_once<T: std::str::FromStr>(slot: &mut Option<T>, flag: &str, raw: &str) -> Result<(), String> {
    let value = raw
        .parse::<T>()
        .map_err(|_| format!("invalid value \"{raw}\" for {flag}"))?;
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

pub fn print_usage() {
    eprintln!("powerplex: generation-mix forecast, supply adequacy and heat field rebuild");
    eprintln!();
    eprintln!("Usage: powerplex [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>            Load settings from a TOML file");
    eprintln!("  --preset <name>            Use a built-in preset (baseline, high_growth, fine_grid)");
    eprintln!("  --history <path>           CSV with generation by source (default: bundled sample)");
    eprintln!("  --horizon <years>          Years to forecast (default: 15)");
    eprintln!("  --step-deg <deg>           Grid resolution in degrees (default: 0.12)");
    eprintln!("  --demand-growth <frac>     Annual peak-demand growth (default: 0.045)");
    eprintln!("  --reserve-margin <frac>    Base-year reserve margin (default: 0.15)");
    eprintln!("  --seed <u64>               Heat-field noise seed (default: 7)");
    eprintln!("  --frames-out <path>        Write the year x metric stream as CSV");
    eprintln!("  --heat-out <path>          Write the year x point stream as CSV");
    eprintln!("  --geojson-dir <dir>        Write frames.json and per-year GeoJSON heat layers");
    eprintln!("  --log-level <level>        error, warn, info, debug or trace (default: info)");
    eprintln!("  --help                     Show this help message");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_args_use_defaults() {
        let opts = parse_args_from(&[]).expect("parse should succeed");
        assert!(opts.config.is_none());
        assert!(opts.preset.is_none());
        assert!(!opts.help);
    }

    #[test]
    fn parses_overrides() {
        let opts = parse_args_from(&args(&[
            "--horizon",
            "20",
            "--step-deg",
            "0.25",
            "--seed",
            "3",
            "--log-level",
            "debug",
        ]))
        .expect("parse should succeed");
        assert_eq!(opts.horizon, Some(20));
        assert_eq!(opts.step_deg, Some(0.25));
        assert_eq!(opts.seed, Some(3));
        assert_eq!(opts.log_level, Some(Level::DEBUG));
    }

    #[test]
    fn supports_config_path() {
        let opts = parse_args_from(&args(&["--config", "run.toml"])).expect("parse should succeed");
        assert_eq!(
            opts.config.as_deref().and_then(|p| p.to_str()),
            Some("run.toml")
        );
    }

    #[test]
    fn config_and_preset_are_exclusive() {
        let err = parse_args_from(&args(&["--config", "a.toml", "--preset", "baseline"]));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_missing_value() {
        let err = parse_args_from(&args(&["--seed"])).unwrap_err();
        assert!(err.contains("missing value for --seed"));
    }

    #[test]
    fn rejects_bad_number() {
        let err = parse_args_from(&args(&["--horizon", "ten"])).unwrap_err();
        assert!(err.contains("--horizon"));
    }

    #[test]
    fn rejects_repeated_flag() {
        let err = parse_args_from(&args(&["--seed", "1", "--seed", "2"])).unwrap_err();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(parse_args_from(&args(&["--bogus"])).is_err());
    }
}
