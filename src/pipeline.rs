//! End-to-end rebuild: history → mix projection → adequacy → heat field.

use std::io::Cursor;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::adequacy::{AdequacyEngine, AdequacyRecord, Metric};
use crate::config::{ConfigError, PipelineConfig};
use crate::geo::{GridPoint, RegionPolygon, grid_points_within};
use crate::heat::{HeatFieldSynthesizer, HeatSample};
use crate::ingest::{HistoricalMix, IngestError, read_history_csv, read_history_file};
use crate::mix::{MixProjector, MixTable};

/// Bundled sample of annual generation by source (TWh).
const SAMPLE_HISTORY: &str = include_str!("../data/sample_generation.csv");

/// Errors that abort a rebuild before any output exists.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("history acquisition failed: {0}")]
    Acquisition(#[from] IngestError),
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Supplier of the historical dataset.
///
/// Any blocking or fallible retrieval lives behind this trait; the pipeline
/// itself performs no I/O.
pub trait HistorySource {
    /// Loads the full historical table.
    ///
    /// # Errors
    ///
    /// Returns an [`IngestError`] when the data cannot be retrieved or parsed.
    fn load(&self) -> Result<HistoricalMix, IngestError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// History read from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    pub path: PathBuf,
}

impl HistorySource for CsvFileSource {
    fn load(&self) -> Result<HistoricalMix, IngestError> {
        read_history_file(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// The bundled sample dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleSource;

impl HistorySource for SampleSource {
    fn load(&self) -> Result<HistoricalMix, IngestError> {
        read_history_csv(Cursor::new(SAMPLE_HISTORY))
    }

    fn describe(&self) -> String {
        "bundled sample".to_string()
    }
}

/// An in-memory table, mostly for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticSource(pub HistoricalMix);

impl HistorySource for StaticSource {
    fn load(&self) -> Result<HistoricalMix, IngestError> {
        if self.0.is_empty() {
            return Err(IngestError::NoRows);
        }
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} years)", self.0.years.len())
    }
}

/// Caller-overridable parameters of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    pub horizon: usize,
    pub step_deg: f64,
    pub demand_growth: f64,
    pub reserve_margin: f64,
    pub seed: u64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            horizon: 15,
            step_deg: 0.12,
            demand_growth: 0.045,
            reserve_margin: 0.15,
            seed: 7,
        }
    }
}

impl From<&PipelineConfig> for PipelineParams {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            horizon: cfg.forecast.horizon,
            step_deg: cfg.grid.step_deg,
            demand_growth: cfg.adequacy.demand_growth,
            reserve_margin: cfg.adequacy.reserve_margin,
            seed: cfg.heat.seed,
        }
    }
}

/// One (year, metric) output value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameRecord {
    pub year: i32,
    pub metric: Metric,
    pub value: f64,
}

/// Everything a rebuild produces. Both streams replace prior state wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub mix: MixTable,
    pub adequacy: Vec<AdequacyRecord>,
    pub grid: Vec<GridPoint>,
    pub frames: Vec<FrameRecord>,
    pub heat: Vec<HeatSample>,
}

impl PipelineOutput {
    /// Heat samples of a single year, in grid order.
    pub fn heat_for_year(&self, year: i32) -> impl Iterator<Item = &HeatSample> {
        self.heat.iter().filter(move |s| s.year == year)
    }

    /// Adequacy record of a single year.
    pub fn adequacy_for_year(&self, year: i32) -> Option<&AdequacyRecord> {
        self.adequacy.iter().find(|r| r.year == year)
    }
}

/// Flattens adequacy records into the (year, metric) stream.
pub fn frame_records(adequacy: &[AdequacyRecord]) -> Vec<FrameRecord> {
    adequacy
        .iter()
        .flat_map(|r| {
            Metric::ALL.into_iter().map(move |metric| FrameRecord {
                year: r.year,
                metric,
                value: r.metric(metric),
            })
        })
        .collect()
}

/// Runs the computational pipeline over an already-acquired history.
///
/// Pure and infallible: every edge case inside is absorbed by a fallback.
pub fn run(history: &HistoricalMix, params: &PipelineParams) -> PipelineOutput {
    let mix = MixProjector::new().project(history, params.horizon);
    let adequacy =
        AdequacyEngine::new(params.demand_growth, params.reserve_margin).evaluate(&mix);
    let frames = frame_records(&adequacy);

    let grid = grid_points_within(&RegionPolygon::bangladesh_bbox(), params.step_deg);
    let synth = HeatFieldSynthesizer::new(params.seed);
    let heat: Vec<HeatSample> = adequacy
        .iter()
        .flat_map(|r| synth.samples(r.year, &grid, r.adequacy_index))
        .collect();

    info!(
        years = adequacy.len(),
        grid_points = grid.len(),
        heat_samples = heat.len(),
        "pipeline run complete"
    );
    PipelineOutput {
        mix,
        adequacy,
        grid,
        frames,
        heat,
    }
}

/// Acquires history from `source` and runs the pipeline.
///
/// Acquisition happens first; if it fails nothing is computed and the
/// error is returned, so callers never see partial output.
///
/// # Errors
///
/// Returns [`PipelineError::Acquisition`] if the source fails.
pub fn rebuild(
    source: &dyn HistorySource,
    params: &PipelineParams,
) -> Result<PipelineOutput, PipelineError> {
    info!(source = %source.describe(), "acquiring history");
    let history = source.load()?;
    Ok(run(&history, params))
}

/// Validates `config`, picks its history source and runs the pipeline.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for invalid settings and
/// [`PipelineError::Acquisition`] if the history cannot be loaded.
pub fn rebuild_from_config(config: &PipelineConfig) -> Result<PipelineOutput, PipelineError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(PipelineError::Config(errors));
    }
    let params = PipelineParams::from(config);
    match &config.source.history {
        Some(path) => rebuild(&CsvFileSource { path: path.clone() }, &params),
        None => rebuild(&SampleSource, &params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> PipelineParams {
        PipelineParams {
            horizon: 3,
            step_deg: 1.0,
            ..PipelineParams::default()
        }
    }

    fn history() -> HistoricalMix {
        HistoricalMix::from_series(vec![(
            "Gas",
            vec![(2018, 40.0), (2019, 42.0), (2020, 41.0), (2021, 45.0), (2022, 48.0)],
        )])
    }

    #[test]
    fn frames_have_four_metrics_per_year() {
        let out = run(&history(), &small_params());
        assert_eq!(out.adequacy.len(), 8);
        assert_eq!(out.frames.len(), 8 * 4);
        assert_eq!(out.frames[0].metric, Metric::AdequacyIndex);
        assert_eq!(out.frames[3].metric, Metric::TotalGeneration);
    }

    #[test]
    fn heat_covers_every_point_every_year() {
        let out = run(&history(), &small_params());
        assert!(!out.grid.is_empty());
        assert_eq!(out.heat.len(), out.grid.len() * out.adequacy.len());
        assert_eq!(out.heat_for_year(2025).count(), out.grid.len());
    }

    #[test]
    fn sample_source_loads() {
        let mix = SampleSource.load().expect("bundled sample should parse");
        assert!(mix.years.len() >= 4);
        assert!(mix.source("Gas").is_some());
    }

    #[test]
    fn failed_acquisition_produces_no_output() {
        let source = CsvFileSource {
            path: PathBuf::from("missing/history.csv"),
        };
        let result = rebuild(&source, &small_params());
        assert!(matches!(result, Err(PipelineError::Acquisition(_))));
    }

    #[test]
    fn invalid_config_is_rejected_before_acquisition() {
        let mut cfg = PipelineConfig::baseline();
        cfg.grid.step_deg = -1.0;
        cfg.source.history = Some(PathBuf::from("missing/history.csv"));
        let err = rebuild_from_config(&cfg).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("grid.step_deg"));
    }

    #[test]
    fn params_follow_config() {
        let mut cfg = PipelineConfig::baseline();
        cfg.heat.seed = 11;
        cfg.forecast.horizon = 4;
        let params = PipelineParams::from(&cfg);
        assert_eq!(params.seed, 11);
        assert_eq!(params.horizon, 4);
        assert_eq!(PipelineParams::from(&PipelineConfig::baseline()), PipelineParams::default());
    }
}
