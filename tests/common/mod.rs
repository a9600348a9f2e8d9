//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use powerplex::ingest::HistoricalMix;
use powerplex::pipeline::PipelineParams;

/// Single-source history 2018–2022 growing roughly 2 per year.
pub fn rising_history() -> HistoricalMix {
    HistoricalMix::from_series(vec![(
        "Gas",
        vec![
            (2018, 40.0),
            (2019, 42.0),
            (2020, 41.0),
            (2021, 45.0),
            (2022, 48.0),
        ],
    )])
}

/// Three sources with uneven history lengths.
pub fn mixed_history() -> HistoricalMix {
    HistoricalMix::from_series(vec![
        (
            "Coal",
            (2010..2020).map(|y| (y, 2.0 + 0.5 * f64::from(y - 2010))).collect(),
        ),
        (
            "Gas",
            (2010..2020).map(|y| (y, 30.0 + 3.0 * f64::from(y - 2010))).collect(),
        ),
        ("Solar", vec![(2018, 0.2), (2019, 0.4)]),
    ])
}

/// Default parameters with a coarse grid to keep tests fast.
pub fn coarse_params(horizon: usize) -> PipelineParams {
    PipelineParams {
        horizon,
        step_deg: 0.5,
        ..PipelineParams::default()
    }
}
