//! Projection of a historical generation mix over a forecast horizon.

use tracing::{debug, info};

use crate::forecast::TrendForecaster;
use crate::ingest::HistoricalMix;

/// Generation by source covering historical and projected years.
///
/// Every column in `sources` holds exactly one value per entry of `years`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MixTable {
    pub years: Vec<i32>,
    pub sources: Vec<MixColumn>,
    /// Index into `years` of the first projected year (`years.len()` if none).
    pub first_forecast_idx: usize,
}

/// One source's values aligned with [`MixTable::years`].
#[derive(Debug, Clone, PartialEq)]
pub struct MixColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl MixTable {
    /// Looks up a single cell.
    pub fn value(&self, year: i32, source: &str) -> Option<f64> {
        let idx = self.years.iter().position(|&y| y == year)?;
        self.sources
            .iter()
            .find(|c| c.name == source)
            .map(|c| c.values[idx])
    }

    /// Sum over all sources for each year, aligned with `years`.
    pub fn totals(&self) -> Vec<f64> {
        (0..self.years.len())
            .map(|i| self.sources.iter().map(|c| c.values[i]).sum())
            .collect()
    }

    /// Projected years only.
    pub fn forecast_years(&self) -> &[i32] {
        &self.years[self.first_forecast_idx..]
    }
}

/// Extends every source column of a historical mix by `horizon` years.
#[derive(Debug, Default, Clone, Copy)]
pub struct MixProjector {
    forecaster: TrendForecaster,
}

impl MixProjector {
    /// Creates a projector backed by the default trend forecaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects `history` forward by `horizon` years.
    ///
    /// Future years start right after the last historical year and are
    /// contiguous. Forecasts are clamped to be non-negative; historical
    /// values are passed through, with missing cells written as zero.
    ///
    /// # Arguments
    ///
    /// * `history` - Sorted historical table
    /// * `horizon` - Number of future years to append
    ///
    /// # Returns
    ///
    /// A [`MixTable`] with `history.years.len() + horizon` years, or an empty
    /// table when `history` has no years.
    pub fn project(&self, history: &HistoricalMix, horizon: usize) -> MixTable {
        let Some(last_year) = history.last_year() else {
            return MixTable::default();
        };

        let mut years = history.years.clone();
        years.extend((1..=horizon).map(|h| last_year + h as i32));

        let sources = history
            .sources
            .iter()
            .map(|series| {
                let forecast = self.forecaster.forecast_sparse(&series.values, horizon);
                if forecast.is_fallback() {
                    debug!(source = %series.name, "flat forecast for short history");
                }
                let mut values: Vec<f64> =
                    series.values.iter().map(|v| v.unwrap_or(0.0)).collect();
                values.extend(forecast.values().iter().map(|v| v.max(0.0)));
                MixColumn {
                    name: series.name.clone(),
                    values,
                }
            })
            .collect();

        info!(
            sources = history.sources.len(),
            first = history.years[0],
            last = last_year + horizon as i32,
            "projected generation mix"
        );
        MixTable {
            years,
            sources,
            first_forecast_idx: history.years.len(),
        }
    }
}
