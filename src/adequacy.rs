//! Yearly supply adequacy relative to an exponential peak-demand model.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::mix::MixTable;

/// Bounds of the normalized adequacy index.
pub const INDEX_MIN: f64 = -0.5;
pub const INDEX_MAX: f64 = 0.5;

/// Base peak demand used when the base-year total is not positive.
const DEGENERATE_BASE_PEAK: f64 = 1.0;

/// Supply and demand figures for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdequacyRecord {
    pub year: i32,
    /// Sum of all source values for the year.
    pub total_generation: f64,
    /// Modeled peak demand.
    pub peak_demand: f64,
    /// Equal to `total_generation`.
    pub available_supply: f64,
    /// `(supply - demand) / demand`, clamped to [`INDEX_MIN`, `INDEX_MAX`].
    pub adequacy_index: f64,
}

/// Per-year output metrics, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AdequacyIndex,
    AvailableSupply,
    PeakDemand,
    TotalGeneration,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AdequacyIndex,
        Metric::AvailableSupply,
        Metric::PeakDemand,
        Metric::TotalGeneration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::AdequacyIndex => "adequacy_index",
            Metric::AvailableSupply => "available_supply",
            Metric::PeakDemand => "peak_demand",
            Metric::TotalGeneration => "total_generation",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AdequacyRecord {
    /// Value of one metric.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AdequacyIndex => self.adequacy_index,
            Metric::AvailableSupply => self.available_supply,
            Metric::PeakDemand => self.peak_demand,
            Metric::TotalGeneration => self.total_generation,
        }
    }
}

/// Derives adequacy records from a projected mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdequacyEngine {
    /// Fractional annual peak-demand growth.
    pub demand_growth: f64,
    /// Fractional margin of base-year generation over base-year peak demand.
    pub reserve_margin: f64,
}

impl Default for AdequacyEngine {
    fn default() -> Self {
        Self {
            demand_growth: 0.045,
            reserve_margin: 0.15,
        }
    }
}

impl AdequacyEngine {
    pub fn new(demand_growth: f64, reserve_margin: f64) -> Self {
        Self {
            demand_growth,
            reserve_margin,
        }
    }

    /// Base-year peak demand implied by the reserve margin.
    pub fn base_peak_demand(&self, base_total: f64) -> f64 {
        if base_total <= 0.0 {
            return DEGENERATE_BASE_PEAK;
        }
        let peak = base_total / (1.0 + self.reserve_margin);
        if peak.is_finite() && peak > 0.0 {
            peak
        } else {
            DEGENERATE_BASE_PEAK
        }
    }

    /// Computes one record per year of `table`, in the table's year order.
    ///
    /// Demand grows as `base_peak * (1 + g)^(year - base_year)` where the base
    /// year is the earliest year in the table.
    pub fn evaluate(&self, table: &MixTable) -> Vec<AdequacyRecord> {
        let Some(&base_year) = table.years.iter().min() else {
            return Vec::new();
        };
        let totals = table.totals();
        let base_idx = table
            .years
            .iter()
            .position(|&y| y == base_year)
            .unwrap_or(0);
        let base_total = totals[base_idx];
        let base_peak = self.base_peak_demand(base_total);
        if base_total <= 0.0 {
            debug!(base_year, base_total, "degenerate baseline, using unit peak demand");
        }

        let records: Vec<AdequacyRecord> = table
            .years
            .iter()
            .zip(&totals)
            .map(|(&year, &total)| {
                let peak_demand =
                    base_peak * (1.0 + self.demand_growth).powi(year - base_year);
                AdequacyRecord {
                    year,
                    total_generation: total,
                    peak_demand,
                    available_supply: total,
                    adequacy_index: adequacy_index(total, peak_demand),
                }
            })
            .collect();

        info!(
            years = records.len(),
            base_year,
            base_peak,
            "computed adequacy index"
        );
        records
    }
}

/// Relative surplus of `supply` over `demand`, clamped to the index bounds.
///
/// Demand that has overflowed to infinity outweighs any finite supply.
fn adequacy_index(supply: f64, demand: f64) -> f64 {
    if demand == f64::INFINITY && supply.is_finite() {
        return INDEX_MIN;
    }
    let raw = (supply - demand) / demand;
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(INDEX_MIN, INDEX_MAX)
    }
}
