//! Post-run summary derived from pipeline output.

use std::fmt;

use crate::pipeline::PipelineOutput;

/// Headline figures of a rebuild, computed post-hoc from its output.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// First and last year in the projected table.
    pub year_span: Option<(i32, i32)>,
    /// First projected year, if any.
    pub first_forecast_year: Option<i32>,
    /// Number of generation sources.
    pub source_count: usize,
    /// Earliest year with a negative adequacy index.
    pub first_deficit_year: Option<i32>,
    /// Lowest adequacy index and its year.
    pub min_index: Option<(i32, f64)>,
    /// Highest adequacy index and its year.
    pub max_index: Option<(i32, f64)>,
    /// Grid points per year.
    pub grid_points: usize,
    /// Total heat samples.
    pub heat_samples: usize,
}

impl RunSummary {
    pub fn from_output(out: &PipelineOutput) -> Self {
        let years = &out.mix.years;
        let year_span = years.first().zip(years.last()).map(|(&a, &b)| (a, b));
        let first_forecast_year = out.mix.forecast_years().first().copied();

        let first_deficit_year = out
            .adequacy
            .iter()
            .find(|r| r.adequacy_index < 0.0)
            .map(|r| r.year);

        let mut min_index: Option<(i32, f64)> = None;
        let mut max_index: Option<(i32, f64)> = None;
        for r in &out.adequacy {
            let v = r.adequacy_index;
            if min_index.is_none_or(|(_, m)| v < m) {
                min_index = Some((r.year, v));
            }
            if max_index.is_none_or(|(_, m)| v > m) {
                max_index = Some((r.year, v));
            }
        }

        Self {
            year_span,
            first_forecast_year,
            source_count: out.mix.sources.len(),
            first_deficit_year,
            min_index,
            max_index,
            grid_points: out.grid.len(),
            heat_samples: out.heat.len(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Rebuild Summary ---")?;
        match self.year_span {
            Some((a, b)) => writeln!(f, "Years:                 {a}-{b}")?,
            None => writeln!(f, "Years:                 none")?,
        }
        match self.first_forecast_year {
            Some(y) => writeln!(f, "Forecast from:         {y}")?,
            None => writeln!(f, "Forecast from:         n/a")?,
        }
        writeln!(f, "Sources:               {}", self.source_count)?;
        match self.first_deficit_year {
            Some(y) => writeln!(f, "First deficit year:    {y}")?,
            None => writeln!(f, "First deficit year:    none")?,
        }
        if let (Some((ly, lv)), Some((hy, hv))) = (self.min_index, self.max_index) {
            writeln!(f, "Adequacy index:        {lv:+.3} ({ly}) to {hv:+.3} ({hy})")?;
        }
        writeln!(f, "Grid points:           {}", self.grid_points)?;
        write!(f, "Heat samples:          {}", self.heat_samples)
    }
}
