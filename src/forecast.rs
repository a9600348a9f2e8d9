//! Annual trend extrapolation (Holt's linear method) with a flat fallback.

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;
use tracing::{debug, trace, warn};

/// Minimum number of usable observations required to fit a trend.
pub const MIN_HISTORY: usize = 4;

/// Number of leading observations used to seed the initial level and trend.
const INIT_WINDOW: usize = 4;

/// Smoothing parameters are kept strictly inside (0, 1) by this margin.
const PARAM_EPS: f64 = 1e-4;

/// Coarse grid used to seed the simplex search.
const GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

/// Iteration cap for the Nelder–Mead refinement.
const MAX_ITERS: u64 = 300;

/// Result of a single-series extrapolation.
///
/// Both variants carry a plain vector of forecast values; the tag only
/// records which path produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Forecast {
    /// Holt's model was fitted with the given smoothing parameters.
    Fitted {
        alpha: f64,
        beta: f64,
        values: Vec<f64>,
    },
    /// Too little history: the last usable value repeated (or zeros).
    Fallback { values: Vec<f64> },
}

impl Forecast {
    /// Forecast values, one per requested period.
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Fitted { values, .. } | Self::Fallback { values } => values,
        }
    }

    /// Consumes the forecast and returns its values.
    pub fn into_values(self) -> Vec<f64> {
        match self {
            Self::Fitted { values, .. } | Self::Fallback { values } => values,
        }
    }

    /// Whether the flat fallback path was taken.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Double exponential smoothing (additive trend, no seasonality).
///
/// The forecaster never fails: series with fewer than [`MIN_HISTORY`]
/// finite observations produce a flat forecast of the last value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendForecaster;

impl TrendForecaster {
    /// Extrapolates `series` forward by `periods` steps.
    ///
    /// # Arguments
    ///
    /// * `series` - Observations in chronological order; non-finite values are dropped
    /// * `periods` - Number of future steps to produce
    ///
    /// # Returns
    ///
    /// A [`Forecast`] whose values have length exactly `periods`.
    pub fn forecast(&self, series: &[f64], periods: usize) -> Forecast {
        let clean = finite_only(series.iter().copied());
        self.forecast_clean(clean, periods)
    }

    /// Same as [`forecast`](Self::forecast) for series with missing observations.
    pub fn forecast_sparse(&self, series: &[Option<f64>], periods: usize) -> Forecast {
        let clean = finite_only(series.iter().flatten().copied());
        self.forecast_clean(clean, periods)
    }

    fn forecast_clean(&self, y: Vec<f64>, periods: usize) -> Forecast {
        if y.len() < MIN_HISTORY {
            let last = y.last().copied().unwrap_or(0.0);
            debug!(
                observations = y.len(),
                last, "insufficient history, using flat forecast"
            );
            return Forecast::Fallback {
                values: vec![last; periods],
            };
        }

        let (level0, trend0) = initial_state(&y);
        let (alpha, beta) = optimize_params(&y, level0, trend0);
        let (level, trend) = final_state(&y, alpha, beta, level0, trend0);
        debug!(alpha, beta, level, trend, "fitted holt model");

        let values = (1..=periods).map(|h| level + h as f64 * trend).collect();
        Forecast::Fitted {
            alpha,
            beta,
            values,
        }
    }
}

fn finite_only(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values
        .filter(|v| {
            let keep = v.is_finite();
            if !keep {
                trace!(value = v, "dropping non-finite observation");
            }
            keep
        })
        .collect()
}

/// Least-squares line over the first few observations, stepped back one
/// period so the first one-step prediction lands on the fitted line.
fn initial_state(y: &[f64]) -> (f64, f64) {
    let n = y.len().min(INIT_WINDOW);
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = y[..n].iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, v) in y[..n].iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (v - mean_y);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;
    (intercept - slope, slope)
}

/// Runs the smoothing recursion, returning the SSE of one-step-ahead
/// predictions and the final (level, trend).
fn smooth(y: &[f64], alpha: f64, beta: f64, level0: f64, trend0: f64) -> (f64, f64, f64) {
    let mut level = level0;
    let mut trend = trend0;
    let mut sse = 0.0;
    for &obs in y {
        let predicted = level + trend;
        let residual = obs - predicted;
        sse += residual * residual;

        let prev_level = level;
        level = alpha * obs + (1.0 - alpha) * predicted;
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }
    (sse, level, trend)
}

fn final_state(y: &[f64], alpha: f64, beta: f64, level0: f64, trend0: f64) -> (f64, f64) {
    let (_, level, trend) = smooth(y, alpha, beta, level0, trend0);
    (level, trend)
}

fn clamp_param(p: f64) -> f64 {
    p.clamp(PARAM_EPS, 1.0 - PARAM_EPS)
}

fn logit(p: f64) -> f64 {
    let p = clamp_param(p);
    (p / (1.0 - p)).ln()
}

fn sigmoid(z: f64) -> f64 {
    clamp_param(1.0 / (1.0 + (-z).exp()))
}

/// Sum of squared one-step residuals over unconstrained (logit) parameters.
struct HoltCost<'a> {
    y: &'a [f64],
    level0: f64,
    trend0: f64,
}

impl HoltCost<'_> {
    fn sse(&self, alpha: f64, beta: f64) -> f64 {
        let (sse, _, _) = smooth(self.y, alpha, beta, self.level0, self.trend0);
        if sse.is_finite() { sse } else { f64::MAX }
    }
}

impl CostFunction for HoltCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, z: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.sse(sigmoid(z[0]), sigmoid(z[1])))
    }
}

/// Picks (alpha, beta) minimizing the one-step SSE.
///
/// A grid search provides the starting simplex; Nelder–Mead refines it.
/// The grid optimum is kept whenever the refinement errors or does worse.
fn optimize_params(y: &[f64], level0: f64, trend0: f64) -> (f64, f64) {
    let problem = HoltCost { y, level0, trend0 };

    let mut best = (GRID[0], GRID[0]);
    let mut best_cost = f64::INFINITY;
    for &alpha in &GRID {
        for &beta in &GRID {
            let cost = problem.sse(alpha, beta);
            if cost < best_cost {
                best_cost = cost;
                best = (alpha, beta);
            }
        }
    }

    let start = vec![logit(best.0), logit(best.1)];
    let simplex = vec![
        start.clone(),
        vec![start[0] + 0.5, start[1]],
        vec![start[0], start[1] + 0.5],
    ];

    let refined = NelderMead::new(simplex)
        .with_sd_tolerance(1e-10)
        .and_then(|solver| {
            Executor::new(problem, solver)
                .configure(|state| state.max_iters(MAX_ITERS))
                .run()
        });

    match refined {
        Ok(res) => {
            let state = res.state();
            let cost = state.get_best_cost();
            match state.get_best_param() {
                Some(z) if cost.is_finite() && cost <= best_cost => {
                    (sigmoid(z[0]), sigmoid(z[1]))
                }
                _ => best,
            }
        }
        Err(err) => {
            warn!(error = %err, "simplex refinement failed, keeping grid optimum");
            best
        }
    }
}
