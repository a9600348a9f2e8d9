//! Deterministic synthetic heat field over the region grid.
//!
//! The field is a visualization proxy: a year's adequacy index, shifted by a
//! radial falloff around a fixed load centre, plus seeded Gaussian noise.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::adequacy::{INDEX_MAX, INDEX_MIN};
use crate::geo::GridPoint;

/// Reference load centre the spatial falloff is measured from.
pub const LOAD_CENTRE: GridPoint = GridPoint::new(90.35, 23.8);

/// Denominator of the Gaussian falloff `exp(-d^2 / FALLOFF_SCALE)`.
const FALLOFF_SCALE: f64 = 1.2;
/// Weight of the spatial term.
const SPATIAL_WEIGHT: f64 = 0.25;
/// Offset subtracted from the falloff before weighting.
const SPATIAL_OFFSET: f64 = 0.4;
/// Standard deviation of the per-point noise.
const NOISE_STD: f64 = 0.03;

/// One heat-field value at a grid point for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatSample {
    pub year: i32,
    pub lon: f64,
    pub lat: f64,
    pub value: f64,
}

/// Draws one sample from N(0, `std_dev`^2) using the Box–Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Produces heat values for a point set.
///
/// The RNG is rebuilt from `seed` on every call, so equal inputs always
/// yield bit-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatFieldSynthesizer {
    pub seed: u64,
}

impl Default for HeatFieldSynthesizer {
    fn default() -> Self {
        Self { seed: 7 }
    }
}

impl HeatFieldSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Radial falloff around [`LOAD_CENTRE`].
    pub fn spatial_weight(point: &GridPoint) -> f64 {
        let d = point.distance_to(&LOAD_CENTRE);
        (-(d * d) / FALLOFF_SCALE).exp()
    }

    /// One value per point, in point order, each within the index bounds.
    ///
    /// # Arguments
    ///
    /// * `points` - Grid points; noise is drawn in this order
    /// * `year_value` - The year's adequacy index
    pub fn values(&self, points: &[GridPoint], year_value: f64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        points
            .iter()
            .map(|p| {
                let spatial = Self::spatial_weight(p);
                let noise = gaussian_noise(&mut rng, NOISE_STD);
                let v = year_value + SPATIAL_WEIGHT * (spatial - SPATIAL_OFFSET) + noise;
                if v.is_nan() {
                    0.0
                } else {
                    v.clamp(INDEX_MIN, INDEX_MAX)
                }
            })
            .collect()
    }

    /// Same as [`values`](Self::values), tagged with year and coordinates.
    pub fn samples(&self, year: i32, points: &[GridPoint], year_value: f64) -> Vec<HeatSample> {
        points
            .iter()
            .zip(self.values(points, year_value))
            .map(|(p, value)| HeatSample {
                year,
                lon: p.lon,
                lat: p.lat,
                value,
            })
            .collect()
    }
}
