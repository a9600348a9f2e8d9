//! Planar polygon membership and the region sampling lattice.

use serde::Serialize;
use tracing::{debug, warn};

/// Tolerance used for boundary and lattice-edge comparisons (degrees).
const EPS: f64 = 1e-9;

/// Largest candidate lattice `grid_points_within` will walk.
pub const MAX_LATTICE_POINTS: usize = 25_000_000;

/// A point in (longitude, latitude) degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GridPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Euclidean distance in coordinate units.
    pub fn distance_to(&self, other: &GridPoint) -> f64 {
        (self.lon - other.lon).hypot(self.lat - other.lat)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn contains(&self, p: &GridPoint) -> bool {
        p.lon >= self.min_lon - EPS
            && p.lon <= self.max_lon + EPS
            && p.lat >= self.min_lat - EPS
            && p.lat <= self.max_lat + EPS
    }
}

/// A closed planar polygon given by its vertices; the closing edge from the
/// last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    vertices: Vec<GridPoint>,
}

impl RegionPolygon {
    /// Creates a polygon from at least three vertices.
    ///
    /// # Panics
    ///
    /// Panics if fewer than three vertices are given.
    pub fn new(vertices: Vec<GridPoint>) -> Self {
        assert!(vertices.len() >= 3, "a polygon needs at least three vertices");
        Self { vertices }
    }

    /// The fixed region of interest: lon [88.0, 92.8], lat [20.5, 26.8].
    pub fn bangladesh_bbox() -> Self {
        Self::new(vec![
            GridPoint::new(88.0, 20.5),
            GridPoint::new(92.8, 20.5),
            GridPoint::new(92.8, 26.8),
            GridPoint::new(88.0, 26.8),
        ])
    }

    pub fn vertices(&self) -> &[GridPoint] {
        &self.vertices
    }

    pub fn bounds(&self) -> Bounds {
        let first = self.vertices[0];
        self.vertices.iter().fold(
            Bounds {
                min_lon: first.lon,
                min_lat: first.lat,
                max_lon: first.lon,
                max_lat: first.lat,
            },
            |b, v| Bounds {
                min_lon: b.min_lon.min(v.lon),
                min_lat: b.min_lat.min(v.lat),
                max_lon: b.max_lon.max(v.lon),
                max_lat: b.max_lat.max(v.lat),
            },
        )
    }

    fn edges(&self) -> impl Iterator<Item = (GridPoint, GridPoint)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Whether `p` lies on any edge, within [`EPS`].
    pub fn on_boundary(&self, p: &GridPoint) -> bool {
        self.edges().any(|(a, b)| on_segment(p, &a, &b))
    }

    /// Point-in-polygon test; interior and boundary both count as inside.
    ///
    /// Boundary points are caught by an explicit on-segment test, the
    /// interior by even–odd ray casting towards +lon.
    pub fn contains(&self, p: &GridPoint) -> bool {
        if self.on_boundary(p) {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let cross_lon = a.lon + (p.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
                if p.lon < cross_lon {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn on_segment(p: &GridPoint, a: &GridPoint, b: &GridPoint) -> bool {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return p.distance_to(a) <= EPS;
    }
    let cross = dx * (p.lat - a.lat) - dy * (p.lon - a.lon);
    if cross.abs() > EPS * len {
        return false;
    }
    let dot = dx * (p.lon - a.lon) + dy * (p.lat - a.lat);
    dot >= -EPS * len && dot <= len * len + EPS * len
}

/// Number of lattice steps needed to reach `span`, counting a point that
/// lands on the far edge within tolerance. `None` when the count does not
/// fit in a `usize`.
fn lattice_len(span: f64, step: f64) -> Option<usize> {
    let steps = ((span / step) - EPS).ceil().max(0.0);
    if !steps.is_finite() || steps >= usize::MAX as f64 {
        return None;
    }
    (steps as usize).checked_add(1)
}

/// Lattice points of `polygon` at `step_deg` spacing, row-major by latitude
/// then longitude.
///
/// The lattice starts at the bounding box's minimum corner and spans it
/// inclusive of the max edge. A non-positive or non-finite step yields no
/// points, as does a step so fine that the lattice would exceed
/// [`MAX_LATTICE_POINTS`] candidates.
pub fn grid_points_within(polygon: &RegionPolygon, step_deg: f64) -> Vec<GridPoint> {
    if !(step_deg.is_finite() && step_deg > 0.0) {
        return Vec::new();
    }
    let b = polygon.bounds();
    let candidates = lattice_len(b.max_lon - b.min_lon, step_deg)
        .zip(lattice_len(b.max_lat - b.min_lat, step_deg))
        .and_then(|(nx, ny)| nx.checked_mul(ny).map(|total| (nx, ny, total)))
        .filter(|&(_, _, total)| total <= MAX_LATTICE_POINTS);
    let Some((nx, ny, total)) = candidates else {
        warn!(step_deg, "lattice too large for step, returning empty grid");
        return Vec::new();
    };

    let mut points = Vec::with_capacity(total);
    for j in 0..ny {
        let lat = b.min_lat + j as f64 * step_deg;
        for i in 0..nx {
            let p = GridPoint::new(b.min_lon + i as f64 * step_deg, lat);
            if polygon.contains(&p) {
                points.push(p);
            }
        }
    }
    debug!(
        step_deg,
        candidates = total,
        kept = points.len(),
        "built region grid"
    );
    points
}
