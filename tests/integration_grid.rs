//! Region lattice and heat field properties over the fixed bounding box.

use powerplex::geo::{GridPoint, RegionPolygon, grid_points_within};
use powerplex::heat::HeatFieldSynthesizer;

#[test]
fn default_step_grid_size_and_boundary_policy() {
    let poly = RegionPolygon::bangladesh_bbox();
    let pts = grid_points_within(&poly, 0.12);

    // ceil(4.8 / 0.12) x ceil(6.3 / 0.12)
    let upper = 40 * 53;
    // boundary-inclusive: the lon = 92.8 column lands on the east edge
    assert_eq!(pts.len(), upper + 53);

    assert!(pts.iter().any(|p| (p.lon - 92.8).abs() < 1e-9));
    assert!(pts.iter().any(|p| p.lon == 88.0 && p.lat == 20.5));
    assert!(pts.iter().all(|p| p.lat <= 26.8 + 1e-9));
    assert!(pts.iter().all(|p| (p.lat - 26.8).abs() > 1e-9));
}

#[test]
fn grid_is_subset_of_bounds_and_polygon() {
    let poly = RegionPolygon::bangladesh_bbox();
    let bounds = poly.bounds();
    for p in grid_points_within(&poly, 0.3) {
        assert!(bounds.contains(&p));
        assert!(poly.contains(&p));
    }
}

#[test]
fn grid_is_reproducible() {
    let poly = RegionPolygon::bangladesh_bbox();
    assert_eq!(grid_points_within(&poly, 0.12), grid_points_within(&poly, 0.12));
}

#[test]
fn custom_polygon_excludes_outside_lattice_points() {
    let diamond = RegionPolygon::new(vec![
        GridPoint::new(90.0, 21.0),
        GridPoint::new(92.0, 23.0),
        GridPoint::new(90.0, 25.0),
        GridPoint::new(88.0, 23.0),
    ]);
    let pts = grid_points_within(&diamond, 0.5);
    let b = diamond.bounds();
    let candidates = 9 * 9;
    assert!(pts.len() < candidates);
    assert!(pts.iter().all(|p| diamond.contains(p) && b.contains(p)));
    // |dx| + |dy| <= 2 on the 0.5 lattice: 1 + 4 + 8 + 12 + 16 = 41
    assert_eq!(pts.len(), 41);
}

#[test]
fn heat_field_is_bounded_and_reproducible_on_real_grid() {
    let pts = grid_points_within(&RegionPolygon::bangladesh_bbox(), 0.12);
    let synth = HeatFieldSynthesizer::new(7);
    for year_value in [-0.5, 0.0, 0.42] {
        let a = synth.values(&pts, year_value);
        let b = synth.values(&pts, year_value);
        assert_eq!(a.len(), pts.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
        assert!(a.iter().all(|v| (-0.5..=0.5).contains(v)));
    }
}
