#![allow(dead_code)]

use geo::{LineString, Polygon, coord};
use spatio_shapes::{DocId, Geometry};

/// The five nested query bands over south-central Alaska, widest first.
pub const ALASKA_BANDS: [&str; 5] = [
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-147,59],[-147,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-151,59],[-151,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61],[-151,61],[-151,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61],[-151.9,61],[-151.9,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61.9],[-151.9,61.9],[-151.9,62],[-152,62]]]}"#,
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic pseudo-random numbers for reproducible datasets.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Snap to a 0.05 degree lattice so that some shapes land exactly on
    /// query edges.
    pub fn snapped(&mut self, lo: f64, hi: f64) -> f64 {
        (self.range(lo, hi) * 20.0).round() / 20.0
    }
}

fn triangle(lon: f64, lat: f64, size: f64) -> Geometry {
    Geometry::Polygon(Polygon::new(
        LineString::from(vec![
            coord! { x: lon, y: lat },
            coord! { x: lon + size, y: lat },
            coord! { x: lon + size / 2.0, y: lat + size },
            coord! { x: lon, y: lat },
        ]),
        vec![],
    ))
}

fn donut(lon: f64, lat: f64, size: f64) -> Geometry {
    let ring = |min_x: f64, min_y: f64, side: f64| {
        LineString::from(vec![
            coord! { x: min_x, y: min_y },
            coord! { x: min_x + side, y: min_y },
            coord! { x: min_x + side, y: min_y + side },
            coord! { x: min_x, y: min_y + side },
            coord! { x: min_x, y: min_y },
        ])
    };
    Geometry::Polygon(Polygon::new(
        ring(lon, lat, size),
        vec![ring(lon + size / 4.0, lat + size / 4.0, size / 2.0)],
    ))
}

/// Mixed points, rectangles, triangles and polygons with holes over
/// south-central Alaska.
pub fn synthetic_alaska(count: usize, seed: u64) -> Vec<(DocId, Geometry)> {
    let mut rng = Lcg::new(seed);
    (0..count)
        .map(|i| {
            let lon = rng.snapped(-155.0, -145.0);
            let lat = rng.snapped(58.0, 64.0);
            let size = rng.range(0.05, 0.8);
            let geometry = match i % 4 {
                0 | 1 => Geometry::point(lon, lat),
                2 => Geometry::rectangle(lon, lat, lon + size, lat + size / 2.0),
                _ if i % 8 == 3 => triangle(lon, lat, size),
                _ => donut(lon, lat, size),
            };
            (i as DocId, geometry)
        })
        .collect()
}
