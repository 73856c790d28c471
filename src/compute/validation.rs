//! Validation for geographic coordinates and shapes.
//!
//! Every rule rejects with a [`ValidationError`] variant naming the rule, so a
//! skipped record can be attributed without parsing the message.

use crate::error::ValidationError;
use geo::kernels::{Kernel, Orientation, RobustKernel};
use geo::{Coord, LineString, Point, Polygon};
use rustc_hash::FxHashSet;
use spatio_shapes_types::Geometry;

/// Validates a coordinate has finite, in-range longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// `location` is only evaluated when the coordinate is rejected.
pub fn validate_coordinate<F>(coord: Coord, location: F) -> Result<(), ValidationError>
where
    F: FnOnce() -> String,
{
    let (x, y) = (coord.x, coord.y);

    if !x.is_finite() || !y.is_finite() {
        return Err(ValidationError::NonFiniteCoordinate {
            location: location(),
        });
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(ValidationError::LongitudeOutOfRange {
            location: location(),
            value: x,
        });
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(ValidationError::LatitudeOutOfRange {
            location: location(),
            value: y,
        });
    }

    Ok(())
}

/// Validates a 2D point has valid longitude and latitude.
///
/// # Examples
///
/// ```
/// use spatio_shapes::validation::validate_geographic_point;
/// use geo::Point;
///
/// assert!(validate_geographic_point(&Point::new(-149.9, 61.2)).is_ok());
/// assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
/// assert!(validate_geographic_point(&Point::new(-74.0, 95.0)).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<(), ValidationError> {
    validate_coordinate(point.0, || "point".to_string())
}

/// Converts a raw GeoJSON position into a coordinate, checking its length
/// and range. Extra values (altitude) are ignored.
pub fn validate_position<F>(position: &[f64], location: F) -> Result<Coord, ValidationError>
where
    F: Fn() -> String,
{
    if position.len() < 2 {
        return Err(ValidationError::ShortPosition {
            location: location(),
            len: position.len(),
        });
    }

    let coord = Coord {
        x: position[0],
        y: position[1],
    };
    validate_coordinate(coord, location)?;
    Ok(coord)
}

/// Validates a ring as it appeared in the input: closed, with at least three
/// distinct vertices, and for the outer ring (`ring == 0`) enclosing a
/// non-zero area.
///
/// Must be called before the ring is handed to `geo::Polygon::new`, which
/// closes open rings silently.
pub fn validate_ring(coords: &[Coord], ring: usize) -> Result<(), ValidationError> {
    let (Some(first), Some(last)) = (coords.first(), coords.last()) else {
        return Err(ValidationError::TooFewVertices { ring, distinct: 0 });
    };

    if first != last {
        return Err(ValidationError::UnclosedRing { ring });
    }

    let distinct = count_distinct(coords);
    if distinct < 3 {
        return Err(ValidationError::TooFewVertices { ring, distinct });
    }

    if ring == 0 && is_collinear(coords) {
        return Err(ValidationError::ZeroArea { ring });
    }

    Ok(())
}

/// Validates all polygon coordinates (exterior and interior rings) and the
/// shape rules of every ring.
///
/// # Examples
///
/// ```
/// use spatio_shapes::validation::validate_polygon;
/// use geo::{polygon, Polygon};
///
/// let poly: Polygon = polygon![
///     (x: -152.0, y: 62.0),
///     (x: -152.0, y: 59.0),
///     (x: -147.0, y: 59.0),
///     (x: -147.0, y: 62.0),
///     (x: -152.0, y: 62.0),
/// ];
///
/// assert!(validate_polygon(&poly).is_ok());
/// ```
pub fn validate_polygon(polygon: &Polygon) -> Result<(), ValidationError> {
    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors().iter());

    for (ring_idx, ring) in rings.enumerate() {
        for (idx, coord) in ring.coords().enumerate() {
            validate_coordinate(*coord, || ring_location(ring_idx, idx))?;
        }
        validate_ring(&ring.0, ring_idx)?;
    }

    Ok(())
}

/// Validates a geometry built in code rather than parsed from a payload.
pub fn validate_geometry(geometry: &Geometry) -> Result<(), ValidationError> {
    match geometry {
        Geometry::Point(point) => validate_geographic_point(point),
        Geometry::Polygon(polygon) => validate_polygon(polygon),
    }
}

pub(crate) fn ring_location(ring: usize, vertex: usize) -> String {
    format!("ring {} vertex {}", ring, vertex)
}

fn count_distinct(coords: &[Coord]) -> usize {
    // `+ 0.0` folds -0.0 into 0.0 so both spellings count once
    coords
        .iter()
        .map(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
        .collect::<FxHashSet<_>>()
        .len()
}

fn is_collinear(coords: &[Coord]) -> bool {
    let Some(&a) = coords.first() else {
        return true;
    };
    let Some(&b) = coords.iter().find(|c| **c != a) else {
        return true;
    };

    coords
        .iter()
        .all(|&c| RobustKernel::orient2d(a, b, c) == Orientation::Collinear)
}

/// Closed ring from raw coordinates, without `geo`'s implicit closing.
pub(crate) fn ring_from_coords(coords: Vec<Coord>) -> LineString {
    LineString::new(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    fn square() -> Vec<Coord> {
        vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
            coord! { x: 0.0, y: 1.0 },
            coord! { x: 0.0, y: 0.0 },
        ]
    }

    #[test]
    fn test_valid_geographic_point() {
        let anchorage = Point::new(-149.9003, 61.2181);
        assert!(validate_geographic_point(&anchorage).is_ok());

        // Edge cases
        assert!(validate_geographic_point(&Point::new(180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(-180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, 90.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, -90.0)).is_ok());
    }

    #[test]
    fn test_invalid_coordinates_name_the_rule() {
        let err = validate_geographic_point(&Point::new(180.1, 40.0)).unwrap_err();
        assert_eq!(err.rule(), "longitude_out_of_range");

        let err = validate_geographic_point(&Point::new(-74.0, -90.1)).unwrap_err();
        assert_eq!(err.rule(), "latitude_out_of_range");

        let err = validate_geographic_point(&Point::new(f64::NAN, 40.0)).unwrap_err();
        assert_eq!(err.rule(), "non_finite_coordinate");

        let err = validate_geographic_point(&Point::new(-74.0, f64::INFINITY)).unwrap_err();
        assert_eq!(err.rule(), "non_finite_coordinate");
    }

    #[test]
    fn test_short_position() {
        let err = validate_position(&[1.0], || "point".to_string()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ShortPosition {
                location: "point".to_string(),
                len: 1
            }
        );

        let coord = validate_position(&[1.0, 2.0, 300.0], || "point".to_string()).unwrap();
        assert_eq!(coord, coord! { x: 1.0, y: 2.0 });
    }

    #[test]
    fn test_ring_rules() {
        assert!(validate_ring(&square(), 0).is_ok());

        let mut open = square();
        open.pop();
        assert_eq!(
            validate_ring(&open, 0),
            Err(ValidationError::UnclosedRing { ring: 0 })
        );

        let sliver = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
            coord! { x: 0.0, y: 0.0 },
        ];
        assert_eq!(
            validate_ring(&sliver, 1),
            Err(ValidationError::TooFewVertices { ring: 1, distinct: 2 })
        );

        let flat = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 0.0, y: 0.0 },
        ];
        assert_eq!(
            validate_ring(&flat, 0),
            Err(ValidationError::ZeroArea { ring: 0 })
        );

        assert!(validate_ring(&[], 0).is_err());
    }

    #[test]
    fn test_signed_zero_counts_once() {
        let ring = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: -0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 0.0, y: 0.0 },
        ];
        assert_eq!(
            validate_ring(&ring, 0),
            Err(ValidationError::TooFewVertices { ring: 0, distinct: 2 })
        );
    }

    #[test]
    fn test_validate_polygon() {
        let valid_poly: Polygon = polygon![
            (x: -80.0, y: 35.0),
            (x: -70.0, y: 35.0),
            (x: -70.0, y: 45.0),
            (x: -80.0, y: 45.0),
            (x: -80.0, y: 35.0),
        ];
        assert!(validate_polygon(&valid_poly).is_ok());

        let invalid_poly: Polygon = polygon![
            (x: -80.0, y: 35.0),
            (x: 999.0, y: 35.0), // Invalid longitude
            (x: -70.0, y: 45.0),
            (x: -80.0, y: 45.0),
            (x: -80.0, y: 35.0),
        ];
        let err = validate_polygon(&invalid_poly).unwrap_err();
        assert_eq!(
            err,
            ValidationError::LongitudeOutOfRange {
                location: "ring 0 vertex 1".to_string(),
                value: 999.0
            }
        );
    }

    #[test]
    fn test_validate_geometry_dispatch() {
        assert!(validate_geometry(&Geometry::point(10.0, 10.0)).is_ok());
        assert!(validate_geometry(&Geometry::rectangle(0.0, 0.0, 1.0, 1.0)).is_ok());
        assert!(validate_geometry(&Geometry::point(10.0, 100.0)).is_err());
    }
}
