use crate::bbox::BoundingBox;
use geo::{Point, Polygon};
use serde::{Deserialize, Serialize};

/// Shape attached to an indexed document.
///
/// Polygons carry their outer ring first and holes after it, following the
/// `geo::Polygon` layout. Coordinates are `(longitude, latitude)`.
///
/// # Examples
///
/// ```
/// use spatio_shapes_types::Geometry;
///
/// let depot = Geometry::point(-149.9, 61.2);
/// assert_eq!(depot.kind(), "Point");
/// assert_eq!(depot.vertex_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
}

impl Geometry {
    /// A point at the given longitude and latitude.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point(Point::new(lon, lat))
    }

    /// Axis-aligned rectangle polygon spanning the given corners.
    pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Geometry::Polygon(BoundingBox::new(min_lon, min_lat, max_lon, max_lat).to_polygon())
    }

    /// GeoJSON type name of this geometry.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Polygon(_) => "Polygon",
        }
    }

    pub fn as_point(&self) -> Option<&Point<f64>> {
        match self {
            Geometry::Point(p) => Some(p),
            Geometry::Polygon(_) => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon<f64>> {
        match self {
            Geometry::Polygon(p) => Some(p),
            Geometry::Point(_) => None,
        }
    }

    /// Bounding box of the geometry. Holes lie inside the outer ring, so only
    /// the outer ring contributes. Returns `None` for a polygon with an empty
    /// outer ring.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Point(p) => Some(BoundingBox::from_point(p.x(), p.y())),
            Geometry::Polygon(poly) => BoundingBox::from_coords(poly.exterior().coords().copied()),
        }
    }

    /// Total number of stored coordinates, closing vertices included.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::Polygon(poly) => {
                poly.exterior().0.len()
                    + poly.interiors().iter().map(|r| r.0.len()).sum::<usize>()
            }
        }
    }

    /// Approximate in-memory footprint in bytes, used for byte-weighted batching.
    pub fn weight(&self) -> usize {
        let ring_overhead = match self {
            Geometry::Point(_) => 0,
            Geometry::Polygon(poly) => {
                (1 + poly.interiors().len()) * std::mem::size_of::<geo::LineString<f64>>()
            }
        };
        std::mem::size_of::<Geometry>()
            + ring_overhead
            + self.vertex_count() * std::mem::size_of::<geo::Coord<f64>>()
    }
}

impl From<Point<f64>> for Geometry {
    fn from(point: Point<f64>) -> Self {
        Geometry::Point(point)
    }
}

impl From<Polygon<f64>> for Geometry {
    fn from(polygon: Polygon<f64>) -> Self {
        Geometry::Polygon(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, coord};

    #[test]
    fn test_polygon_bounding_box_ignores_holes() {
        let outer = LineString::from(vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 10.0, y: 0.0 },
            coord! { x: 10.0, y: 8.0 },
            coord! { x: 0.0, y: 8.0 },
            coord! { x: 0.0, y: 0.0 },
        ]);
        let hole = LineString::from(vec![
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 4.0, y: 2.0 },
            coord! { x: 4.0, y: 4.0 },
            coord! { x: 2.0, y: 2.0 },
        ]);
        let shape = Geometry::Polygon(Polygon::new(outer, vec![hole]));

        assert_eq!(
            shape.bounding_box(),
            Some(BoundingBox::new(0.0, 0.0, 10.0, 8.0))
        );
        assert_eq!(shape.vertex_count(), 9);
    }

    #[test]
    fn test_weight_grows_with_vertices() {
        let point = Geometry::point(1.0, 2.0);
        let square = Geometry::rectangle(0.0, 0.0, 1.0, 1.0);

        assert!(square.weight() > point.weight());
        assert_eq!(square.kind(), "Polygon");
        assert!(square.as_polygon().is_some());
        assert!(square.as_point().is_none());
    }
}
