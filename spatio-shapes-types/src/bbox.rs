use geo::{LineString, Polygon, Rect, coord};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// An axis-aligned bounding box in longitude/latitude space.
///
/// Follows the GeoJSON convention for boxes crossing the antimeridian: when
/// `min_lon > max_lon` the box runs east from `min_lon` to 180, then on from
/// -180 to `max_lon`. Use [`BoundingBox::split_antimeridian`] to obtain plain
/// boxes before doing arithmetic on such a box.
///
/// # Examples
///
/// ```
/// use spatio_shapes_types::BoundingBox;
///
/// let pacific = BoundingBox::new(170.0, -10.0, -170.0, 10.0);
/// assert!(pacific.crosses_antimeridian());
/// assert_eq!(pacific.split_antimeridian().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Degenerate box covering a single position.
    pub fn from_point(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, lon, lat)
    }

    /// Create a bounding box from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Smallest box enclosing every coordinate, or `None` for an empty input.
    pub fn from_coords<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = geo::Coord>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_point(first.x, first.y);
        for c in iter {
            bbox.min_lon = bbox.min_lon.min(c.x);
            bbox.min_lat = bbox.min_lat.min(c.y);
            bbox.max_lon = bbox.max_lon.max(c.x);
            bbox.max_lat = bbox.max_lat.max(c.y);
        }
        Some(bbox)
    }

    /// Whether this box wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// Split into one or two boxes that do not cross the antimeridian.
    pub fn split_antimeridian(&self) -> SmallVec<[BoundingBox; 2]> {
        if self.crosses_antimeridian() {
            smallvec![
                Self::new(self.min_lon, self.min_lat, 180.0, self.max_lat),
                Self::new(-180.0, self.min_lat, self.max_lon, self.max_lat),
            ]
        } else {
            smallvec![*self]
        }
    }

    /// Width in degrees of longitude, accounting for antimeridian wrapping.
    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            (180.0 - self.min_lon) + (self.max_lon + 180.0)
        } else {
            self.max_lon - self.min_lon
        }
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Closed-interval overlap test. Boxes that only touch along an edge or
    /// at a corner intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.split_antimeridian().iter().any(|a| {
            other.split_antimeridian().iter().any(|b| {
                a.min_lon <= b.max_lon
                    && b.min_lon <= a.max_lon
                    && a.min_lat <= b.max_lat
                    && b.min_lat <= a.max_lat
            })
        })
    }

    /// Whether `other` lies inside this box (edges included).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        let outer = self.split_antimeridian();
        other.split_antimeridian().iter().all(|b| {
            outer.iter().any(|a| {
                a.min_lon <= b.min_lon
                    && b.max_lon <= a.max_lon
                    && a.min_lat <= b.min_lat
                    && b.max_lat <= a.max_lat
            })
        })
    }

    /// Whether the position lies inside this box (edges included).
    pub fn contains_coord(&self, lon: f64, lat: f64) -> bool {
        self.contains(&Self::from_point(lon, lat))
    }

    /// Convert a non-wrapping box to a `geo::Rect`.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        )
    }

    /// Counter-clockwise closed rectangle polygon for a non-wrapping box.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(
            LineString::from(vec![
                coord! { x: self.min_lon, y: self.min_lat },
                coord! { x: self.max_lon, y: self.min_lat },
                coord! { x: self.max_lon, y: self.max_lat },
                coord! { x: self.min_lon, y: self.max_lat },
                coord! { x: self.min_lon, y: self.min_lat },
            ]),
            vec![],
        )
    }
}
