//! Exact spatial predicates between a query geometry and a document geometry.
//!
//! Geometries are closed point sets: a position lying exactly on a ring, outer
//! or hole, is covered by the polygon. Point location runs a winding-number
//! test whose edge crossings are half-open in latitude, after an exact
//! on-segment check has settled boundary positions. Orientation comes from
//! `geo`'s robust kernel, so neither test depends on rounding.
//!
//! Polygon-in-polygon tests split each edge of the inner polygon wherever it
//! meets a ring of the outer one and locate the midpoint of every piece.
//! Pieces lying along a shared edge are on the boundary by construction and
//! are not sampled. Cost is O(|outer| × |inner|) per pair.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::kernels::{Kernel, Orientation, RobustKernel};
use geo::{Coord, InteriorPoint, Line, LineString, Polygon};
use smallvec::SmallVec;
use spatio_shapes_types::{BoundingBox, Geometry, Relation};

/// Position of a coordinate relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Interior,
    Boundary,
    Exterior,
}

impl Location {
    /// Interior and boundary positions are both covered by the closed polygon.
    pub fn is_covered(self) -> bool {
        self != Location::Exterior
    }
}

/// Locates a coordinate against a polygon with holes.
///
/// # Examples
///
/// ```
/// use spatio_shapes::relation::{locate_point, Location};
/// use geo::{coord, polygon};
///
/// let square = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
/// assert_eq!(locate_point(&square, coord! { x: 1.0, y: 1.0 }), Location::Interior);
/// assert_eq!(locate_point(&square, coord! { x: 2.0, y: 1.0 }), Location::Boundary);
/// assert_eq!(locate_point(&square, coord! { x: 3.0, y: 1.0 }), Location::Exterior);
/// ```
pub fn locate_point(polygon: &Polygon, point: Coord) -> Location {
    match locate_in_ring(polygon.exterior(), point) {
        Location::Interior => {}
        other => return other,
    }

    for hole in polygon.interiors() {
        match locate_in_ring(hole, point) {
            Location::Interior => return Location::Exterior,
            Location::Boundary => return Location::Boundary,
            Location::Exterior => {}
        }
    }

    Location::Interior
}

fn locate_in_ring(ring: &LineString, point: Coord) -> Location {
    let mut winding = 0i32;

    for edge in ring.lines() {
        let (a, b) = (edge.start, edge.end);
        let orientation = RobustKernel::orient2d(a, b, point);

        if orientation == Orientation::Collinear && within_span(a, b, point) {
            return Location::Boundary;
        }

        if a.y <= point.y {
            if b.y > point.y && orientation == Orientation::CounterClockwise {
                winding += 1;
            }
        } else if b.y <= point.y && orientation == Orientation::Clockwise {
            winding -= 1;
        }
    }

    if winding == 0 {
        Location::Exterior
    } else {
        Location::Interior
    }
}

fn within_span(a: Coord, b: Coord, p: Coord) -> bool {
    a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x) && a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y)
}

fn rings(polygon: &Polygon) -> impl Iterator<Item = &LineString> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors().iter())
}

/// Where a segment meets the rings of a polygon, as parameters along it.
struct SegmentSplit {
    /// Piece boundaries in [0, 1], sorted and deduplicated.
    params: SmallVec<[f64; 8]>,
    /// Parameter ranges where the segment runs along a ring edge.
    overlaps: SmallVec<[(f64, f64); 4]>,
    /// The segment properly crosses a ring edge.
    crosses: bool,
}

impl SegmentSplit {
    fn new(segment: Line, polygon: &Polygon) -> Self {
        let mut split = SegmentSplit {
            params: SmallVec::new(),
            overlaps: SmallVec::new(),
            crosses: false,
        };
        split.params.push(0.0);
        split.params.push(1.0);

        for ring in rings(polygon) {
            for edge in ring.lines() {
                match line_intersection(segment, edge) {
                    Some(LineIntersection::SinglePoint {
                        intersection,
                        is_proper,
                    }) => {
                        split.crosses |= is_proper;
                        split.params.push(param_along(segment, intersection));
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        let t0 = param_along(segment, intersection.start);
                        let t1 = param_along(segment, intersection.end);
                        split.params.push(t0);
                        split.params.push(t1);
                        split.overlaps.push((t0.min(t1), t0.max(t1)));
                    }
                    None => {}
                }
            }
        }

        split.params.sort_by(|a, b| a.total_cmp(b));
        split.params.dedup();
        split
    }

    /// Midpoints of the pieces that do not run along a ring edge.
    fn sample_points(&self, segment: Line) -> impl Iterator<Item = Coord> + '_ {
        self.params
            .windows(2)
            .filter(|pair| {
                !self
                    .overlaps
                    .iter()
                    .any(|&(lo, hi)| lo <= pair[0] && pair[1] <= hi)
            })
            .map(move |pair| point_at(segment, (pair[0] + pair[1]) / 2.0))
    }
}

fn param_along(segment: Line, point: Coord) -> f64 {
    let delta = segment.delta();
    let t = if delta.x.abs() >= delta.y.abs() {
        (point.x - segment.start.x) / delta.x
    } else {
        (point.y - segment.start.y) / delta.y
    };
    t.clamp(0.0, 1.0)
}

fn point_at(segment: Line, t: f64) -> Coord {
    let delta = segment.delta();
    Coord {
        x: segment.start.x + delta.x * t,
        y: segment.start.y + delta.y * t,
    }
}

/// Whether the closed segment lies inside the closed polygon.
fn segment_covered(segment: Line, outer: &Polygon) -> bool {
    if !locate_point(outer, segment.start).is_covered()
        || !locate_point(outer, segment.end).is_covered()
    {
        return false;
    }
    if segment.start == segment.end {
        return true;
    }

    let split = SegmentSplit::new(segment, outer);
    if split.crosses {
        return false;
    }

    split
        .sample_points(segment)
        .all(|p| locate_point(outer, p).is_covered())
}

/// Whether some part of the segment passes through the polygon's interior.
fn segment_enters_interior(segment: Line, polygon: &Polygon) -> bool {
    if segment.start == segment.end {
        return locate_point(polygon, segment.start) == Location::Interior;
    }

    let split = SegmentSplit::new(segment, polygon);
    if split.crosses {
        return true;
    }

    let endpoints_inside = locate_point(polygon, segment.start) == Location::Interior
        || locate_point(polygon, segment.end) == Location::Interior;

    endpoints_inside
        || split
            .sample_points(segment)
            .any(|p| locate_point(polygon, p) == Location::Interior)
}

/// Whether `inner` lies entirely inside the closed polygon `outer`.
///
/// Three conditions: the outer ring of `inner` stays inside `outer`, no hole of
/// `outer` reaches into the interior of `inner`, and an interior point of
/// `inner` is covered (which rules out `inner` filling a hole exactly).
pub fn polygon_covers(outer: &Polygon, inner: &Polygon) -> bool {
    if !inner
        .exterior()
        .lines()
        .all(|segment| segment_covered(segment, outer))
    {
        return false;
    }

    for hole in outer.interiors() {
        if hole
            .lines()
            .any(|segment| segment_enters_interior(segment, inner))
        {
            return false;
        }
    }

    match inner.interior_point() {
        Some(point) => locate_point(outer, point.0).is_covered(),
        None => true,
    }
}

/// Whether two closed polygons share at least one point.
pub fn polygons_intersect(a: &Polygon, b: &Polygon) -> bool {
    for ring_a in rings(a) {
        for edge_a in ring_a.lines() {
            for ring_b in rings(b) {
                if ring_b
                    .lines()
                    .any(|edge_b| line_intersection(edge_a, edge_b).is_some())
                {
                    return true;
                }
            }
        }
    }

    // No boundary contact: either one polygon sits inside the other, or they
    // are apart (possibly one inside the other's hole).
    let a_in_b = a
        .exterior()
        .0
        .first()
        .is_some_and(|c| locate_point(b, *c).is_covered());
    let b_in_a = b
        .exterior()
        .0
        .first()
        .is_some_and(|c| locate_point(a, *c).is_covered());

    a_in_b || b_in_a
}

/// Whether `item` lies entirely inside `container`.
pub fn covers(container: &Geometry, item: &Geometry) -> bool {
    match (container, item) {
        (Geometry::Point(c), Geometry::Point(p)) => c == p,
        // A valid polygon has non-zero area
        (Geometry::Point(_), Geometry::Polygon(_)) => false,
        (Geometry::Polygon(poly), Geometry::Point(p)) => locate_point(poly, p.0).is_covered(),
        (Geometry::Polygon(outer), Geometry::Polygon(inner)) => polygon_covers(outer, inner),
    }
}

/// Whether two geometries share at least one point.
pub fn intersects(a: &Geometry, b: &Geometry) -> bool {
    match (a, b) {
        (Geometry::Point(p), Geometry::Point(q)) => p == q,
        (Geometry::Point(p), Geometry::Polygon(poly))
        | (Geometry::Polygon(poly), Geometry::Point(p)) => locate_point(poly, p.0).is_covered(),
        (Geometry::Polygon(a), Geometry::Polygon(b)) => polygons_intersect(a, b),
    }
}

/// Evaluates `relation` with the document geometry `candidate` as subject:
/// `Within` means the candidate lies inside the query.
pub fn evaluate(relation: Relation, query: &Geometry, candidate: &Geometry) -> bool {
    match relation {
        Relation::Within => covers(query, candidate),
        Relation::Contains => covers(candidate, query),
        Relation::Intersects => intersects(query, candidate),
        Relation::Disjoint => !intersects(query, candidate),
    }
}

/// Query geometry with its bounding box and shape class computed once, so
/// that each candidate can be rejected or accepted on boxes alone when the
/// answer is already decided.
#[derive(Debug, Clone)]
pub struct PreparedQuery<'a> {
    geometry: &'a Geometry,
    bbox: BoundingBox,
    rectangle: Option<BoundingBox>,
}

impl<'a> PreparedQuery<'a> {
    /// Returns `None` for a polygon with an empty outer ring.
    pub fn new(geometry: &'a Geometry) -> Option<Self> {
        let bbox = geometry.bounding_box()?;
        let rectangle = geometry.as_polygon().and_then(as_rectangle);
        Some(Self {
            geometry,
            bbox,
            rectangle,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        self.geometry
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Whether the query is an axis-aligned rectangle without holes.
    pub fn is_rectangle(&self) -> bool {
        self.rectangle.is_some()
    }

    /// Same answer as [`evaluate`], using the candidate's precomputed box.
    pub fn relate(
        &self,
        relation: Relation,
        candidate: &Geometry,
        candidate_bbox: &BoundingBox,
    ) -> bool {
        match relation {
            Relation::Within => {
                if !self.bbox.contains(candidate_bbox) {
                    return false;
                }
                // Box containment is exact for a rectangular query
                self.rectangle.is_some() || covers(self.geometry, candidate)
            }
            Relation::Contains => {
                candidate_bbox.contains(&self.bbox) && covers(candidate, self.geometry)
            }
            Relation::Intersects => self.intersects(candidate, candidate_bbox),
            Relation::Disjoint => !self.intersects(candidate, candidate_bbox),
        }
    }

    fn intersects(&self, candidate: &Geometry, candidate_bbox: &BoundingBox) -> bool {
        if !self.bbox.intersects(candidate_bbox) {
            return false;
        }
        if let Some(rect) = &self.rectangle
            && rect.contains(candidate_bbox)
        {
            return true;
        }
        intersects(self.geometry, candidate)
    }
}

/// The polygon's box, when the polygon is exactly that axis-aligned box.
fn as_rectangle(polygon: &Polygon) -> Option<BoundingBox> {
    if !polygon.interiors().is_empty() {
        return None;
    }

    let coords = &polygon.exterior().0;
    if coords.len() != 5 {
        return None;
    }

    let bbox = BoundingBox::from_coords(coords.iter().copied())?;
    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return None;
    }

    let corners = &coords[..4];
    let on_corner = corners.iter().all(|c| {
        (c.x == bbox.min_lon || c.x == bbox.max_lon) && (c.y == bbox.min_lat || c.y == bbox.max_lat)
    });
    let distinct = (0..4).all(|i| (i + 1..4).all(|j| corners[i] != corners[j]));
    let axis_aligned = coords.windows(2).all(|w| w[0].x == w[1].x || w[0].y == w[1].y);

    (on_corner && distinct && axis_aligned).then_some(bbox)
}
