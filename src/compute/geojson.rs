//! GeoJSON conversion for indexed geometries.
//!
//! Ingestion and query payloads share one entry point, [`GeometryPayload`], so
//! a record stream can carry raw strings, decoded JSON values, or `geojson`
//! geometries interchangeably.

use crate::compute::validation::{ring_from_coords, ring_location, validate_position, validate_ring};
use crate::error::{Result, ShapeIndexError, ValidationError};
use geo::{Coord, Polygon};
use geojson::{GeoJson, Value};
use spatio_shapes_types::Geometry;

/// Anything that can be turned into a validated [`Geometry`].
pub trait GeometryPayload {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError>;
}

impl GeometryPayload for &str {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        parse_geojson(self)
    }
}

impl GeometryPayload for String {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        parse_geojson(&self)
    }
}

impl GeometryPayload for &String {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        parse_geojson(self)
    }
}

impl GeometryPayload for serde_json::Value {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        parse_geojson_value(self)
    }
}

impl GeometryPayload for &serde_json::Value {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        parse_geojson_value(self.clone())
    }
}

impl GeometryPayload for geojson::Geometry {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        from_geojson_geometry(self)
    }
}

/// Already-built geometries are re-validated, never trusted.
impl GeometryPayload for Geometry {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        crate::compute::validation::validate_geometry(&self)?;
        Ok(self)
    }
}

impl GeometryPayload for &Geometry {
    fn into_geometry(self) -> std::result::Result<Geometry, ValidationError> {
        self.clone().into_geometry()
    }
}

/// Parses a GeoJSON Geometry or Feature document.
///
/// # Examples
///
/// ```
/// use spatio_shapes::geojson::parse_geojson;
///
/// let shape = parse_geojson(
///     r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-147,59],[-147,62],[-152,62]]]}"#,
/// )
/// .unwrap();
/// assert_eq!(shape.kind(), "Polygon");
///
/// // Rings must be closed
/// assert!(parse_geojson(r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1]]]}"#).is_err());
/// ```
pub fn parse_geojson(geojson: &str) -> std::result::Result<Geometry, ValidationError> {
    let parsed: GeoJson = geojson
        .parse()
        .map_err(|e| ValidationError::Malformed(format!("Failed to parse GeoJSON: {}", e)))?;
    from_geojson(parsed)
}

/// Parses an already-decoded JSON value holding a GeoJSON Geometry or
/// Feature. A JSON string is parsed as GeoJSON text.
pub fn parse_geojson_value(
    value: serde_json::Value,
) -> std::result::Result<Geometry, ValidationError> {
    if let serde_json::Value::String(text) = &value {
        return parse_geojson(text);
    }

    let parsed = GeoJson::from_json_value(value)
        .map_err(|e| ValidationError::Malformed(format!("Failed to parse GeoJSON: {}", e)))?;
    from_geojson(parsed)
}

fn from_geojson(parsed: GeoJson) -> std::result::Result<Geometry, ValidationError> {
    match parsed {
        GeoJson::Geometry(geometry) => from_geojson_geometry(geometry),
        GeoJson::Feature(feature) => match feature.geometry {
            Some(geometry) => from_geojson_geometry(geometry),
            None => Err(ValidationError::Malformed(
                "Feature has no geometry".to_string(),
            )),
        },
        GeoJson::FeatureCollection(_) => Err(ValidationError::UnsupportedGeometry(
            "FeatureCollection".to_string(),
        )),
    }
}

/// Converts a `geojson` geometry, applying every validation rule.
pub fn from_geojson_geometry(
    geometry: geojson::Geometry,
) -> std::result::Result<Geometry, ValidationError> {
    match geometry.value {
        Value::Point(position) => {
            let coord = validate_position(&position, || "point".to_string())?;
            Ok(Geometry::Point(coord.into()))
        }
        Value::Polygon(rings) => polygon_from_rings(&rings).map(Geometry::Polygon),
        other => Err(ValidationError::UnsupportedGeometry(
            value_type_name(&other).to_string(),
        )),
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> std::result::Result<Polygon, ValidationError> {
    if rings.is_empty() {
        return Err(ValidationError::EmptyPolygon);
    }

    let mut converted = Vec::with_capacity(rings.len());
    for (ring_idx, ring) in rings.iter().enumerate() {
        let coords = ring
            .iter()
            .enumerate()
            .map(|(idx, position)| validate_position(position, || ring_location(ring_idx, idx)))
            .collect::<std::result::Result<Vec<Coord>, _>>()?;
        validate_ring(&coords, ring_idx)?;
        converted.push(ring_from_coords(coords));
    }

    let exterior = converted.remove(0);
    Ok(Polygon::new(exterior, converted))
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Converts a geometry to a GeoJSON `geojson::Geometry`.
pub fn to_geojson_geometry(geometry: &Geometry) -> geojson::Geometry {
    let value = match geometry {
        Geometry::Point(point) => Value::Point(vec![point.x(), point.y()]),
        Geometry::Polygon(polygon) => {
            let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors().iter()) {
                rings.push(
                    ring.coords()
                        .map(|coord| vec![coord.x, coord.y])
                        .collect::<Vec<_>>(),
                );
            }
            Value::Polygon(rings)
        }
    };
    geojson::Geometry::new(value)
}

/// Converts a geometry to a GeoJSON string.
pub fn to_geojson(geometry: &Geometry) -> Result<String> {
    serde_json::to_string(&to_geojson_geometry(geometry)).map_err(|e| {
        ShapeIndexError::SerializationErrorWithContext(format!(
            "Failed to serialize {}: {}",
            geometry.kind(),
            e
        ))
    })
}
