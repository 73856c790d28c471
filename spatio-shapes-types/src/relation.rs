use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spatial relation between a query geometry and an indexed document.
///
/// Relations are read from the document's point of view: `Within` selects
/// documents lying inside the query shape, `Contains` selects documents that
/// enclose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Document geometry lies entirely inside the query geometry.
    Within,
    /// Document geometry entirely encloses the query geometry.
    Contains,
    /// Document and query geometries share at least one point.
    Intersects,
    /// Document and query geometries share no point.
    Disjoint,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Within,
        Relation::Contains,
        Relation::Intersects,
        Relation::Disjoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Within => "within",
            Relation::Contains => "contains",
            Relation::Intersects => "intersects",
            Relation::Disjoint => "disjoint",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a relation name is not one of the four supported relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRelationError(pub String);

impl fmt::Display for ParseRelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown spatial relation: {}", self.0)
    }
}

impl std::error::Error for ParseRelationError {}

impl FromStr for Relation {
    type Err = ParseRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "within" => Ok(Relation::Within),
            "contains" => Ok(Relation::Contains),
            "intersects" => Ok(Relation::Intersects),
            "disjoint" => Ok(Relation::Disjoint),
            _ => Err(ParseRelationError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relation_names() {
        assert_eq!("within".parse::<Relation>(), Ok(Relation::Within));
        assert_eq!(" Intersects ".parse::<Relation>(), Ok(Relation::Intersects));
        assert!("overlaps".parse::<Relation>().is_err());

        for relation in Relation::ALL {
            assert_eq!(relation.to_string().parse::<Relation>(), Ok(relation));
        }
    }
}
