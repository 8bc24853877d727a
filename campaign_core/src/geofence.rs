//! Turf polygons and the point-in-polygon test used to decide which voters belong to a turf.
//!
//! Coordinates are plain WGS84 degrees. The polygon is treated as planar, with the longitude
//! as `x` and the latitude as `y`, which is accurate enough at the scale of a neighborhood.
//!
//! # Points on the boundary
//!
//! A point lying exactly on an edge or on a vertex of the polygon is **inside**. This is
//! checked explicitly before the even-odd ray cast, so the answer does not depend on the
//! orientation of the polygon or on which edge the point touches.

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::config::VoterRecord;
use crate::error::*;

/// Collinearity tolerance used by the on-edge test, in squared degrees.
const EDGE_TOLERANCE: f64 = 1e-12;

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A closed polygon. The edge from the last vertex back to the first one is implied.
///
/// Serialized as a list of `[lat, lng]` pairs.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct Boundary {
    vertices: Vec<GeoPoint>,
}

impl Boundary {
    pub const MIN_VERTICES: usize = 3;

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    /// The edges of the polygon, closing edge included.
    fn edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

impl TryFrom<Vec<[f64; 2]>> for Boundary {
    type Error = CoreError;

    fn try_from(pairs: Vec<[f64; 2]>) -> Result<Self, Self::Error> {
        let points: Vec<GeoPoint> = pairs.iter().map(|p| GeoPoint::new(p[0], p[1])).collect();
        record_boundary(&points)
    }
}

impl From<Boundary> for Vec<[f64; 2]> {
    fn from(b: Boundary) -> Self {
        b.vertices.iter().map(|p| [p.lat, p.lng]).collect()
    }
}

/// Accepts the vertices traced by the user, in order.
///
/// The sequence does not need to repeat its first point at the end.
pub fn record_boundary(points: &[GeoPoint]) -> CoreResult<Boundary> {
    ensure!(
        points.len() >= Boundary::MIN_VERTICES,
        BoundarySnafu {
            count: points.len()
        }
    );
    if let Some(p) = points.iter().find(|p| !p.is_valid()) {
        return CoordinateSnafu {
            lat: p.lat,
            lng: p.lng,
        }
        .fail();
    }
    Ok(Boundary {
        vertices: points.to_vec(),
    })
}

/// Point-in-polygon test: boundary-inclusive even-odd ray casting.
pub fn contains_point(boundary: &Boundary, point: GeoPoint) -> bool {
    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    for (a, b) in boundary.edges() {
        if on_segment(a, b, point) {
            return true;
        }
        let (x1, y1, x2, y2) = (a.lng, a.lat, b.lng, b.lat);
        // Half-open rule on y: a vertex shared by two edges is counted once.
        if (y1 > y) != (y2 > y) {
            let x_cross = (x2 - x1) * (y - y1) / (y2 - y1) + x1;
            if x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> bool {
    let cross = (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng);
    if cross.abs() > EDGE_TOLERANCE {
        return false;
    }
    p.lng >= a.lng.min(b.lng) - EDGE_TOLERANCE
        && p.lng <= a.lng.max(b.lng) + EDGE_TOLERANCE
        && p.lat >= a.lat.min(b.lat) - EDGE_TOLERANCE
        && p.lat <= a.lat.max(b.lat) + EDGE_TOLERANCE
}

/// A rule deciding whether a point belongs to a turf.
pub trait Containment {
    fn contains(&self, boundary: &Boundary, point: GeoPoint) -> bool;
}

/// The default rule, [contains_point].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct RayCasting;

impl Containment for RayCasting {
    fn contains(&self, boundary: &Boundary, point: GeoPoint) -> bool {
        contains_point(boundary, point)
    }
}

/// The voters of `voters` located inside the turf, using [contains_point].
///
/// Voters without coordinates cannot be placed and are left out.
pub fn filter_voters<'a>(boundary: &Boundary, voters: &'a [VoterRecord]) -> Vec<&'a VoterRecord> {
    filter_voters_with(boundary, voters, &RayCasting)
}

/// Same as [filter_voters], with another containment rule.
pub fn filter_voters_with<'a, C>(
    boundary: &Boundary,
    voters: &'a [VoterRecord],
    rule: &C,
) -> Vec<&'a VoterRecord>
where
    C: Containment + ?Sized,
{
    let res: Vec<&VoterRecord> = voters
        .iter()
        .filter(|v| match (v.lat, v.lng) {
            (Some(lat), Some(lng)) => rule.contains(boundary, GeoPoint::new(lat, lng)),
            _ => false,
        })
        .collect();
    debug!(
        "filter_voters: {} of {} voters inside the boundary",
        res.len(),
        voters.len()
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Boundary {
        record_boundary(&[
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 10.0),
            GeoPoint::new(10.0, 10.0),
            GeoPoint::new(10.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn square_inside_outside() {
        let b = square();
        assert!(contains_point(&b, GeoPoint::new(5.0, 5.0)));
        assert!(!contains_point(&b, GeoPoint::new(15.0, 15.0)));
        assert!(!contains_point(&b, GeoPoint::new(5.0, -0.5)));
        assert!(!contains_point(&b, GeoPoint::new(-3.0, 5.0)));
    }

    #[test]
    fn edges_and_vertices_are_inside() {
        let b = square();
        assert!(contains_point(&b, GeoPoint::new(0.0, 5.0)));
        assert!(contains_point(&b, GeoPoint::new(5.0, 0.0)));
        assert!(contains_point(&b, GeoPoint::new(10.0, 5.0)));
        assert!(contains_point(&b, GeoPoint::new(5.0, 10.0)));
        assert!(contains_point(&b, GeoPoint::new(0.0, 0.0)));
        assert!(contains_point(&b, GeoPoint::new(10.0, 10.0)));
        // On the line of an edge, but past its end.
        assert!(!contains_point(&b, GeoPoint::new(0.0, 12.0)));
    }

    #[test]
    fn orientation_does_not_matter() {
        let mut pts: Vec<GeoPoint> = square().vertices().to_vec();
        pts.reverse();
        let b = record_boundary(&pts).unwrap();
        assert!(contains_point(&b, GeoPoint::new(5.0, 5.0)));
        assert!(contains_point(&b, GeoPoint::new(0.0, 5.0)));
        assert!(!contains_point(&b, GeoPoint::new(15.0, 15.0)));
    }

    #[test]
    fn concave_polygon() {
        // A "U" shape opening to the north.
        let b = record_boundary(&[
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 9.0),
            GeoPoint::new(9.0, 9.0),
            GeoPoint::new(9.0, 6.0),
            GeoPoint::new(3.0, 6.0),
            GeoPoint::new(3.0, 3.0),
            GeoPoint::new(9.0, 3.0),
            GeoPoint::new(9.0, 0.0),
        ])
        .unwrap();
        assert!(contains_point(&b, GeoPoint::new(1.0, 4.5)));
        assert!(contains_point(&b, GeoPoint::new(6.0, 1.0)));
        assert!(!contains_point(&b, GeoPoint::new(6.0, 4.5)));
    }

    #[test]
    fn ray_through_a_vertex() {
        let b = record_boundary(&[
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(5.0, 5.0),
            GeoPoint::new(0.0, 10.0),
            GeoPoint::new(10.0, 5.0),
        ])
        .unwrap();
        // The horizontal ray from (5, 1) passes through the vertex (5, 5).
        assert!(!contains_point(&b, GeoPoint::new(5.0, 1.0)));
        assert!(contains_point(&b, GeoPoint::new(7.0, 5.0)));
    }

    #[test]
    fn too_few_points() {
        assert_eq!(
            record_boundary(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]),
            Err(CoreError::Boundary { count: 2 })
        );
        assert!(matches!(
            record_boundary(&[
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(91.0, 1.0)
            ]),
            Err(CoreError::Coordinate { .. })
        ));
    }

    #[test]
    fn filtering_voters() {
        let mut inside = VoterRecord::new("Ada", "Inside");
        inside.lat = Some(2.0);
        inside.lng = Some(3.0);
        let mut outside = VoterRecord::new("Bob", "Outside");
        outside.lat = Some(20.0);
        outside.lng = Some(3.0);
        let unknown = VoterRecord::new("Cy", "Nowhere");
        let voters = vec![inside.clone(), outside, unknown];
        let res = filter_voters(&square(), &voters);
        assert_eq!(res, vec![&inside]);

        struct Everywhere;
        impl Containment for Everywhere {
            fn contains(&self, _: &Boundary, _: GeoPoint) -> bool {
                true
            }
        }
        let everything = filter_voters_with(&square(), &voters, &Everywhere);
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn boundary_serde() {
        let json = "[[0.0,0.0],[0.0,10.0],[10.0,10.0]]";
        let b: Boundary = serde_json::from_str(json).unwrap();
        assert_eq!(b.vertices().len(), 3);
        assert_eq!(serde_json::to_string(&b).unwrap(), json);
        assert!(serde_json::from_str::<Boundary>("[[0.0,0.0]]").is_err());
    }
}
