#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Development-zone polygons and neighborhood boundary lookups.
//!
//! [`compute_zone`] approximates a circle of a given radius around a point
//! with a closed 64-segment polygon, using great-circle destinations on a
//! spherical Earth. [`zone_feature_collection`] wraps the result for the
//! map's zone layer and yields an empty collection when nothing is
//! selected. The [`boundaries`] module holds the static neighborhood
//! overlay.

pub mod boundaries;

use geo::{Destination, Haversine, LineString, Point, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use mapd_permit_models::LngLat;

/// Radius of the development zone drawn around a selected location.
pub const DEVELOPMENT_ZONE_RADIUS_KM: f64 = 0.5;

/// Number of segments used to approximate the zone circle.
pub const ZONE_STEPS: usize = 64;

/// Computes the point reached by travelling `distance_km` from `origin`
/// along the initial `bearing_deg` (clockwise from north), on a sphere of
/// mean Earth radius.
#[must_use]
pub fn destination(origin: LngLat, distance_km: f64, bearing_deg: f64) -> LngLat {
    let reached = Haversine.destination(
        Point::new(origin.lon, origin.lat),
        bearing_deg,
        distance_km * 1_000.0,
    );
    LngLat::new(reached.x(), reached.y())
}

/// Computes a closed polygon approximating a circle around `center`.
///
/// Vertices step counter-clockwise from due north in [`ZONE_STEPS`]
/// increments; the first vertex is repeated to close the ring. The
/// result depends only on the inputs.
///
/// `radius_km` must be positive.
#[must_use]
pub fn compute_zone(center: LngLat, radius_km: f64) -> Polygon<f64> {
    debug_assert!(radius_km > 0.0, "zone radius must be positive");

    #[allow(clippy::cast_precision_loss)]
    let mut ring: Vec<(f64, f64)> = (0..ZONE_STEPS)
        .map(|step| {
            let bearing = (step as f64 * -360.0) / ZONE_STEPS as f64;
            let vertex = destination(center, radius_km, bearing);
            (vertex.lon, vertex.lat)
        })
        .collect();
    ring.push(ring[0]);

    Polygon::new(LineString::from(ring), vec![])
}

/// Builds the zone layer's data for an optional center.
///
/// Returns a collection with one polygon feature when `center` is set and
/// an empty collection otherwise.
#[must_use]
pub fn zone_feature_collection(center: Option<LngLat>, radius_km: f64) -> FeatureCollection {
    let features = center
        .map(|center| {
            let polygon = compute_zone(center, radius_km);
            let mut properties = JsonObject::new();
            properties.insert("radius_km".to_string(), serde_json::json!(radius_km));
            properties.insert("center".to_string(), serde_json::json!(center.to_array()));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&polygon))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .into_iter()
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
