#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Permit, amenity and impact report types for the mapd application.
//!
//! These types mirror the JSON shapes returned by the development-permit
//! backend. Records are deserialized leniently: coordinates are kept as
//! raw JSON and validated on access, so a single malformed record never
//! fails a whole response.

pub mod amenity;
pub mod report;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use amenity::{AmenitiesResponse, Amenity, AmenityIcon, AmenityType, KNOWN_AMENITY_TYPES};
pub use report::{
    AnalysisSummary, AnalyzedInfrastructure, HypotheticalRequest, HypotheticalResponse,
    ImpactReport, ImpactReportResponse, InputParameters,
};

/// Upper bound (exclusive) of a small project's value.
pub const SMALL_PROJECT_MAX_VALUE: f64 = 2_000_000.0;

/// Upper bound (exclusive) of a medium project's value.
pub const MEDIUM_PROJECT_MAX_VALUE: f64 = 10_000_000.0;

/// A WGS84 longitude/latitude pair.
///
/// Serialized as a two-element `[lon, lat]` array, matching `GeoJSON`
/// coordinate order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LngLat {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns the pair as a `[lon, lat]` array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        value.to_array()
    }
}

/// Validates a raw `GeoJSON` coordinate value.
///
/// Only a two-element array of numbers is accepted.
#[must_use]
pub fn parse_coordinates(value: &serde_json::Value) -> Option<LngLat> {
    match value.as_array()?.as_slice() {
        [lon, lat] => Some(LngLat::new(lon.as_f64()?, lat.as_f64()?)),
        _ => None,
    }
}

/// The `geom` wrapper the backend nests point geometries in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geom {
    /// The point geometry, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PointGeometry>,
}

impl Geom {
    /// Wraps a valid coordinate pair in a `Point` geometry.
    #[must_use]
    pub fn point(at: LngLat) -> Self {
        Self {
            geometry: Some(PointGeometry {
                kind: "Point".to_string(),
                coordinates: serde_json::json!(at.to_array()),
            }),
        }
    }

    /// Returns the validated coordinates, if any.
    #[must_use]
    pub fn coordinates(&self) -> Option<LngLat> {
        parse_coordinates(&self.geometry.as_ref()?.coordinates)
    }
}

/// A `GeoJSON` point geometry with unvalidated coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    /// Geometry type, normally `"Point"`.
    #[serde(rename = "type", default = "point_kind")]
    pub kind: String,
    /// Raw coordinate value; see [`parse_coordinates`].
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

fn point_kind() -> String {
    "Point".to_string()
}

/// A development permit.
///
/// Fetched permits come from the backend's permit endpoint. Hypothetical
/// permits are synthesized on the client and carry `hypothetical = true`
/// plus the embedded impact analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    /// Opaque permit identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Location of the development.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom: Option<Geom>,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Free-text project description.
    #[serde(default, rename = "projectdescription")]
    pub project_description: Option<String>,
    /// Declared project value in dollars.
    #[serde(default, rename = "projectvalue")]
    pub project_value: Option<f64>,
    /// Property-use categories (e.g. "Residential Uses").
    #[serde(
        default,
        rename = "propertyuse",
        deserialize_with = "null_as_default"
    )]
    pub property_use: Vec<String>,
    /// Issue date as returned by the backend.
    #[serde(default, rename = "issuedate")]
    pub issue_date: Option<String>,
    /// Whether this permit was synthesized from a hypothetical report.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hypothetical: bool,
    /// Embedded impact analysis (hypothetical permits only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_report: Option<serde_json::Value>,
}

impl Permit {
    /// Returns the validated marker coordinates.
    #[must_use]
    pub fn coordinates(&self) -> Option<LngLat> {
        self.geom.as_ref()?.coordinates()
    }

    /// Project value with a missing value treated as zero.
    #[must_use]
    pub fn value_or_zero(&self) -> f64 {
        self.project_value.unwrap_or(0.0)
    }

    /// Size class of this permit's project.
    #[must_use]
    pub fn project_size(&self) -> ProjectSize {
        ProjectSize::from_value(self.project_value)
    }
}

/// Step classification of a project by value.
///
/// Drives both the permit marker size and the sidebar size label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSize {
    /// Under $2M, or no declared value.
    Small,
    /// $2M up to $10M.
    Medium,
    /// $10M and above.
    Large,
}

impl ProjectSize {
    /// Classifies a project value; a missing value is [`Self::Small`].
    #[must_use]
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            Some(v) if v >= MEDIUM_PROJECT_MAX_VALUE => Self::Large,
            Some(v) if v >= SMALL_PROJECT_MAX_VALUE => Self::Medium,
            _ => Self::Small,
        }
    }
}

/// Response body of `GET /development-permits`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermitsResponse {
    /// Permits within the requested radius. Records that fail to
    /// deserialize are dropped individually.
    #[serde(default, deserialize_with = "skip_invalid_records")]
    pub permits: Vec<Permit>,
}

/// Query parameters shared by the permit and amenity endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    /// Center longitude.
    pub lon: f64,
    /// Center latitude.
    pub lat: f64,
    /// Search radius in kilometers.
    pub distance: f64,
}

impl LocationQuery {
    /// Builds a query around `center`.
    #[must_use]
    pub const fn around(center: LngLat, distance_km: f64) -> Self {
        Self {
            lon: center.lon,
            lat: center.lat,
            distance: distance_km,
        }
    }
}

/// Deserializes `null` as the type's default value.
///
/// # Errors
///
/// Returns the deserializer's error if the value is neither `null` nor a
/// valid `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a list record by record, dropping records that are not a
/// valid `T`. `null` yields an empty list.
///
/// # Errors
///
/// Returns the deserializer's error if the value is neither `null` nor an
/// array.
pub fn skip_invalid_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_permit() {
        let permit: Permit = serde_json::from_value(serde_json::json!({
            "_id": "68a1f0",
            "geom": { "geometry": { "type": "Point", "coordinates": [-123.1, 49.26] } },
            "address": "123 Main St",
            "projectdescription": "New 6-storey rental building",
            "projectvalue": 12500000,
            "propertyuse": ["Residential Uses"],
            "issuedate": "2024-03-05"
        }))
        .unwrap();

        assert_eq!(permit.id, "68a1f0");
        assert_eq!(permit.coordinates(), Some(LngLat::new(-123.1, 49.26)));
        assert_eq!(permit.project_size(), ProjectSize::Large);
        assert_eq!(permit.property_use, vec!["Residential Uses".to_string()]);
        assert!(!permit.hypothetical);
    }

    #[test]
    fn tolerates_null_and_missing_fields() {
        let permit: Permit = serde_json::from_value(serde_json::json!({
            "_id": "x",
            "projectvalue": null,
            "propertyuse": null
        }))
        .unwrap();

        assert!(permit.coordinates().is_none());
        assert!(permit.property_use.is_empty());
        assert!((permit.value_or_zero() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_permit_records_are_skipped_individually() {
        let response: PermitsResponse = serde_json::from_value(serde_json::json!({
            "permits": [
                { "_id": "ok", "projectvalue": 1000 },
                { "projectdescription": "missing id" },
                { "_id": "bad-value", "projectvalue": "lots" },
                { "_id": "also-ok" }
            ]
        }))
        .unwrap();

        let ids: Vec<&str> = response.permits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "also-ok"]);

        let empty: PermitsResponse =
            serde_json::from_value(serde_json::json!({ "permits": null })).unwrap();
        assert!(empty.permits.is_empty());
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(parse_coordinates(&serde_json::json!([1.0])).is_none());
        assert!(parse_coordinates(&serde_json::json!([1.0, 2.0, 3.0])).is_none());
        assert!(parse_coordinates(&serde_json::json!(["-123.1", 49.2])).is_none());
        assert!(parse_coordinates(&serde_json::json!({ "lon": 1, "lat": 2 })).is_none());
        assert_eq!(
            parse_coordinates(&serde_json::json!([-123, 49])),
            Some(LngLat::new(-123.0, 49.0))
        );
    }

    #[test]
    fn project_size_steps() {
        assert_eq!(ProjectSize::from_value(None), ProjectSize::Small);
        assert_eq!(ProjectSize::from_value(Some(1_999_999.0)), ProjectSize::Small);
        assert_eq!(ProjectSize::from_value(Some(2_000_000.0)), ProjectSize::Medium);
        assert_eq!(ProjectSize::from_value(Some(9_999_999.0)), ProjectSize::Medium);
        assert_eq!(ProjectSize::from_value(Some(10_000_000.0)), ProjectSize::Large);
        assert_eq!(ProjectSize::Large.to_string(), "Large");
    }

    #[test]
    fn hypothetical_flag_is_omitted_when_false() {
        let permit = Permit {
            id: "a".to_string(),
            geom: Some(Geom::point(LngLat::new(1.0, 2.0))),
            address: None,
            project_description: None,
            project_value: None,
            property_use: Vec::new(),
            issue_date: None,
            hypothetical: false,
            impact_report: None,
        };
        let json = serde_json::to_value(&permit).unwrap();
        assert!(json.get("hypothetical").is_none());
        assert_eq!(
            json["geom"]["geometry"]["coordinates"],
            serde_json::json!([1.0, 2.0])
        );
    }
}
