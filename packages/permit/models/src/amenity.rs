//! Amenity records and the amenity type taxonomy.
//!
//! The backend groups amenities by a type tag. Each known tag maps to a
//! fixed icon and color; tags outside the known set are preserved as
//! [`AmenityType::Other`] and rendered with the fallback icon and color.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::{Geom, LngLat, null_as_default};

/// Fallback marker color for unrecognized amenity types.
pub const FALLBACK_AMENITY_COLOR: &str = "#6b7280";

/// Amenity categories returned by the amenities endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AmenityType {
    /// City parks.
    Parks,
    /// Public art installations.
    PublicArt,
    /// Community centres.
    CommunityCenters,
    /// Public libraries.
    Libraries,
    /// Cultural spaces (theatres, galleries, studios).
    CulturalSpaces,
    /// Public washrooms.
    PublicWashrooms,
    /// Rapid transit stations.
    RapidTransitStations,
    /// Schools.
    Schools,
    /// Fire halls.
    FireHalls,
    /// Any tag not in the known set.
    Other(String),
}

/// Every known amenity type, in display order.
pub const KNOWN_AMENITY_TYPES: [AmenityType; 9] = [
    AmenityType::Parks,
    AmenityType::PublicArt,
    AmenityType::CommunityCenters,
    AmenityType::Libraries,
    AmenityType::CulturalSpaces,
    AmenityType::PublicWashrooms,
    AmenityType::RapidTransitStations,
    AmenityType::Schools,
    AmenityType::FireHalls,
];

impl AmenityType {
    /// Returns the wire tag for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parks => "parks",
            Self::PublicArt => "public_art",
            Self::CommunityCenters => "community_centers",
            Self::Libraries => "libraries",
            Self::CulturalSpaces => "cultural_spaces",
            Self::PublicWashrooms => "public_washrooms",
            Self::RapidTransitStations => "rapid_transit_stations",
            Self::Schools => "schools",
            Self::FireHalls => "fire_halls",
            Self::Other(tag) => tag,
        }
    }

    /// Marker icon for this type.
    #[must_use]
    pub const fn icon(&self) -> AmenityIcon {
        match self {
            Self::Parks => AmenityIcon::Tree,
            Self::PublicArt => AmenityIcon::Palette,
            Self::CommunityCenters | Self::Other(_) => AmenityIcon::Building,
            Self::Libraries => AmenityIcon::Book,
            Self::CulturalSpaces => AmenityIcon::TheaterMasks,
            Self::PublicWashrooms => AmenityIcon::Restroom,
            Self::RapidTransitStations => AmenityIcon::Train,
            Self::Schools => AmenityIcon::School,
            Self::FireHalls => AmenityIcon::FireExtinguisher,
        }
    }

    /// Marker color (CSS hex) for this type.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Parks => "#22c55e",
            Self::PublicArt => "#8b5cf6",
            Self::CommunityCenters => "#f59e0b",
            Self::Libraries => "#3b82f6",
            Self::CulturalSpaces => "#ec4899",
            Self::PublicWashrooms | Self::Other(_) => FALLBACK_AMENITY_COLOR,
            Self::RapidTransitStations => "#ef4444",
            Self::Schools => "#10b981",
            Self::FireHalls => "#dc2626",
        }
    }

    /// Whether this tag is outside the known set.
    #[must_use]
    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }

    /// Human-readable title, e.g. `"Public Art"` for `public_art`.
    #[must_use]
    pub fn title(&self) -> String {
        title_case(self.as_str())
    }
}

impl From<&str> for AmenityType {
    fn from(tag: &str) -> Self {
        match tag {
            "parks" => Self::Parks,
            "public_art" => Self::PublicArt,
            "community_centers" => Self::CommunityCenters,
            "libraries" => Self::Libraries,
            "cultural_spaces" => Self::CulturalSpaces,
            "public_washrooms" => Self::PublicWashrooms,
            "rapid_transit_stations" => Self::RapidTransitStations,
            "schools" => Self::Schools,
            "fire_halls" => Self::FireHalls,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for AmenityType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<AmenityType> for String {
    fn from(value: AmenityType) -> Self {
        match value {
            AmenityType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AmenityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic icon identifiers the host maps onto its icon set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AmenityIcon {
    /// Parks.
    Tree,
    /// Public art.
    Palette,
    /// Community centres and the fallback.
    Building,
    /// Libraries.
    Book,
    /// Cultural spaces.
    TheaterMasks,
    /// Washrooms.
    Restroom,
    /// Transit stations.
    Train,
    /// Schools.
    School,
    /// Fire halls.
    FireExtinguisher,
}

/// Converts a snake-case tag into title case (`"fire_halls"` → `"Fire Halls"`).
#[must_use]
pub fn title_case(tag: &str) -> String {
    tag.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Attributes probed, in order, for a marker label.
const LABEL_ATTRIBUTES: [&str; 4] = ["name", "title_of_work", "school_name", "park_name"];

/// Attributes probed, in order, for the name in the detail view.
const DETAIL_NAME_ATTRIBUTES: [&str; 6] = [
    "name",
    "title_of_work",
    "school_name",
    "park_name",
    "cultural_space_name",
    "station",
];

/// A nearby point of interest.
///
/// Display attributes vary by type (`park_name`, `school_name`,
/// `title_of_work`, ...) and are kept as a free-form map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    /// Opaque amenity identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Location of the amenity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom: Option<Geom>,
    /// Remaining type-specific attributes.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Amenity {
    /// Returns the validated coordinates.
    #[must_use]
    pub fn coordinates(&self) -> Option<LngLat> {
        self.geom.as_ref()?.coordinates()
    }

    /// Returns a non-empty string or numeric attribute as text.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Marker label, falling back to the type's title.
    #[must_use]
    pub fn label(&self, amenity_type: &AmenityType) -> String {
        self.first_text(&LABEL_ATTRIBUTES)
            .unwrap_or_else(|| amenity_type.title())
    }

    /// Name shown in the detail view. Also recognizes cultural space and
    /// station names, which the marker label does not.
    #[must_use]
    pub fn display_name(&self, amenity_type: &AmenityType) -> String {
        self.first_text(&DETAIL_NAME_ATTRIBUTES)
            .unwrap_or_else(|| amenity_type.title())
    }

    fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Ordered `(label, value)` rows for the amenity detail view.
    #[must_use]
    pub fn details(&self, amenity_type: &AmenityType) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Name", self.display_name(amenity_type)),
            ("Type", amenity_type.title()),
        ];

        match amenity_type {
            AmenityType::Parks => {
                if let Some(hectares) = self.text("hectare") {
                    rows.push(("Size", format!("{hectares} hectares")));
                }
                self.push_text(&mut rows, "Neighbourhood", "neighbourhoodname");
                if let (Some(number), Some(street)) =
                    (self.text("streetnumber"), self.text("streetname"))
                {
                    rows.push(("Address", format!("{number} {street}")));
                }
            }
            AmenityType::Schools | AmenityType::FireHalls => {
                self.push_text(&mut rows, "Address", "address");
            }
            AmenityType::PublicArt => {
                self.push_text(&mut rows, "Art Type", "type");
                self.push_text(&mut rows, "Status", "status");
                self.push_text(&mut rows, "Location", "siteaddress");
            }
            AmenityType::PublicWashrooms => {
                self.push_text(&mut rows, "Location Details", "location");
                self.push_text(&mut rows, "Area", "geo_local_area");
            }
            AmenityType::CommunityCenters | AmenityType::Libraries => {
                self.push_text(&mut rows, "Address", "address");
                self.push_text(&mut rows, "Area", "geo_local_area");
            }
            AmenityType::CulturalSpaces => {
                self.push_text(&mut rows, "Primary Use", "primary_use");
                self.push_text(&mut rows, "Address", "address");
                self.push_text(&mut rows, "Area", "local_area");
                if let Some(square_feet) = self.text("square_feet") {
                    rows.push(("Size", format!("{square_feet} sq ft")));
                }
                if let Some(active) = self.text("active_space") {
                    let status = if active == "Yes" { "Active" } else { "Inactive" };
                    rows.push(("Status", status.to_string()));
                }
            }
            AmenityType::RapidTransitStations => {
                self.push_text(&mut rows, "Area", "geo_local_area");
            }
            AmenityType::Other(_) => {}
        }

        rows
    }

    fn push_text(&self, rows: &mut Vec<(&'static str, String)>, label: &'static str, key: &str) {
        if let Some(value) = self.text(key) {
            rows.push((label, value));
        }
    }
}

/// Response body of `GET /amenities`.
///
/// Each entry maps a type tag to a list of amenities. Entries are kept
/// raw so that a malformed group or record is skipped rather than failing
/// the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmenitiesResponse {
    /// Amenity lists keyed by type tag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub amenities: BTreeMap<String, serde_json::Value>,
}

impl AmenitiesResponse {
    /// Splits the response into typed groups.
    ///
    /// Non-array groups and records that fail to deserialize are dropped.
    #[must_use]
    pub fn into_groups(self) -> Vec<(AmenityType, Vec<Amenity>)> {
        self.amenities
            .into_iter()
            .filter_map(|(tag, list)| {
                let serde_json::Value::Array(items) = list else {
                    return None;
                };
                let amenities = items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect();
                Some((AmenityType::from(tag), amenities))
            })
            .collect()
    }
}
