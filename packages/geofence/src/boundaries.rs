//! Static neighborhood boundary overlay.
//!
//! The overlay is a `GeoJSON` `FeatureCollection` of neighborhood
//! polygons. It is kept verbatim for the map layer and also converted to
//! [`MultiPolygon`]s so the map can resolve which neighborhood a point
//! falls in (hover labels while the overlay is shown).

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Rect};
use geojson::{FeatureCollection, GeoJson};
use mapd_permit_models::LngLat;
use thiserror::Error;

/// Default feature property holding the neighborhood name.
pub const DEFAULT_NAME_PROPERTY: &str = "name";

/// Errors from loading boundary data.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The input is not valid `GeoJSON`.
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The input parsed but is not a `FeatureCollection`.
    #[error("Boundary data must be a FeatureCollection")]
    NotACollection,
}

/// A named neighborhood polygon.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    /// Neighborhood name.
    pub name: String,
    polygon: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl Neighborhood {
    fn contains(&self, point: &Point<f64>) -> bool {
        self.bounds.is_some_and(|rect| rect.intersects(point)) && self.polygon.contains(point)
    }
}

/// The loaded neighborhood overlay.
#[derive(Debug, Clone)]
pub struct BoundaryOverlay {
    collection: FeatureCollection,
    neighborhoods: Vec<Neighborhood>,
}

impl BoundaryOverlay {
    /// Parses a `FeatureCollection` of neighborhood polygons.
    ///
    /// Features without a name in `name_property` or without a polygonal
    /// geometry are kept in the rendered collection but are not
    /// searchable.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if `geojson` is not a valid `GeoJSON`
    /// `FeatureCollection`.
    pub fn from_geojson_str(geojson: &str, name_property: &str) -> Result<Self, BoundaryError> {
        let GeoJson::FeatureCollection(collection) = geojson.parse::<GeoJson>()? else {
            return Err(BoundaryError::NotACollection);
        };

        let neighborhoods: Vec<Neighborhood> = collection
            .features
            .iter()
            .filter_map(|feature| {
                let name = feature
                    .property(name_property)
                    .and_then(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())?
                    .to_string();
                let Some(polygon) = feature.geometry.clone().and_then(to_multipolygon) else {
                    log::warn!("Boundary {name} has no polygonal geometry");
                    return None;
                };
                let bounds = polygon.bounding_rect();

                Some(Neighborhood {
                    name,
                    polygon,
                    bounds,
                })
            })
            .collect();

        log::info!(
            "Loaded {} neighborhood boundaries ({} features)",
            neighborhoods.len(),
            collection.features.len()
        );

        Ok(Self {
            collection,
            neighborhoods,
        })
    }

    /// The raw collection, for the overlay layer.
    #[must_use]
    pub const fn feature_collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Searchable neighborhoods.
    #[must_use]
    pub fn neighborhoods(&self) -> &[Neighborhood] {
        &self.neighborhoods
    }

    /// Name of the first neighborhood containing `at`.
    #[must_use]
    pub fn neighborhood_at(&self, at: LngLat) -> Option<&str> {
        let point = Point::new(at.lon, at.lat);
        self.neighborhoods
            .iter()
            .find(|n| n.contains(&point))
            .map(|n| n.name.as_str())
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str, min: (f64, f64), max: (f64, f64)) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "properties": { "name": name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [min.0, min.1], [max.0, min.1], [max.0, max.1], [min.0, max.1], [min.0, min.1]
                ]]
            }
        })
    }

    fn overlay() -> BoundaryOverlay {
        let collection = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                square("Kitsilano", (-123.18, 49.26), (-123.14, 49.28)),
                square("Fairview", (-123.14, 49.26), (-123.12, 49.27)),
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": { "type": "Point", "coordinates": [-123.0, 49.0] }
                }
            ]
        });
        BoundaryOverlay::from_geojson_str(&collection.to_string(), DEFAULT_NAME_PROPERTY).unwrap()
    }

    #[test]
    fn resolves_neighborhood_for_point() {
        let overlay = overlay();
        assert_eq!(overlay.neighborhoods().len(), 2);
        assert_eq!(overlay.feature_collection().features.len(), 3);
        assert_eq!(
            overlay.neighborhood_at(LngLat::new(-123.16, 49.27)),
            Some("Kitsilano")
        );
        assert_eq!(
            overlay.neighborhood_at(LngLat::new(-123.13, 49.265)),
            Some("Fairview")
        );
        assert_eq!(overlay.neighborhood_at(LngLat::new(-122.0, 49.27)), None);
    }

    #[test]
    fn rejects_non_collection() {
        let point = r#"{"type":"Point","coordinates":[0.0,0.0]}"#;
        assert!(matches!(
            BoundaryOverlay::from_geojson_str(point, DEFAULT_NAME_PROPERTY),
            Err(BoundaryError::NotACollection)
        ));
        assert!(matches!(
            BoundaryOverlay::from_geojson_str("not json", DEFAULT_NAME_PROPERTY),
            Err(BoundaryError::GeoJson(_))
        ));
    }
}
