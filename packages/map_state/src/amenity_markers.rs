//! Amenity markers around the current development zone.
//!
//! A refresh is split in two so the host's event loop can interleave other
//! events while the request is in flight:
//!
//! 1. [`AmenityMarkers::begin_refresh`] synchronously unmounts every marker
//!    and hands out a ticket stamped with a new generation.
//! 2. [`AmenityMarkers::apply`] mounts the response, but only if the ticket
//!    is still the latest one. Results for superseded tickets are dropped,
//!    so a slow response for an earlier permit can never overwrite the
//!    markers of a later one.
//!
//! A failed fetch leaves the map with no amenity markers; the previous
//! set is not restored.

use mapd_api::{ApiError, PermitBackend};
use mapd_permit_models::{
    AmenitiesResponse, Amenity, AmenityIcon, AmenityType, LngLat, LocationQuery,
};
use serde::Serialize;

use crate::marker_set::MarkerSet;

/// Search radius for amenities around a development.
pub const AMENITIES_RADIUS_KM: f64 = 0.5;

/// A mounted amenity marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmenityMarker {
    /// The amenity record.
    pub amenity: Amenity,
    /// Group the amenity was returned under.
    pub amenity_type: AmenityType,
    /// Marker position.
    pub position: LngLat,
    /// Icon for the amenity type.
    pub icon: AmenityIcon,
    /// Marker color for the amenity type.
    pub color: &'static str,
    /// Tooltip label.
    pub label: String,
}

impl AmenityMarker {
    /// Builds a marker, or `None` if the amenity has no valid coordinates.
    #[must_use]
    pub fn new(amenity: Amenity, amenity_type: AmenityType) -> Option<Self> {
        let position = amenity.coordinates()?;
        Some(Self {
            icon: amenity_type.icon(),
            color: amenity_type.color(),
            label: amenity.label(&amenity_type),
            position,
            amenity,
            amenity_type,
        })
    }

    /// Whether this marker is the amenity `id` of `amenity_type`.
    #[must_use]
    pub fn matches(&self, amenity_type: &AmenityType, id: &str) -> bool {
        &self.amenity_type == amenity_type && self.amenity.id == id
    }

    /// Detail rows for the amenity modal.
    #[must_use]
    pub fn details(&self) -> Vec<(&'static str, String)> {
        self.amenity.details(&self.amenity_type)
    }
}

/// Ticket for one in-flight amenity fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmenityRequest {
    generation: u64,
    center: LngLat,
}

impl AmenityRequest {
    /// Generation stamp of the refresh that issued this ticket.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Center of the search.
    #[must_use]
    pub const fn center(&self) -> LngLat {
        self.center
    }

    /// Query parameters for the amenities endpoint.
    #[must_use]
    pub const fn query(&self) -> LocationQuery {
        LocationQuery::around(self.center, AMENITIES_RADIUS_KM)
    }
}

/// What [`AmenityMarkers::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response was current; this many markers are mounted.
    Mounted(usize),
    /// A newer refresh or a clear superseded the ticket.
    Stale,
    /// The fetch failed; no markers are mounted.
    Failed,
}

/// Owner of the mounted amenity markers.
#[derive(Debug, Clone, Default)]
pub struct AmenityMarkers {
    markers: MarkerSet<AmenityMarker>,
    generation: u64,
}

impl AmenityMarkers {
    /// Unmounts every marker and starts a new refresh around `center`.
    pub fn begin_refresh(&mut self, center: LngLat) -> AmenityRequest {
        self.markers.clear();
        self.generation += 1;
        log::debug!(
            "Amenity refresh #{} around [{}, {}]",
            self.generation,
            center.lon,
            center.lat
        );
        AmenityRequest {
            generation: self.generation,
            center,
        }
    }

    /// Unmounts every marker and invalidates any in-flight refresh.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.generation += 1;
    }

    /// Whether `request` is the latest refresh.
    #[must_use]
    pub const fn is_current(&self, request: &AmenityRequest) -> bool {
        request.generation == self.generation
    }

    /// Mounts the result of `request` if it is still current.
    pub fn apply(
        &mut self,
        request: &AmenityRequest,
        result: Result<AmenitiesResponse, ApiError>,
    ) -> ApplyOutcome {
        if !self.is_current(request) {
            log::debug!(
                "Discarding amenity response #{} (latest is #{})",
                request.generation,
                self.generation
            );
            return ApplyOutcome::Stale;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log::error!("Error fetching amenities: {e}");
                self.markers.clear();
                return ApplyOutcome::Failed;
            }
        };

        let markers: Vec<AmenityMarker> = response
            .into_groups()
            .into_iter()
            .flat_map(|(amenity_type, amenities)| {
                amenities.into_iter().filter_map(move |amenity| {
                    let id = amenity.id.clone();
                    let marker = AmenityMarker::new(amenity, amenity_type.clone());
                    if marker.is_none() {
                        log::trace!("Skipping {amenity_type} amenity {id} without coordinates");
                    }
                    marker
                })
            })
            .collect();

        self.markers.clear();
        self.markers.add_all(markers);
        log::info!("Mounted {} amenity markers", self.markers.len());
        ApplyOutcome::Mounted(self.markers.len())
    }

    /// Clears, fetches and applies in one step.
    pub async fn refresh<B: PermitBackend + ?Sized>(
        &mut self,
        backend: &B,
        center: LngLat,
    ) -> ApplyOutcome {
        let request = self.begin_refresh(center);
        let result = backend.amenities(request.query()).await;
        self.apply(&request, result)
    }

    /// The mounted markers.
    #[must_use]
    pub fn current(&self) -> &[AmenityMarker] {
        self.markers.current()
    }

    /// Looks up a mounted marker by type and id.
    #[must_use]
    pub fn find(&self, amenity_type: &AmenityType, id: &str) -> Option<&AmenityMarker> {
        self.current().iter().find(|m| m.matches(amenity_type, id))
    }
}
