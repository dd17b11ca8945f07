#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map state synchronization for the mapd development-permit map.
//!
//! The host (a map widget plus sidebar) forwards user events to a
//! [`MapController`] and re-renders from its derived views: permit
//! markers, amenity markers, the development zone polygon, boundary
//! visibility and the selection. Every mutation goes through `&mut self`
//! on a single owner, so no locking is involved.
//!
//! Network work is expressed as [`MapEvent::AmenitiesRequested`] tickets
//! the host fulfils with any [`mapd_api::PermitBackend`]; [`MapSession`]
//! does this directly for async hosts.

pub mod amenity_markers;
pub mod controller;
pub mod display;
pub mod hypothetical;
pub mod listing;
pub mod marker_set;
pub mod permit_markers;
pub mod pin_drop;
pub mod selection;
pub mod session;

#[cfg(test)]
mod test_support;

use mapd_permit_models::{AmenityType, LngLat, LocationQuery};
use serde::Serialize;

pub use amenity_markers::{
    AMENITIES_RADIUS_KM, AmenityMarker, AmenityMarkers, AmenityRequest, ApplyOutcome,
};
pub use controller::MapController;
pub use display::{DisplayCap, DisplayMode};
pub use hypothetical::{HypotheticalDialog, HypotheticalError, HypotheticalForm, synthesize_permit};
pub use pin_drop::{Cursor, PinDrop, PinDropState};
pub use selection::Selection;
pub use session::{MapSession, PermitReport};

/// Initial map center.
pub const CITY_CENTER: LngLat = LngLat::new(-123.1393, 49.2458);

/// Initial map zoom.
pub const DEFAULT_ZOOM: f64 = 12.3;

/// Zoom used when flying to a selected permit.
pub const PERMIT_ZOOM: f64 = 16.0;

/// Query for the initial permit set.
pub const DEFAULT_PERMITS_QUERY: LocationQuery = LocationQuery {
    lon: -123.155_25,
    lat: 49.249_783,
    distance: 18.0,
};

/// Where the map camera should be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraTarget {
    pub center: LngLat,
    pub zoom: f64,
}

impl Default for CameraTarget {
    fn default() -> Self {
        Self {
            center: CITY_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Side effects the host must carry out after a controller call.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A permit became the selection; the host opens its detail panel.
    PermitSelected(String),
    /// Animate the camera.
    FlyTo(CameraTarget),
    /// Fetch amenities for the ticket and hand the result to
    /// [`MapController::apply_amenities`].
    AmenitiesRequested(AmenityRequest),
    /// An amenity marker was clicked; its modal is open.
    AmenitySelected {
        amenity_type: AmenityType,
        id: String,
    },
}
