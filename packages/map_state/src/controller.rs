//! The map controller.
//!
//! [`MapController`] owns the permit working set and every piece of view
//! state derived from it. Host events go in through its methods; side
//! effects come back out as [`MapEvent`]s. Permit markers are re-rendered
//! after every change to the permits, the selection, the display cap or the
//! display mode.

use geo::Polygon;
use geojson::FeatureCollection;
use mapd_api::ApiError;
use mapd_geofence::boundaries::BoundaryOverlay;
use mapd_geofence::{DEVELOPMENT_ZONE_RADIUS_KM, compute_zone, zone_feature_collection};
use mapd_permit_models::{AmenitiesResponse, AmenityType, LngLat, Permit};

use crate::amenity_markers::{AmenityMarker, AmenityMarkers, AmenityRequest, ApplyOutcome};
use crate::display::{DisplayCap, DisplayMode};
use crate::permit_markers::{PermitMarker, PermitMarkers};
use crate::pin_drop::{Cursor, PinDrop, PinDropState};
use crate::selection::Selection;
use crate::{CameraTarget, MapEvent, PERMIT_ZOOM};

/// Single owner of the map's state.
#[derive(Debug, Clone, Default)]
pub struct MapController {
    permits: Vec<Permit>,
    selection: Selection,
    display_mode: DisplayMode,
    display_cap: DisplayCap,
    pin_drop: PinDrop,
    permit_markers: PermitMarkers,
    amenity_markers: AmenityMarkers,
    selected_amenity: Option<AmenityMarker>,
    camera: CameraTarget,
    boundaries: Option<BoundaryOverlay>,
}

impl MapController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the neighborhood overlay.
    #[must_use]
    pub fn with_boundaries(mut self, boundaries: BoundaryOverlay) -> Self {
        self.boundaries = Some(boundaries);
        self
    }

    // Permits

    /// The working permit set.
    #[must_use]
    pub fn permits(&self) -> &[Permit] {
        &self.permits
    }

    /// Looks up a permit in the working set.
    #[must_use]
    pub fn permit(&self, id: &str) -> Option<&Permit> {
        self.permits.iter().find(|p| p.id == id)
    }

    /// Replaces the working set.
    pub fn set_permits(&mut self, permits: Vec<Permit>) {
        log::info!("Loaded {} permits", permits.len());
        self.permits = permits;
        self.sync_permit_markers();
    }

    /// Adds a permit, replacing any permit with the same id.
    pub fn insert_permit(&mut self, permit: Permit) {
        match self.permits.iter_mut().find(|p| p.id == permit.id) {
            Some(existing) => *existing = permit,
            None => self.permits.push(permit),
        }
        self.sync_permit_markers();
    }

    /// The mounted permit markers.
    #[must_use]
    pub fn permit_markers(&self) -> &[PermitMarker] {
        self.permit_markers.current()
    }

    // Display

    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.display_mode != mode {
            self.display_mode = mode;
            self.sync_permit_markers();
        }
    }

    /// Switches between permits and the boundary overlay.
    pub fn toggle_boundaries(&mut self) -> DisplayMode {
        self.set_display_mode(self.display_mode.toggled());
        self.display_mode
    }

    #[must_use]
    pub const fn display_cap(&self) -> DisplayCap {
        self.display_cap
    }

    pub fn set_display_cap(&mut self, cap: DisplayCap) {
        if self.display_cap != cap {
            self.display_cap = cap;
            self.sync_permit_markers();
        }
    }

    /// The boundary overlay's features, while boundaries are shown.
    #[must_use]
    pub fn boundary_features(&self) -> Option<&FeatureCollection> {
        self.visible_boundaries()
            .map(BoundaryOverlay::feature_collection)
    }

    /// Neighborhood under `at`, while boundaries are shown.
    #[must_use]
    pub fn neighborhood_at(&self, at: LngLat) -> Option<&str> {
        self.visible_boundaries()?.neighborhood_at(at)
    }

    fn visible_boundaries(&self) -> Option<&BoundaryOverlay> {
        self.boundaries
            .as_ref()
            .filter(|_| self.display_mode.shows_boundaries())
    }

    // Selection

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The selected permit, if it is in the working set.
    #[must_use]
    pub fn selected_permit(&self) -> Option<&Permit> {
        self.permit(self.selection.selected()?)
    }

    /// Last camera target requested.
    #[must_use]
    pub const fn camera(&self) -> CameraTarget {
        self.camera
    }

    /// Handles a click on a permit marker.
    ///
    /// Clicking the marker whose info card is open closes the card and
    /// keeps the selection. Otherwise the card opens, and if the permit is
    /// not already selected it becomes the selection: the camera flies to
    /// it and an amenity refresh starts.
    pub fn click_permit(&mut self, id: &str) -> Vec<MapEvent> {
        if self.selection.is_info_card_open(id) {
            self.close_info_card();
            return Vec::new();
        }
        let Some(position) = self.permit(id).and_then(Permit::coordinates) else {
            log::debug!("Ignoring click on unknown or unplaced permit {id}");
            return Vec::new();
        };

        self.selection.open_info_card(id);
        let mut events = Vec::new();
        if self.selection.select(id) {
            events.push(MapEvent::PermitSelected(id.to_string()));
            events.extend(self.focus_on(id, position));
        }
        self.sync_permit_markers();
        events
    }

    /// Collapses the open info card; the selection is kept.
    pub fn close_info_card(&mut self) {
        self.selection.close_info_card();
        self.sync_permit_markers();
    }

    /// Applies a selection made outside the map, e.g. in the sidebar.
    ///
    /// `Some(id)` opens the permit's info card, flies to it and refreshes
    /// amenities; the host already knows about the selection, so no
    /// [`MapEvent::PermitSelected`] is emitted. `None` clears the
    /// selection, the info card and the amenity markers.
    pub fn select_from_sidebar(&mut self, id: Option<&str>) -> Vec<MapEvent> {
        let Some(id) = id else {
            self.selection.clear();
            self.clear_amenities();
            self.sync_permit_markers();
            return Vec::new();
        };
        let Some(position) = self.permit(id).and_then(Permit::coordinates) else {
            log::debug!("Ignoring sidebar selection of unknown or unplaced permit {id}");
            return Vec::new();
        };

        self.selection.focus(id);
        let events = self.focus_on(id, position);
        self.sync_permit_markers();
        events
    }

    /// Adds a synthesized hypothetical permit and selects it.
    ///
    /// The pin it was generated from is removed; the permit's own marker
    /// takes its place.
    pub fn accept_hypothetical(&mut self, permit: Permit) -> Vec<MapEvent> {
        let id = permit.id.clone();
        self.pin_drop.clear();
        self.insert_permit(permit);

        let Some(position) = self.permit(&id).and_then(Permit::coordinates) else {
            log::warn!("Hypothetical permit {id} has no coordinates");
            return Vec::new();
        };
        self.selection.focus(&id);
        let mut events = vec![MapEvent::PermitSelected(id.clone())];
        events.extend(self.focus_on(&id, position));
        self.sync_permit_markers();
        events
    }

    /// Camera and amenity side effects of a new selection.
    fn focus_on(&mut self, id: &str, position: LngLat) -> Vec<MapEvent> {
        let hypothetical = self.permit(id).is_some_and(|p| p.hypothetical);
        if !hypothetical && matches!(self.pin_drop.state(), PinDropState::Pinned(_)) {
            log::debug!("Selecting permit {id} replaces the pinned location");
            self.pin_drop.clear();
        }

        self.camera = CameraTarget {
            center: position,
            zoom: PERMIT_ZOOM,
        };
        self.selected_amenity = None;
        let request = self.amenity_markers.begin_refresh(position);

        vec![
            MapEvent::FlyTo(self.camera),
            MapEvent::AmenitiesRequested(request),
        ]
    }

    // Pin drop

    /// Offers a map click to pin-drop mode. Returns `true` when the click
    /// was consumed and must not reach other handlers.
    pub fn map_click(&mut self, at: LngLat) -> bool {
        self.pin_drop.handle_click(at)
    }

    pub fn toggle_pin_drop(&mut self) -> PinDropState {
        self.pin_drop.toggle()
    }

    pub fn clear_pin(&mut self) {
        self.pin_drop.clear();
    }

    #[must_use]
    pub fn pin_drop_state(&self) -> PinDropState {
        self.pin_drop.state()
    }

    #[must_use]
    pub const fn pinned_location(&self) -> Option<LngLat> {
        self.pin_drop.pinned()
    }

    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.pin_drop.cursor()
    }

    // Development zone

    /// Center of the development zone: the selected permit, or else the
    /// pinned location.
    #[must_use]
    pub fn zone_center(&self) -> Option<LngLat> {
        self.selected_permit()
            .and_then(Permit::coordinates)
            .or_else(|| self.pin_drop.pinned())
    }

    #[must_use]
    pub fn zone(&self) -> Option<Polygon<f64>> {
        self.zone_center()
            .map(|center| compute_zone(center, DEVELOPMENT_ZONE_RADIUS_KM))
    }

    /// Data for the zone layer; empty when there is no center.
    #[must_use]
    pub fn zone_features(&self) -> FeatureCollection {
        zone_feature_collection(self.zone_center(), DEVELOPMENT_ZONE_RADIUS_KM)
    }

    // Amenities

    /// Hands a fetch result back for a ticket from
    /// [`MapEvent::AmenitiesRequested`].
    pub fn apply_amenities(
        &mut self,
        request: &AmenityRequest,
        result: Result<AmenitiesResponse, ApiError>,
    ) -> ApplyOutcome {
        self.amenity_markers.apply(request, result)
    }

    /// The mounted amenity markers.
    #[must_use]
    pub fn amenity_markers(&self) -> &[AmenityMarker] {
        self.amenity_markers.current()
    }

    fn clear_amenities(&mut self) {
        self.amenity_markers.clear();
        self.selected_amenity = None;
    }

    /// Handles a click on an amenity marker by opening its modal.
    pub fn click_amenity(&mut self, amenity_type: &AmenityType, id: &str) -> Option<MapEvent> {
        let marker = self.amenity_markers.find(amenity_type, id)?.clone();
        self.selected_amenity = Some(marker);
        Some(MapEvent::AmenitySelected {
            amenity_type: amenity_type.clone(),
            id: id.to_string(),
        })
    }

    /// The amenity shown in the modal; `None` when the modal is closed.
    #[must_use]
    pub const fn selected_amenity(&self) -> Option<&AmenityMarker> {
        self.selected_amenity.as_ref()
    }

    pub fn close_amenity_modal(&mut self) {
        self.selected_amenity = None;
    }

    fn sync_permit_markers(&mut self) {
        self.permit_markers.sync(
            &self.permits,
            self.display_cap,
            &self.selection,
            self.display_mode,
        );
    }
}
