//! Async driver pairing a [`MapController`] with a backend.
//!
//! The session fulfils the controller's amenity requests itself and owns
//! the hypothetical report dialog and the impact report cache. Backend
//! failures are logged and degrade to empty results.

use std::collections::BTreeMap;

use mapd_api::PermitBackend;
use mapd_permit_models::{ImpactReport, LocationQuery};

use crate::controller::MapController;
use crate::hypothetical::{HypotheticalDialog, HypotheticalError};
use crate::{DEFAULT_PERMITS_QUERY, MapEvent};

/// An impact report for the detail panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PermitReport {
    /// Fetched from the backend for a real permit.
    Fetched(ImpactReport),
    /// Embedded in a hypothetical permit, kept verbatim.
    Embedded(serde_json::Value),
}

/// A map controller wired to a [`PermitBackend`].
pub struct MapSession<B: PermitBackend> {
    backend: B,
    controller: MapController,
    dialog: HypotheticalDialog,
    reports: BTreeMap<String, ImpactReport>,
}

impl<B: PermitBackend> MapSession<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_controller(backend, MapController::new())
    }

    #[must_use]
    pub fn with_controller(backend: B, controller: MapController) -> Self {
        Self {
            backend,
            controller,
            dialog: HypotheticalDialog::default(),
            reports: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn controller(&self) -> &MapController {
        &self.controller
    }

    /// Mutable access for purely local events (pin drop, display mode,
    /// info card). Amenity tickets produced this way must be fulfilled by
    /// the caller.
    pub const fn controller_mut(&mut self) -> &mut MapController {
        &mut self.controller
    }

    #[must_use]
    pub const fn dialog(&self) -> &HypotheticalDialog {
        &self.dialog
    }

    pub const fn dialog_mut(&mut self) -> &mut HypotheticalDialog {
        &mut self.dialog
    }

    /// Loads the initial permit set around the city.
    pub async fn load_permits(&mut self) -> usize {
        self.load_permits_around(DEFAULT_PERMITS_QUERY).await
    }

    /// Replaces the working set with the permits matching `query`.
    ///
    /// On failure the working set is left as it was and zero is returned.
    pub async fn load_permits_around(&mut self, query: LocationQuery) -> usize {
        match self.backend.development_permits(query).await {
            Ok(response) => {
                let count = response.permits.len();
                self.controller.set_permits(response.permits);
                count
            }
            Err(e) => {
                log::error!("Error fetching permits: {e}");
                0
            }
        }
    }

    /// [`MapController::click_permit`], fetching any requested amenities.
    pub async fn click_permit(&mut self, id: &str) -> Vec<MapEvent> {
        let events = self.controller.click_permit(id);
        self.fulfil(&events).await;
        events
    }

    /// [`MapController::select_from_sidebar`], fetching any requested
    /// amenities.
    pub async fn select_from_sidebar(&mut self, id: Option<&str>) -> Vec<MapEvent> {
        let events = self.controller.select_from_sidebar(id);
        self.fulfil(&events).await;
        events
    }

    /// Opens the hypothetical report dialog at the pinned location.
    pub fn open_hypothetical_dialog(&mut self) {
        self.dialog.open_with_pin(self.controller.pinned_location());
    }

    /// Submits the dialog and selects the resulting hypothetical permit.
    ///
    /// # Errors
    ///
    /// Returns [`HypotheticalError`] if validation or the request fails;
    /// the dialog stays open with its inline error set.
    pub async fn submit_hypothetical(&mut self) -> Result<Vec<MapEvent>, HypotheticalError> {
        let permit = self.dialog.submit(&self.backend).await?;
        let events = self.controller.accept_hypothetical(permit);
        self.fulfil(&events).await;
        Ok(events)
    }

    /// The impact report for `permit_id`.
    ///
    /// Hypothetical permits answer from their embedded analysis. Fetched
    /// reports are cached per permit. Returns `None` for unknown permits
    /// and on failure.
    pub async fn impact_report(&mut self, permit_id: &str) -> Option<PermitReport> {
        if let Some(embedded) = self
            .controller
            .permit(permit_id)
            .filter(|p| p.hypothetical)
            .and_then(|p| p.impact_report.clone())
        {
            return Some(PermitReport::Embedded(embedded));
        }
        if let Some(cached) = self.reports.get(permit_id) {
            return Some(PermitReport::Fetched(cached.clone()));
        }

        match self.backend.impact_report(permit_id).await {
            Ok(response) => {
                self.reports
                    .insert(permit_id.to_string(), response.report.clone());
                Some(PermitReport::Fetched(response.report))
            }
            Err(e) => {
                log::error!("Error fetching impact report for {permit_id}: {e}");
                None
            }
        }
    }

    async fn fulfil(&mut self, events: &[MapEvent]) {
        for event in events {
            if let MapEvent::AmenitiesRequested(request) = event {
                let result = self.backend.amenities(request.query()).await;
                self.controller.apply_amenities(request, result);
            }
        }
    }
}
