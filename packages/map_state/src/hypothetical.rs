//! Hypothetical development reports.
//!
//! The dialog collects a [`HypotheticalForm`], validates it locally, posts
//! it to the backend and turns the response into a permit-shaped record
//! that the map can select like any fetched permit.

use mapd_api::{ApiError, PermitBackend};
use mapd_permit_models::{Geom, HypotheticalRequest, HypotheticalResponse, LngLat, Permit};
use thiserror::Error;

/// Location the form starts at when no pin has been dropped.
pub const DEFAULT_FORM_LOCATION: LngLat = LngLat::new(-123.1207, 49.2827);

/// Default analysis radius.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 0.5;

/// Message shown when the description is blank.
pub const DESCRIPTION_REQUIRED: &str = "Project description is required";

/// Message shown when the report request fails.
pub const SUBMIT_FAILED: &str = "Failed to generate report. Please try again.";

/// Prefix of client-generated hypothetical permit ids.
pub const HYPOTHETICAL_ID_PREFIX: &str = "hypothetical-";

/// Errors from the hypothetical report workflow.
#[derive(Debug, Error)]
pub enum HypotheticalError {
    /// The form failed local validation; no request was sent.
    #[error("{message}")]
    Validation {
        /// User-facing message.
        message: String,
    },

    /// The backend request failed.
    #[error("Hypothetical report request failed: {0}")]
    Api(#[from] ApiError),
}

impl HypotheticalError {
    /// The inline message the dialog shows for this error.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation { message } => message,
            Self::Api(_) => SUBMIT_FAILED,
        }
    }
}

/// Form data for a hypothetical development.
#[derive(Debug, Clone, PartialEq)]
pub struct HypotheticalForm {
    pub longitude: f64,
    pub latitude: f64,
    pub project_description: String,
    pub project_value: Option<f64>,
    pub address: String,
    pub property_use: Vec<String>,
    pub specific_use_category: Vec<String>,
    pub max_distance_km: f64,
}

impl Default for HypotheticalForm {
    fn default() -> Self {
        Self::at(DEFAULT_FORM_LOCATION)
    }
}

impl HypotheticalForm {
    /// An empty form located at `location`.
    #[must_use]
    pub const fn at(location: LngLat) -> Self {
        Self {
            longitude: location.lon,
            latitude: location.lat,
            project_description: String::new(),
            project_value: None,
            address: String::new(),
            property_use: Vec::new(),
            specific_use_category: Vec::new(),
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
        }
    }

    /// The form's location.
    #[must_use]
    pub const fn location(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    /// Moves the form to `location`, keeping the other fields.
    pub const fn set_location(&mut self, location: LngLat) {
        self.longitude = location.lon;
        self.latitude = location.lat;
    }

    /// Checks the form before submission.
    ///
    /// # Errors
    ///
    /// Returns [`HypotheticalError::Validation`] if the project description
    /// is blank.
    pub fn validate(&self) -> Result<(), HypotheticalError> {
        if self.project_description.trim().is_empty() {
            return Err(HypotheticalError::Validation {
                message: DESCRIPTION_REQUIRED.to_string(),
            });
        }
        Ok(())
    }

    /// Validates the form and builds the request body.
    ///
    /// # Errors
    ///
    /// See [`HypotheticalForm::validate`].
    pub fn to_request(&self) -> Result<HypotheticalRequest, HypotheticalError> {
        self.validate()?;
        let address = self.address.trim();

        Ok(HypotheticalRequest {
            longitude: self.longitude,
            latitude: self.latitude,
            project_description: self.project_description.clone(),
            project_value: self.project_value,
            address: (!address.is_empty()).then(|| address.to_string()),
            property_use: self.property_use.clone(),
            specific_use_category: self.specific_use_category.clone(),
            max_distance_km: Some(self.max_distance_km),
        })
    }
}

/// Builds a hypothetical permit from a report response.
///
/// The id is the backend's `original_permit_id` when it is a non-empty
/// string, otherwise a fresh `hypothetical-<uuid>`. Coordinates come from
/// the echoed input parameters, not the submitted form, so the marker sits
/// where the backend ran its analysis. The analysis is embedded verbatim.
#[must_use]
pub fn synthesize_permit(response: HypotheticalResponse) -> Permit {
    let id = response.original_permit_id().map_or_else(
        || format!("{HYPOTHETICAL_ID_PREFIX}{}", uuid::Uuid::new_v4()),
        str::to_string,
    );
    let geom = response.input_parameters.analyzed_location().map(Geom::point);
    if geom.is_none() {
        log::warn!("Hypothetical report {id} echoed no usable coordinates");
    }

    let params = response.input_parameters;
    Permit {
        id,
        geom,
        address: params.address,
        project_description: params.project_description,
        project_value: params.project_value,
        property_use: params.property_use,
        issue_date: None,
        hypothetical: true,
        impact_report: Some(response.impact_analysis),
    }
}

/// State of the hypothetical report dialog.
#[derive(Debug, Clone, Default)]
pub struct HypotheticalDialog {
    open: bool,
    loading: bool,
    error: Option<String>,
    /// Form being edited.
    pub form: HypotheticalForm,
}

impl HypotheticalDialog {
    /// Whether the dialog is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The inline error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Opens the dialog, moving the form to the pinned location if there
    /// is one.
    pub fn open_with_pin(&mut self, pin: Option<LngLat>) {
        if let Some(at) = pin {
            self.form.set_location(at);
        }
        self.open = true;
        self.error = None;
    }

    /// Closes the dialog and drops any error.
    pub fn close(&mut self) {
        self.open = false;
        self.error = None;
    }

    /// Validates and sends the form, returning the synthesized permit.
    ///
    /// The dialog closes on success. On failure it stays open with the
    /// inline error set.
    ///
    /// # Errors
    ///
    /// Returns [`HypotheticalError::Validation`] without touching the
    /// network if the form is invalid, or [`HypotheticalError::Api`] if the
    /// request fails.
    pub async fn submit<B: PermitBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<Permit, HypotheticalError> {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message().to_string());
                return Err(e);
            }
        };

        self.loading = true;
        self.error = None;
        let result = backend.hypothetical_impact_report(&request).await;
        self.loading = false;

        match result {
            Ok(response) => {
                let mut permit = synthesize_permit(response);
                if permit.geom.is_none() {
                    permit.geom = Some(Geom::point(self.form.location()));
                }
                log::info!("Generated hypothetical report {}", permit.id);
                self.close();
                Ok(permit)
            }
            Err(e) => {
                log::error!("Error generating hypothetical report: {e}");
                let e = HypotheticalError::from(e);
                self.error = Some(e.user_message().to_string());
                Err(e)
            }
        }
    }
}
