use std::collections::BTreeMap;
use std::sync::Mutex;

use mapd_api::{ApiError, PermitBackend};
use mapd_permit_models::{
    AmenitiesResponse, Geom, HypotheticalRequest, HypotheticalResponse, ImpactReportResponse,
    LngLat, LocationQuery, Permit, PermitsResponse,
};

pub const DEFAULT_POSITION: LngLat = LngLat::new(-123.1, 49.25);

pub fn permit(id: &str, value: Option<f64>) -> Permit {
    permit_at(id, value, DEFAULT_POSITION)
}

pub fn permit_at(id: &str, value: Option<f64>, at: LngLat) -> Permit {
    Permit {
        id: id.to_string(),
        geom: Some(Geom::point(at)),
        address: Some(format!("{id} Main St")),
        project_description: Some(format!("Project {id}")),
        project_value: value,
        property_use: vec!["Residential Uses".to_string()],
        issue_date: Some("2024-03-05".to_string()),
        hypothetical: false,
        impact_report: None,
    }
}

/// One amenity per `(type tag, id)` pair, all at the same location.
pub fn amenities_response(entries: &[(&str, &str)]) -> AmenitiesResponse {
    let mut amenities: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    for (tag, id) in entries {
        let group = amenities
            .entry((*tag).to_string())
            .or_insert_with(|| serde_json::json!([]));
        if let serde_json::Value::Array(items) = group {
            items.push(serde_json::json!({
                "_id": id,
                "geom": { "geometry": { "type": "Point", "coordinates": [-123.101, 49.251] } }
            }));
        }
    }
    AmenitiesResponse { amenities }
}

pub fn impact_report_response(permit_id: &str) -> ImpactReportResponse {
    serde_json::from_value(serde_json::json!({
        "success": true,
        "permit_id": permit_id,
        "report": {
            "AnalysisSummary": {
                "_id": permit_id,
                "title": format!("Impact of {permit_id}"),
                "description": "Moderate load on nearby schools",
                "overallImportance": 6
            },
            "AnalyzedInfrastructure": [
                { "_id": "s1", "name": "Elementary", "type": "schools", "impactScore": -3.0 }
            ]
        }
    }))
    .unwrap()
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: r#"{"error":"Backend unavailable"}"#.to_string(),
    }
}

/// Scripted [`PermitBackend`]. Unset responses fail with a 503.
#[derive(Default)]
pub struct FakeBackend {
    permits: Option<Vec<Permit>>,
    amenities: Option<AmenitiesResponse>,
    reports: BTreeMap<String, ImpactReportResponse>,
    hypothetical: Option<HypotheticalResponse>,
    permit_queries: Mutex<Vec<LocationQuery>>,
    amenity_queries: Mutex<Vec<LocationQuery>>,
    report_requests: Mutex<Vec<String>>,
    hypothetical_requests: Mutex<Vec<HypotheticalRequest>>,
}

impl FakeBackend {
    pub fn with_permits(mut self, permits: Vec<Permit>) -> Self {
        self.permits = Some(permits);
        self
    }

    pub fn with_amenities(mut self, amenities: AmenitiesResponse) -> Self {
        self.amenities = Some(amenities);
        self
    }

    pub fn with_report(mut self, report: ImpactReportResponse) -> Self {
        self.reports.insert(report.permit_id.clone(), report);
        self
    }

    pub fn with_hypothetical(mut self, response: HypotheticalResponse) -> Self {
        self.hypothetical = Some(response);
        self
    }

    pub fn permit_queries(&self) -> Vec<LocationQuery> {
        self.permit_queries.lock().unwrap().clone()
    }

    pub fn amenity_queries(&self) -> Vec<LocationQuery> {
        self.amenity_queries.lock().unwrap().clone()
    }

    pub fn report_requests(&self) -> Vec<String> {
        self.report_requests.lock().unwrap().clone()
    }

    pub fn hypothetical_requests(&self) -> Vec<HypotheticalRequest> {
        self.hypothetical_requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PermitBackend for FakeBackend {
    async fn development_permits(
        &self,
        query: LocationQuery,
    ) -> Result<PermitsResponse, ApiError> {
        self.permit_queries.lock().unwrap().push(query);
        self.permits
            .clone()
            .map(|permits| PermitsResponse { permits })
            .ok_or_else(unavailable)
    }

    async fn amenities(&self, query: LocationQuery) -> Result<AmenitiesResponse, ApiError> {
        self.amenity_queries.lock().unwrap().push(query);
        self.amenities.clone().ok_or_else(unavailable)
    }

    async fn impact_report(&self, permit_id: &str) -> Result<ImpactReportResponse, ApiError> {
        self.report_requests
            .lock()
            .unwrap()
            .push(permit_id.to_string());
        self.reports.get(permit_id).cloned().ok_or_else(unavailable)
    }

    async fn hypothetical_impact_report(
        &self,
        request: &HypotheticalRequest,
    ) -> Result<HypotheticalResponse, ApiError> {
        self.hypothetical_requests
            .lock()
            .unwrap()
            .push(request.clone());
        self.hypothetical.clone().ok_or_else(unavailable)
    }
}
