//! Impact report and hypothetical development request types.

use serde::{Deserialize, Serialize};

use crate::{LngLat, null_as_default, parse_coordinates};

/// Headline summary of an impact analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Summary identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Narrative description.
    #[serde(default)]
    pub description: String,
    /// Overall importance on a 1-10 scale.
    #[serde(default)]
    pub overall_importance: u8,
}

/// Impact on a single piece of nearby infrastructure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedInfrastructure {
    /// Infrastructure identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Infrastructure name.
    #[serde(default)]
    pub name: String,
    /// Infrastructure type (usually an amenity tag).
    #[serde(rename = "type", default)]
    pub infrastructure_type: String,
    /// Impact score on a -10 to 10 scale.
    #[serde(default)]
    pub impact_score: f64,
    /// Quantitative description of the impact.
    #[serde(default)]
    pub quantitative_impact: String,
    /// Reasoning behind the score.
    #[serde(default)]
    pub justification: String,
}

/// A complete impact report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Headline summary.
    #[serde(rename = "AnalysisSummary")]
    pub analysis_summary: AnalysisSummary,
    /// Per-infrastructure breakdown.
    #[serde(rename = "AnalyzedInfrastructure", default, deserialize_with = "null_as_default")]
    pub analyzed_infrastructure: Vec<AnalyzedInfrastructure>,
}

impl ImpactReport {
    /// Infrastructure entries ordered by absolute impact, largest first.
    #[must_use]
    pub fn by_magnitude(&self) -> Vec<&AnalyzedInfrastructure> {
        let mut entries: Vec<_> = self.analyzed_infrastructure.iter().collect();
        entries.sort_by(|a, b| b.impact_score.abs().total_cmp(&a.impact_score.abs()));
        entries
    }
}

/// Response body of `GET /impact_reports/{permitId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReportResponse {
    /// Whether the backend found a report.
    #[serde(default)]
    pub success: bool,
    /// Permit the report belongs to.
    #[serde(default)]
    pub permit_id: String,
    /// The report itself.
    pub report: ImpactReport,
}

/// Request body of `POST /hypothetical-impact-report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypotheticalRequest {
    /// Development longitude.
    pub longitude: f64,
    /// Development latitude.
    pub latitude: f64,
    /// Free-text description of the proposed project.
    pub project_description: String,
    /// Declared project value in dollars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_value: Option<f64>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Property-use categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_use: Vec<String>,
    /// Specific use categories (e.g. "Multiple Dwelling").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_use_category: Vec<String>,
    /// Radius around the site to analyze, in kilometers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance_km: Option<f64>,
}

/// Input parameters echoed back by the hypothetical report endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputParameters {
    /// Analyzed coordinates as `[lon, lat]`.
    #[serde(default)]
    pub coordinates: serde_json::Value,
    /// Analyzed longitude, when echoed separately.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Analyzed latitude, when echoed separately.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Echoed project description.
    #[serde(default)]
    pub project_description: Option<String>,
    /// Echoed project value.
    #[serde(default)]
    pub project_value: Option<f64>,
    /// Echoed address.
    #[serde(default)]
    pub address: Option<String>,
    /// Echoed property-use categories.
    #[serde(default, deserialize_with = "null_as_default")]
    pub property_use: Vec<String>,
}

impl InputParameters {
    /// The coordinates the backend actually analyzed.
    ///
    /// Prefers the `coordinates` array and falls back to the separate
    /// `longitude`/`latitude` fields.
    #[must_use]
    pub fn analyzed_location(&self) -> Option<LngLat> {
        parse_coordinates(&self.coordinates)
            .or_else(|| Some(LngLat::new(self.longitude?, self.latitude?)))
    }
}

/// Response body of `POST /hypothetical-impact-report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypotheticalResponse {
    /// The generated impact analysis, kept verbatim.
    #[serde(default)]
    pub impact_analysis: serde_json::Value,
    /// The parameters the analysis was run with.
    #[serde(default)]
    pub input_parameters: InputParameters,
}

impl HypotheticalResponse {
    /// The `original_permit_id` the backend assigned, if it is a non-empty
    /// string.
    #[must_use]
    pub fn original_permit_id(&self) -> Option<&str> {
        self.impact_analysis
            .get("original_permit_id")
            .and_then(serde_json::Value::as_str)
            .filter(|id| !id.is_empty())
    }
}
