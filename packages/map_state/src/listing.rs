//! Sidebar project listing.
//!
//! Only permits with a declared, non-zero value are listed. The listing is
//! sorted by value, highest first, and paged.

use chrono::{DateTime, NaiveDate};
use mapd_permit_models::{Permit, ProjectSize};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Projects per sidebar page.
pub const ITEMS_PER_PAGE: usize = 5;

/// Descriptions longer than this are truncated in project cards.
pub const DESCRIPTION_MAX_LENGTH: usize = 80;

/// Value-sorted, paged view over the working permit set.
#[derive(Debug, Clone)]
pub struct ProjectListing<'a> {
    permits: Vec<&'a Permit>,
}

impl<'a> ProjectListing<'a> {
    /// Builds the listing from the working set.
    #[must_use]
    pub fn new(permits: &'a [Permit]) -> Self {
        let mut permits: Vec<&Permit> = permits
            .iter()
            .filter(|p| p.project_value.is_some_and(|v| v.abs() > 0.0))
            .collect();
        permits.sort_by(|a, b| b.value_or_zero().total_cmp(&a.value_or_zero()));
        Self { permits }
    }

    /// Number of listed permits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.permits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permits.is_empty()
    }

    /// Number of pages; zero when nothing is listed.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.permits.len().div_ceil(ITEMS_PER_PAGE)
    }

    /// Clamps a 1-based page number into range.
    #[must_use]
    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages().max(1))
    }

    /// The permits on 1-based `page`, after clamping.
    #[must_use]
    pub fn page(&self, page: usize) -> &[&'a Permit] {
        let start = (self.clamp_page(page) - 1) * ITEMS_PER_PAGE;
        let end = (start + ITEMS_PER_PAGE).min(self.permits.len());
        self.permits.get(start..end).unwrap_or_default()
    }

    /// Card summaries for 1-based `page`.
    #[must_use]
    pub fn cards(&self, page: usize, selected: Option<&str>) -> Vec<ProjectCard> {
        self.page(page)
            .iter()
            .map(|permit| ProjectCard::new(permit, selected == Some(permit.id.as_str())))
            .collect()
    }
}

/// What a sidebar project card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    pub permit_id: String,
    pub address: String,
    pub size: ProjectSize,
    pub value: String,
    pub issue_date: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<PropertyUseCategory>,
    pub selected: bool,
}

impl ProjectCard {
    #[must_use]
    pub fn new(permit: &Permit, selected: bool) -> Self {
        Self {
            permit_id: permit.id.clone(),
            address: permit.address.clone().unwrap_or_default(),
            size: permit.project_size(),
            value: format_currency(permit.value_or_zero()),
            issue_date: permit.issue_date.as_deref().and_then(format_issue_date),
            description: permit
                .project_description
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| truncate_description(d, DESCRIPTION_MAX_LENGTH)),
            categories: permit
                .property_use
                .iter()
                .map(|u| PropertyUseCategory::from_label(u))
                .collect(),
            selected,
        }
    }
}

/// Formats a dollar amount with no decimals and thousands separators,
/// e.g. `$15,000,000`.
#[must_use]
pub fn format_currency(value: f64) -> String {
    let digits = format!("{:.0}", value.abs().round());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value.round() < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Truncates `text` to `max_chars` characters, appending `...` when
/// anything was cut.
#[must_use]
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Formats a backend issue date as `Mar 5, 2024`.
///
/// Accepts plain dates and RFC 3339 timestamps; anything else yields
/// `None`.
#[must_use]
pub fn format_issue_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))?;
    Some(date.format("%b %-d, %Y").to_string())
}

/// Broad property-use category of a permit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyUseCategory {
    Residential,
    Commercial,
    Institutional,
    Industrial,
    Mixed,
    Other,
}

impl PropertyUseCategory {
    /// Maps a backend label such as `"Residential Uses"`. Matching is
    /// case-insensitive; unknown labels map to [`Self::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "residential uses" => Self::Residential,
            "commercial uses" => Self::Commercial,
            "institutional uses" => Self::Institutional,
            "industrial uses" => Self::Industrial,
            "mixed uses" => Self::Mixed,
            _ => Self::Other,
        }
    }

    /// Badge color (CSS hex).
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Residential => "#3b82f6",
            Self::Commercial => "#22c55e",
            Self::Institutional => "#a855f7",
            Self::Industrial => "#f97316",
            Self::Mixed => "#eab308",
            Self::Other => "#6b7280",
        }
    }
}
