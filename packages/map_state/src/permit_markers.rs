//! Permit marker rendering.
//!
//! Markers are recomputed from scratch whenever the permit set, the
//! selection, the display cap or the display mode changes.

use mapd_permit_models::{LngLat, Permit, ProjectSize};
use serde::Serialize;

use crate::display::{DisplayCap, DisplayMode};
use crate::marker_set::MarkerSet;
use crate::selection::Selection;

/// A permit marker as the host should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitMarker {
    /// Permit the marker belongs to.
    pub permit_id: String,
    /// Marker position.
    pub position: LngLat,
    /// Visual size, stepped by project value.
    pub size: ProjectSize,
    /// Whether this marker's info card is expanded.
    pub info_card_open: bool,
    /// Whether the permit is a hypothetical one.
    pub hypothetical: bool,
}

/// Computes the markers to draw.
///
/// Nothing is drawn in [`DisplayMode::Boundaries`]. Otherwise permits with
/// valid coordinates are stably sorted by project value, highest first
/// (missing values count as zero), and the first `cap` are kept.
#[must_use]
pub fn render_permit_markers(
    permits: &[Permit],
    cap: DisplayCap,
    selection: &Selection,
    mode: DisplayMode,
) -> Vec<PermitMarker> {
    if !mode.shows_permits() {
        return Vec::new();
    }

    let mut placed: Vec<(&Permit, LngLat)> = permits
        .iter()
        .filter_map(|permit| {
            let Some(position) = permit.coordinates() else {
                log::trace!("Skipping permit {} without valid coordinates", permit.id);
                return None;
            };
            Some((permit, position))
        })
        .collect();

    placed.sort_by(|(a, _), (b, _)| b.value_or_zero().total_cmp(&a.value_or_zero()));

    let limit = cap.limit().unwrap_or(placed.len());

    placed
        .into_iter()
        .take(limit)
        .map(|(permit, position)| PermitMarker {
            permit_id: permit.id.clone(),
            position,
            size: permit.project_size(),
            info_card_open: selection.is_info_card_open(&permit.id),
            hypothetical: permit.hypothetical,
        })
        .collect()
}

/// Owner of the mounted permit markers.
#[derive(Debug, Clone, Default)]
pub struct PermitMarkers {
    markers: MarkerSet<PermitMarker>,
}

impl PermitMarkers {
    /// Replaces the mounted markers with a fresh render.
    pub fn sync(
        &mut self,
        permits: &[Permit],
        cap: DisplayCap,
        selection: &Selection,
        mode: DisplayMode,
    ) {
        self.markers.clear();
        self.markers
            .add_all(render_permit_markers(permits, cap, selection, mode));
    }

    /// The mounted markers.
    #[must_use]
    pub fn current(&self) -> &[PermitMarker] {
        self.markers.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::permit;

    fn ids(markers: &[PermitMarker]) -> Vec<&str> {
        markers.iter().map(|m| m.permit_id.as_str()).collect()
    }

    #[test]
    fn caps_after_sorting_by_value() {
        let permits = vec![
            permit("1", Some(15_000_000.0)),
            permit("2", Some(500_000.0)),
            permit("3", None),
        ];
        let markers = render_permit_markers(
            &permits,
            DisplayCap::from_count(2),
            &Selection::default(),
            DisplayMode::Permits,
        );

        assert_eq!(ids(&markers), vec!["1", "2"]);
        assert_eq!(markers[0].size, ProjectSize::Large);
        assert_eq!(markers[1].size, ProjectSize::Small);
    }

    #[test]
    fn ties_keep_original_order() {
        let permits = vec![
            permit("a", Some(5.0)),
            permit("b", None),
            permit("c", Some(5.0)),
            permit("d", Some(0.0)),
            permit("e", Some(9.0)),
        ];
        let markers = render_permit_markers(
            &permits,
            DisplayCap::Unlimited,
            &Selection::default(),
            DisplayMode::Permits,
        );
        assert_eq!(ids(&markers), vec!["e", "a", "c", "b", "d"]);
    }

    #[test]
    fn invalid_coordinates_do_not_consume_cap() {
        let mut broken = permit("broken", Some(99_000_000.0));
        broken.geom = None;
        let permits = vec![broken, permit("x", Some(1.0)), permit("y", Some(2.0))];

        let markers = render_permit_markers(
            &permits,
            DisplayCap::from_count(5),
            &Selection::default(),
            DisplayMode::Permits,
        );
        assert_eq!(ids(&markers), vec!["y", "x"]);
    }

    #[test]
    fn boundaries_hide_every_permit() {
        let permits: Vec<_> = (0..50)
            .map(|i| permit(&i.to_string(), Some(f64::from(i))))
            .collect();
        let markers = render_permit_markers(
            &permits,
            DisplayCap::Unlimited,
            &Selection::default(),
            DisplayMode::Boundaries,
        );
        assert!(markers.is_empty());
    }

    #[test]
    fn marks_open_info_card() {
        let permits = vec![permit("1", None), permit("2", None)];
        let mut selection = Selection::default();
        selection.open_info_card("2");

        let mut markers = PermitMarkers::default();
        markers.sync(&permits, DisplayCap::Unlimited, &selection, DisplayMode::Permits);
        let open: Vec<_> = markers
            .current()
            .iter()
            .filter(|m| m.info_card_open)
            .map(|m| m.permit_id.as_str())
            .collect();
        assert_eq!(open, vec!["2"]);
    }
}
