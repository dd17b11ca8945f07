//! Permit selection and info-card visibility.
//!
//! The selected permit drives the detail panel and the zone center. The
//! visible info card is the popup expanded on the map. The two are set
//! independently: a sidebar selection opens both, closing a popup keeps
//! the selection, and an external deselect clears both.

/// Selection state for the permit layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<String>,
    info_card: Option<String>,
}

impl Selection {
    /// The selected permit id.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The permit whose info card is expanded.
    #[must_use]
    pub fn info_card(&self) -> Option<&str> {
        self.info_card.as_deref()
    }

    /// Whether `id` is the selected permit.
    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Whether `id`'s info card is expanded.
    #[must_use]
    pub fn is_info_card_open(&self, id: &str) -> bool {
        self.info_card.as_deref() == Some(id)
    }

    /// Selects `id` without touching the info card. Returns whether the
    /// selection changed.
    pub fn select(&mut self, id: &str) -> bool {
        if self.is_selected(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    /// Expands `id`'s info card.
    pub fn open_info_card(&mut self, id: &str) {
        self.info_card = Some(id.to_string());
    }

    /// Collapses the info card; the selection is kept.
    pub fn close_info_card(&mut self) {
        self.info_card = None;
    }

    /// Selects `id` and expands its info card, as a sidebar click does.
    pub fn focus(&mut self, id: &str) {
        self.select(id);
        self.open_info_card(id);
    }

    /// Clears both the selection and the info card.
    pub fn clear(&mut self) {
        self.selected = None;
        self.info_card = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_info_card_keeps_selection() {
        let mut selection = Selection::default();
        selection.focus("A");
        assert_eq!(selection.selected(), Some("A"));
        assert_eq!(selection.info_card(), Some("A"));

        selection.close_info_card();
        assert_eq!(selection.info_card(), None);
        assert_eq!(selection.selected(), Some("A"));
    }

    #[test]
    fn select_reports_changes() {
        let mut selection = Selection::default();
        assert!(selection.select("A"));
        assert!(!selection.select("A"));
        assert!(selection.select("B"));
        assert!(selection.info_card().is_none());
    }

    #[test]
    fn clear_resets_both() {
        let mut selection = Selection::default();
        selection.focus("A");
        selection.clear();
        assert_eq!(selection, Selection::default());
    }
}
