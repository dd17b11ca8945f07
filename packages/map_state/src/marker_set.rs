//! Owner of a set of mounted map markers.

/// The live markers of one kind.
///
/// Markers are only ever replaced wholesale: the managers call
/// [`MarkerSet::clear`] and then [`MarkerSet::add_all`]. Nothing outside
/// the owning manager mutates the set.
#[derive(Debug, Clone)]
pub struct MarkerSet<M> {
    markers: Vec<M>,
}

impl<M> Default for MarkerSet<M> {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
        }
    }
}

impl<M> MarkerSet<M> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unmounts every marker, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.markers.len();
        self.markers.clear();
        removed
    }

    /// Mounts `markers` after the current ones.
    pub fn add_all(&mut self, markers: impl IntoIterator<Item = M>) {
        self.markers.extend(markers);
    }

    /// The currently mounted markers, in mount order.
    #[must_use]
    pub fn current(&self) -> &[M] {
        &self.markers
    }

    /// Number of mounted markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether no marker is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_then_add_replaces_contents() {
        let mut set = MarkerSet::new();
        set.add_all([1, 2, 3]);
        assert_eq!(set.clear(), 3);
        assert!(set.is_empty());
        set.add_all([4]);
        assert_eq!(set.current(), &[4]);
    }
}
