use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::bitmap::{DirtyIndexes, FieldBitmap};
use crate::types::ElementKey;

/// Per-record change tracking: field bitmap, change counter and
/// per-collection element sets.
///
/// `total_changes` always equals the number of set bits, so it can never
/// exceed the field count. Every mutation here preserves that.
#[derive(Debug, Clone)]
pub struct DirtyState {
    bitmap: FieldBitmap,
    field_count: usize,
    total_changes: usize,
    elements: FxHashMap<usize, BTreeSet<ElementKey>>,
}

impl DirtyState {
    /// Allocate an empty state with an element set for each of `collection_fields`.
    pub fn new(field_count: usize, collection_fields: impl IntoIterator<Item = usize>) -> Self {
        let elements = collection_fields
            .into_iter()
            .filter(|&i| i < field_count)
            .map(|i| (i, BTreeSet::new()))
            .collect();
        Self {
            bitmap: FieldBitmap::new(field_count),
            field_count,
            total_changes: 0,
            elements,
        }
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    #[inline]
    pub fn is_field_dirty(&self, index: usize) -> bool {
        index < self.field_count && self.bitmap.contains(index)
    }

    /// Mark a field dirty, counting it once per reset epoch.
    ///
    /// Returns `true` if the field was clean before. Invalid indexes are ignored.
    pub fn set_field_dirty(&mut self, index: usize) -> bool {
        if index >= self.field_count {
            return false;
        }
        let newly = self.bitmap.insert(index);
        if newly {
            self.total_changes += 1;
        }
        newly
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.total_changes > 0
    }

    #[inline]
    pub fn dirty_field_count(&self) -> usize {
        self.total_changes
    }

    pub fn dirty_field_indexes(&self) -> DirtyIndexes<'_> {
        self.bitmap.iter()
    }

    /// Record `key` as changed in the element set of `field_index`.
    ///
    /// Returns `true` if the key was not already tracked.
    pub fn mark_element_dirty(&mut self, field_index: usize, key: ElementKey) -> bool {
        if field_index >= self.field_count {
            return false;
        }
        self.elements.entry(field_index).or_default().insert(key)
    }

    pub fn is_element_dirty(&self, field_index: usize, key: &ElementKey) -> bool {
        self.elements
            .get(&field_index)
            .is_some_and(|set| set.contains(key))
    }

    /// Changed element keys of one collection field, in key order.
    pub fn dirty_elements(&self, field_index: usize) -> impl Iterator<Item = &ElementKey> + '_ {
        self.elements.get(&field_index).into_iter().flatten()
    }

    pub fn dirty_element_count(&self, field_index: usize) -> usize {
        self.elements.get(&field_index).map_or(0, BTreeSet::len)
    }

    /// Whether an element set exists for `field_index` (it may be empty).
    pub fn has_element_set(&self, field_index: usize) -> bool {
        self.elements.contains_key(&field_index)
    }

    /// Clear every bit and empty every element set in place.
    pub fn reset(&mut self) {
        self.bitmap.clear();
        self.total_changes = 0;
        for set in self.elements.values_mut() {
            set.clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn bitmap(&self) -> &FieldBitmap {
        &self.bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MapKey;

    #[test]
    fn test_set_field_dirty_counts_once() {
        let mut st = DirtyState::new(3, []);
        assert!(st.set_field_dirty(1));
        assert!(!st.set_field_dirty(1));
        assert_eq!(st.dirty_field_count(), 1);
        assert_eq!(st.dirty_field_count(), st.bitmap().count_ones());
    }

    #[test]
    fn test_invalid_index_is_noop() {
        let mut st = DirtyState::new(3, []);
        assert!(!st.set_field_dirty(3));
        assert!(!st.is_field_dirty(3));
        assert!(!st.mark_element_dirty(7, ElementKey::Index(0)));
        assert!(!st.is_dirty());
    }

    #[test]
    fn test_indexes_ascending() {
        let mut st = DirtyState::new(5, []);
        st.set_field_dirty(4);
        st.set_field_dirty(0);
        st.set_field_dirty(2);
        assert_eq!(st.dirty_field_indexes().collect::<Vec<_>>(), vec![0, 2, 4]);
    }

    #[test]
    fn test_element_sets_created_for_collections() {
        let st = DirtyState::new(4, [3]);
        assert!(st.has_element_set(3));
        assert!(!st.has_element_set(0));
    }

    #[test]
    fn test_mark_element_creates_missing_set() {
        let mut st = DirtyState::new(4, []);
        assert!(st.mark_element_dirty(2, ElementKey::Key(MapKey::from("k"))));
        assert!(st.has_element_set(2));
        assert!(st.is_element_dirty(2, &ElementKey::Key(MapKey::from("k"))));
        // element marks do not touch the field bit
        assert!(!st.is_field_dirty(2));
    }

    #[test]
    fn test_reset_empties_but_keeps_element_sets() {
        let mut st = DirtyState::new(4, [3]);
        st.set_field_dirty(0);
        st.set_field_dirty(3);
        st.mark_element_dirty(3, ElementKey::Index(0));
        st.mark_element_dirty(3, ElementKey::Index(1));
        st.reset();

        assert!(!st.is_dirty());
        assert_eq!(st.dirty_field_count(), 0);
        assert_eq!(st.dirty_field_indexes().count(), 0);
        assert!(st.has_element_set(3));
        assert_eq!(st.dirty_element_count(3), 0);

        // still usable after reset
        assert!(st.mark_element_dirty(3, ElementKey::Index(5)));
        assert_eq!(st.dirty_element_count(3), 1);
    }
}
