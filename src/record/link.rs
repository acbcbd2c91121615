use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;

use super::{Record, RecordData};
use crate::error::RecordError;
use crate::value::FieldValue;

// ─── ParentLink ─────────────────────────────────────────────────────────────

/// Non-owning back-reference from a nested record to the record holding it,
/// plus the field index of the slot it occupies there.
///
/// The link never keeps the parent alive. Once the parent is dropped the
/// link is dead and propagation stops at it.
#[derive(Clone)]
pub struct ParentLink {
    parent: Weak<RefCell<RecordData>>,
    field_index: usize,
}

impl ParentLink {
    #[inline]
    pub fn field_index(&self) -> usize {
        self.field_index
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.parent.strong_count() > 0
    }

    pub fn parent(&self) -> Option<Record> {
        self.parent.upgrade().map(|inner| Record { inner })
    }
}

impl std::fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParentLink")
            .field("field_index", &self.field_index)
            .field("live", &self.is_live())
            .finish()
    }
}

impl Record {
    // ════════════════════════════════════════════════════════════════════════
    // Linking
    // ════════════════════════════════════════════════════════════════════════

    /// Point this record's parent link at `(parent, field_index)`, replacing
    /// any previous link.
    pub fn set_parent_link(&self, parent: &Record, field_index: usize) {
        let link = ParentLink {
            parent: Rc::downgrade(&parent.inner),
            field_index,
        };
        tracing::trace!(field = field_index, "parent link set");
        self.inner.borrow_mut().parent = Some(link);
    }

    /// Link every record held by `value` (a record field, or the record
    /// elements of a list or map) to `(self, field_index)`.
    pub(crate) fn adopt(&self, field_index: usize, value: &FieldValue) {
        for child in value.records() {
            child.set_parent_link(self, field_index);
        }
    }

    /// The current parent and slot, if the link exists and the parent is alive.
    pub fn parent_link(&self) -> Option<(Record, usize)> {
        let data = self.inner.borrow();
        let link = data.parent.as_ref()?;
        link.parent().map(|p| (p, link.field_index))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Notification
    // ════════════════════════════════════════════════════════════════════════

    /// Called on a parent when the child in `field_index` changed.
    ///
    /// Marks the slot (once per reset epoch) and continues upward through
    /// this record's own parent link.
    pub fn notify_field_changed(&self, field_index: usize) -> Result<(), RecordError> {
        self.inner
            .borrow_mut()
            .ensure_dirty()
            .set_field_dirty(field_index);
        self.propagate_change().map(|_| ())
    }

    /// Walk the parent chain starting at this record's link, marking each
    /// ancestor's slot dirty. Returns the number of ancestors reached.
    ///
    /// Stops at the first missing or dead link. Revisiting a record is a
    /// cycle; walking more than `max_propagation_depth` ancestors is an
    /// overflow. In both cases every ancestor up to that point has already
    /// been marked.
    pub(crate) fn propagate_change(&self) -> Result<usize, RecordError> {
        let (mut link, limit) = {
            let data = self.inner.borrow();
            (data.parent.clone(), data.config.max_propagation_depth)
        };

        let mut visited: FxHashSet<*const RefCell<RecordData>> = FxHashSet::default();
        visited.insert(Rc::as_ptr(&self.inner));
        let mut depth = 0usize;

        while let Some(ParentLink {
            parent,
            field_index,
        }) = link
        {
            let Some(parent) = parent.upgrade() else {
                break;
            };
            depth += 1;
            if depth > limit {
                tracing::error!(limit, "dirty propagation exceeded depth limit");
                return Err(RecordError::PropagationTooDeep { limit });
            }

            let mut data = parent.borrow_mut();
            data.ensure_dirty().set_field_dirty(field_index);
            if !visited.insert(Rc::as_ptr(&parent)) {
                tracing::error!(depth, "parent link cycle during dirty propagation");
                return Err(RecordError::PropagationCycle { depth });
            }
            link = data.parent.clone();
        }

        if depth > 0 {
            tracing::debug!(depth, "dirty change propagated");
        }
        Ok(depth)
    }
}
