mod collection_op;
mod link;
mod read_op;
mod write_op;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::config::TrackerConfig;
use crate::dirty::DirtyState;
use crate::schema::Schema;
use crate::types::ElementKey;
use crate::value::FieldValue;

pub use link::ParentLink;

/// Record pairs already under comparison. A pair met again is assumed equal,
/// so deep equality terminates on cyclic content.
pub(crate) type SeenPairs = FxHashSet<(*const (), *const ())>;


// ─── RecordData ─────────────────────────────────────────────────────────────

pub(crate) struct RecordData {
    schema: Arc<Schema>,
    config: TrackerConfig,
    fields: Vec<FieldValue>,
    dirty: Option<DirtyState>,
    parent: Option<ParentLink>,
}

impl RecordData {
    fn ensure_dirty(&mut self) -> &mut DirtyState {
        let schema = &self.schema;
        self.dirty
            .get_or_insert_with(|| DirtyState::new(schema.field_count(), schema.collection_fields()))
    }

    /// Field-level bookkeeping shared by every mutating path: optionally track
    /// an element key, then set the field bit (counted once per epoch).
    fn mark_changed(&mut self, index: usize, element: Option<ElementKey>) {
        let dirty = self.ensure_dirty();
        if let Some(key) = element {
            tracing::trace!(field = index, ?key, "element marked dirty");
            dirty.mark_element_dirty(index, key);
        }
        dirty.set_field_dirty(index);
    }
}

// ─── Record ─────────────────────────────────────────────────────────────────

/// A schema-shaped record with change tracking.
///
/// `Record` is a handle: cloning it yields another handle to the same record,
/// which is how a nested record is shared between its parent's field and the
/// caller. Handles are `!Send`; a record tree is a single-threaded unit of
/// work.
///
/// Mutations mark the touched field dirty and then walk up the parent links,
/// marking the slot each record occupies in its parent. See
/// [`Record::set`] and [`Record::notify_field_changed`].
#[derive(Clone)]
pub struct Record {
    inner: Rc<RefCell<RecordData>>,
}

impl Record {
    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    /// Create a record with every field at its zero value, unlinked.
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self::with_config(schema, TrackerConfig::default())
    }

    pub fn with_config(schema: &Arc<Schema>, config: TrackerConfig) -> Self {
        let fields = schema.fields().iter().map(|f| f.zero_value()).collect();
        let mut data = RecordData {
            schema: Arc::clone(schema),
            config,
            fields,
            dirty: None,
            parent: None,
        };
        if !config.lazy_dirty_state {
            data.ensure_dirty();
        }
        Self {
            inner: Rc::new(RefCell::new(data)),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Identity / metadata
    // ════════════════════════════════════════════════════════════════════════

    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.inner.borrow().schema)
    }

    pub fn config(&self) -> TrackerConfig {
        self.inner.borrow().config
    }

    pub fn field_count(&self) -> usize {
        self.inner.borrow().fields.len()
    }

    /// Whether two handles refer to the same record.
    #[inline]
    pub fn ptr_eq(a: &Record, b: &Record) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    #[inline]
    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.inner).cast()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Dirty state
    // ════════════════════════════════════════════════════════════════════════

    /// Allocate the dirty state if it does not exist yet.
    pub fn ensure_dirty(&self) {
        self.inner.borrow_mut().ensure_dirty();
    }

    pub fn has_dirty_state(&self) -> bool {
        self.inner.borrow().dirty.is_some()
    }

    /// Changed element keys of a list or map field since the last reset.
    pub fn dirty_elements(&self, index: usize) -> Vec<ElementKey> {
        let data = self.inner.borrow();
        data.dirty
            .as_ref()
            .map(|d| d.dirty_elements(index).cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_element_dirty(&self, index: usize, key: impl Into<ElementKey>) -> bool {
        let key = key.into();
        let data = self.inner.borrow();
        data.dirty
            .as_ref()
            .is_some_and(|d| d.is_element_dirty(index, &key))
    }

    pub fn is_field_dirty_by_name(&self, name: &str) -> bool {
        let index = self.inner.borrow().schema.field_index(name);
        index.is_some_and(|i| self.is_field_dirty(i))
    }

    /// Names of the dirty fields, in field-index order.
    pub fn dirty_field_names(&self) -> Vec<SmolStr> {
        let data = self.inner.borrow();
        let Some(dirty) = data.dirty.as_ref() else {
            return Vec::new();
        };
        dirty
            .dirty_field_indexes()
            .filter_map(|i| data.schema.field(i).map(|f| f.name.clone()))
            .collect()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Snapshot
    // ════════════════════════════════════════════════════════════════════════

    /// Current content as a JSON object keyed by field name. Read-only: does
    /// not re-link nested records.
    ///
    /// A record that already appears between the root and the current
    /// position renders as null, as does anything nested deeper than
    /// `max_propagation_depth`.
    pub fn snapshot(&self) -> serde_json::Value {
        let depth = self.config().max_propagation_depth;
        self.snapshot_within(depth, &mut Vec::new())
    }

    pub(crate) fn snapshot_within(
        &self,
        depth: usize,
        path: &mut Vec<*const ()>,
    ) -> serde_json::Value {
        let id = self.addr();
        if path.contains(&id) {
            return serde_json::Value::Null;
        }
        let Ok(data) = self.inner.try_borrow() else {
            return serde_json::Value::Null;
        };
        path.push(id);
        let object = data
            .schema
            .fields()
            .iter()
            .zip(&data.fields)
            .map(|(def, value)| (def.name.to_string(), value.to_json(depth, path)))
            .collect();
        path.pop();
        serde_json::Value::Object(object)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Equality
    // ════════════════════════════════════════════════════════════════════════

    pub(crate) fn eq_guarded(&self, other: &Record, seen: &mut SeenPairs) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        if !seen.insert((self.addr(), other.addr())) {
            return true;
        }
        let (Ok(a), Ok(b)) = (self.inner.try_borrow(), other.inner.try_borrow()) else {
            return false;
        };
        a.schema.name() == b.schema.name()
            && a.fields.len() == b.fields.len()
            && a
                .fields
                .iter()
                .zip(&b.fields)
                .all(|(x, y)| x.eq_guarded(y, seen))
    }
}

impl PartialEq for Record {
    /// Deep equality: same record, or same type with equal field values.
    /// Dirty state and parent links are not compared. Terminates on cyclic
    /// content.
    fn eq(&self, other: &Self) -> bool {
        self.eq_guarded(other, &mut SeenPairs::default())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(data) = self.inner.try_borrow() else {
            return f.write_str("Record(<borrowed>)");
        };
        f.debug_struct("Record")
            .field("schema", &data.schema.name())
            .field(
                "dirty_field_count",
                &data.dirty.as_ref().map_or(0, DirtyState::dirty_field_count),
            )
            .field("linked", &data.parent.as_ref().is_some_and(ParentLink::is_live))
            .finish()
    }
}

// ─── DirtyTracked ───────────────────────────────────────────────────────────

/// Dirty queries and reset, as consumed by a persistence adapter.
///
/// Implemented for [`Record`] and for `Option<T>`, where `None` stands for an
/// absent record and answers with safe defaults.
pub trait DirtyTracked {
    fn is_dirty(&self) -> bool;
    fn is_field_dirty(&self, index: usize) -> bool;
    fn dirty_field_count(&self) -> usize;
    /// Dirty field indexes, ascending.
    fn dirty_field_indexes(&self) -> Vec<usize>;
    /// Clear this record's dirty bits and element sets. Nested records keep
    /// their own state.
    fn reset_dirty(&self);
}

impl DirtyTracked for Record {
    fn is_dirty(&self) -> bool {
        self.inner
            .borrow()
            .dirty
            .as_ref()
            .is_some_and(DirtyState::is_dirty)
    }

    fn is_field_dirty(&self, index: usize) -> bool {
        self.inner
            .borrow()
            .dirty
            .as_ref()
            .is_some_and(|d| d.is_field_dirty(index))
    }

    fn dirty_field_count(&self) -> usize {
        self.inner
            .borrow()
            .dirty
            .as_ref()
            .map_or(0, DirtyState::dirty_field_count)
    }

    fn dirty_field_indexes(&self) -> Vec<usize> {
        self.inner
            .borrow()
            .dirty
            .as_ref()
            .map(|d| d.dirty_field_indexes().collect())
            .unwrap_or_default()
    }

    fn reset_dirty(&self) {
        if let Some(dirty) = self.inner.borrow_mut().dirty.as_mut() {
            dirty.reset();
        }
    }
}

impl<T: DirtyTracked> DirtyTracked for Option<T> {
    fn is_dirty(&self) -> bool {
        self.as_ref().is_some_and(DirtyTracked::is_dirty)
    }

    fn is_field_dirty(&self, index: usize) -> bool {
        self.as_ref().is_some_and(|r| r.is_field_dirty(index))
    }

    fn dirty_field_count(&self) -> usize {
        self.as_ref().map_or(0, DirtyTracked::dirty_field_count)
    }

    fn dirty_field_indexes(&self) -> Vec<usize> {
        self.as_ref()
            .map(DirtyTracked::dirty_field_indexes)
            .unwrap_or_default()
    }

    fn reset_dirty(&self) {
        if let Some(r) = self {
            r.reset_dirty();
        }
    }
}

impl<T: DirtyTracked + ?Sized> DirtyTracked for &T {
    fn is_dirty(&self) -> bool {
        (**self).is_dirty()
    }

    fn is_field_dirty(&self, index: usize) -> bool {
        (**self).is_field_dirty(index)
    }

    fn dirty_field_count(&self) -> usize {
        (**self).dirty_field_count()
    }

    fn dirty_field_indexes(&self) -> Vec<usize> {
        (**self).dirty_field_indexes()
    }

    fn reset_dirty(&self) {
        (**self).reset_dirty();
    }
}

#[cfg(test)]
impl Record {
    pub(crate) fn bitmap_popcount(&self) -> usize {
        self.inner
            .borrow()
            .dirty
            .as_ref()
            .map_or(0, |d| d.bitmap().count_ones())
    }
}
