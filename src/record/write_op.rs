use super::Record;
use crate::error::RecordError;
use crate::value::FieldValue;

/// Collapse a checked result into the permissive API's answer.
///
/// Misuse (bad index, wrong kind) is a silent no-op. A propagation failure
/// happens after the local change was applied, so it still counts as a
/// change, but it is logged as an error.
pub(crate) fn settle(op: &'static str, index: usize, result: Result<bool, RecordError>) -> bool {
    match result {
        Ok(changed) => changed,
        Err(
            err @ (RecordError::PropagationCycle { .. } | RecordError::PropagationTooDeep { .. }),
        ) => {
            tracing::error!(op, field = index, error = %err, "change applied but propagation failed");
            true
        }
        Err(err) => {
            tracing::debug!(op, field = index, error = %err, "ignored");
            false
        }
    }
}

impl Record {
    // ════════════════════════════════════════════════════════════════════════
    // Checked setters
    // ════════════════════════════════════════════════════════════════════════

    /// Assign field `index`.
    ///
    /// Returns `Ok(false)` when `value` deep-equals the current value: no bit
    /// is set and nothing propagates. Otherwise the field bit is set (counted
    /// once per reset epoch) and the value is stored. Nested records in the
    /// new value are linked to `(self, index)`, then the change is propagated
    /// to every ancestor.
    ///
    /// Assigning a whole list or map does not touch its element-tracking set.
    pub fn try_set(&self, index: usize, value: impl Into<FieldValue>) -> Result<bool, RecordError> {
        let value = value.into();
        {
            let data = self.inner.borrow();
            let def = data
                .schema
                .field(index)
                .ok_or_else(|| data.schema.index_error(index))?;
            // shared borrow only: `fits` and `==` may read nested records,
            // which can include this one.
            if !value.fits(&def.kind) {
                return Err(RecordError::KindMismatch {
                    index,
                    expected: def.kind.clone(),
                    actual: value.describe(),
                });
            }
            if data.fields[index] == value {
                drop(data);
                self.ensure_dirty();
                return Ok(false);
            }
        }

        let children: Vec<Record> = value.records().into_iter().cloned().collect();
        {
            let mut data = self.inner.borrow_mut();
            data.mark_changed(index, None);
            data.fields[index] = value;
        }
        for child in &children {
            child.set_parent_link(self, index);
        }
        self.propagate_change()?;
        Ok(true)
    }

    pub fn try_set_by_name(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<bool, RecordError> {
        let index = self.inner.borrow().schema.lookup(name)?;
        self.try_set(index, value)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Permissive setters
    // ════════════════════════════════════════════════════════════════════════

    /// [`try_set`](Self::try_set) that never fails: an invalid index or a
    /// value of the wrong kind is a no-op. Returns whether the value changed.
    pub fn set(&self, index: usize, value: impl Into<FieldValue>) -> bool {
        settle("set", index, self.try_set(index, value))
    }

    pub fn set_by_name(&self, name: &str, value: impl Into<FieldValue>) -> bool {
        let Some(index) = self.inner.borrow().schema.field_index(name) else {
            tracing::debug!(field = name, "set on unknown field ignored");
            return false;
        };
        self.set(index, value)
    }
}
