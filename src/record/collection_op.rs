use smol_str::SmolStr;

use super::Record;
use super::write_op::settle;
use crate::error::RecordError;
use crate::types::{ElementKey, ElementKind, FieldKind, ScalarKind};
use crate::value::{FieldValue, MapKey, Value};

impl Record {
    /// Look up a collection field and check the element kind. Returns the
    /// declared kind on success.
    fn collection_kind(
        &self,
        index: usize,
        wanted: &'static str,
        check: impl FnOnce(&FieldKind) -> Option<Result<(), SmolStr>>,
    ) -> Result<FieldKind, RecordError> {
        let data = self.inner.borrow();
        let def = data
            .schema
            .field(index)
            .ok_or_else(|| data.schema.index_error(index))?;
        match check(&def.kind) {
            None => Err(RecordError::NotACollection {
                index,
                kind: def.kind.clone(),
                wanted,
            }),
            Some(Err(actual)) => Err(RecordError::KindMismatch {
                index,
                expected: def.kind.clone(),
                actual,
            }),
            Some(Ok(())) => Ok(def.kind.clone()),
        }
    }

    fn list_kind(&self, index: usize, value: &Value) -> Result<FieldKind, RecordError> {
        self.collection_kind(index, "list", |kind| match kind {
            FieldKind::List(elem) => Some(expect_element(elem, value)),
            _ => None,
        })
    }

    /// Link a record element to `(self, index)` and walk the change upward.
    fn finish_element_change(&self, index: usize, child: Option<Record>) -> Result<bool, RecordError> {
        if let Some(child) = child {
            child.set_parent_link(self, index);
        }
        self.propagate_change()?;
        Ok(true)
    }

    // ════════════════════════════════════════════════════════════════════════
    // List fields
    // ════════════════════════════════════════════════════════════════════════

    /// Append to list field `index` and mark the new position dirty.
    ///
    /// An append is always a change; there is no equality check. A record
    /// element is linked to `(self, index)`.
    pub fn try_add_element(&self, index: usize, value: impl Into<Value>) -> Result<bool, RecordError> {
        let value = value.into();
        let kind = self.list_kind(index, &value)?;
        let child = value.as_record().cloned();
        {
            let mut data = self.inner.borrow_mut();
            let position = match &mut data.fields[index] {
                FieldValue::List(items) => {
                    items.push(value);
                    items.len() - 1
                }
                other => return Err(stored_mismatch(index, kind, other)),
            };
            data.mark_changed(index, Some(ElementKey::Index(position)));
        }
        self.finish_element_change(index, child)
    }

    /// Replace the element at `position` of list field `index`.
    ///
    /// An out-of-range position is `Ok(false)`, as is a value deep-equal to
    /// the current element.
    pub fn try_set_element_at(
        &self,
        index: usize,
        position: usize,
        value: impl Into<Value>,
    ) -> Result<bool, RecordError> {
        let value = value.into();
        let kind = self.list_kind(index, &value)?;
        // shared borrow only: element equality may read records that hold
        // this one.
        let unchanged = {
            let data = self.inner.borrow();
            match &data.fields[index] {
                FieldValue::List(items) => match items.get(position) {
                    None => return Ok(false),
                    Some(current) => *current == value,
                },
                other => return Err(stored_mismatch(index, kind, other)),
            }
        };
        if unchanged {
            self.ensure_dirty();
            return Ok(false);
        }

        let child = value.as_record().cloned();
        {
            let mut data = self.inner.borrow_mut();
            if let FieldValue::List(items) = &mut data.fields[index] {
                if let Some(slot) = items.get_mut(position) {
                    *slot = value;
                }
            }
            data.mark_changed(index, Some(ElementKey::Index(position)));
        }
        self.finish_element_change(index, child)
    }

    pub fn add_element(&self, index: usize, value: impl Into<Value>) -> bool {
        settle("add_element", index, self.try_add_element(index, value))
    }

    pub fn set_element_at(&self, index: usize, position: usize, value: impl Into<Value>) -> bool {
        settle(
            "set_element_at",
            index,
            self.try_set_element_at(index, position, value),
        )
    }

    // ════════════════════════════════════════════════════════════════════════
    // Map fields
    // ════════════════════════════════════════════════════════════════════════

    /// Store `value` under `key` in map field `index` and mark the key dirty.
    /// A missing key always counts as a change; a value deep-equal to the
    /// stored one does not.
    pub fn try_set_map_value(
        &self,
        index: usize,
        key: impl Into<MapKey>,
        value: impl Into<Value>,
    ) -> Result<bool, RecordError> {
        let key = key.into();
        let value = value.into();
        let kind = self.collection_kind(index, "map", |kind| match kind {
            FieldKind::Map {
                key: key_kind,
                value: value_kind,
            } => Some(expect_key(*key_kind, &key).and_then(|()| expect_element(value_kind, &value))),
            _ => None,
        })?;
        let unchanged = {
            let data = self.inner.borrow();
            match &data.fields[index] {
                FieldValue::Map(map) => map.get(&key).is_some_and(|current| *current == value),
                other => return Err(stored_mismatch(index, kind, other)),
            }
        };
        if unchanged {
            self.ensure_dirty();
            return Ok(false);
        }

        let child = value.as_record().cloned();
        {
            let mut data = self.inner.borrow_mut();
            if let FieldValue::Map(map) = &mut data.fields[index] {
                map.insert(key.clone(), value);
            }
            data.mark_changed(index, Some(ElementKey::Key(key)));
        }
        self.finish_element_change(index, child)
    }

    pub fn set_map_value(&self, index: usize, key: impl Into<MapKey>, value: impl Into<Value>) -> bool {
        settle(
            "set_map_value",
            index,
            self.try_set_map_value(index, key, value),
        )
    }
}

fn expect_element(kind: &ElementKind, value: &Value) -> Result<(), SmolStr> {
    if value.fits(kind) {
        Ok(())
    } else {
        Err(value.describe())
    }
}

fn expect_key(kind: ScalarKind, key: &MapKey) -> Result<(), SmolStr> {
    if key.kind() == kind {
        Ok(())
    } else {
        Err(SmolStr::new_static(key.kind().name()))
    }
}

// Stored value disagrees with the declared collection kind.
fn stored_mismatch(index: usize, expected: FieldKind, stored: &FieldValue) -> RecordError {
    RecordError::KindMismatch {
        index,
        expected,
        actual: stored.describe(),
    }
}
