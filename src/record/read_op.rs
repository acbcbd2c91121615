use smol_str::SmolStr;

use super::Record;
use crate::value::{FieldMap, FieldValue, MapKey, Value};

impl Record {
    /// Read field `index`. `None` if the index is out of range.
    ///
    /// Every nested record in the value (the field's own record, or record
    /// elements of a list or map) is re-linked to `(self, index)` on every
    /// call, so the record that last handed a child out is the one its
    /// changes reach.
    pub fn get(&self, index: usize) -> Option<FieldValue> {
        let value = self.inner.borrow().fields.get(index).cloned()?;
        self.adopt(index, &value);
        Some(value)
    }

    pub fn get_by_name(&self, name: &str) -> Option<FieldValue> {
        let index = self.inner.borrow().schema.field_index(name)?;
        self.get(index)
    }

    /// Nested record at `index`, re-linked to this record.
    pub fn get_record(&self, index: usize) -> Option<Record> {
        let child = self
            .inner
            .borrow()
            .fields
            .get(index)
            .and_then(FieldValue::as_record)
            .cloned()?;
        child.set_parent_link(self, index);
        Some(child)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Typed scalar getters. Zero value on type mismatch or invalid index.
    // ════════════════════════════════════════════════════════════════════════

    fn read_scalar<T>(&self, index: usize, f: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
        let data = self.inner.borrow();
        data.fields.get(index)?.as_scalar().and_then(f)
    }

    pub fn get_str(&self, index: usize) -> SmolStr {
        self.read_scalar(index, |v| match v {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn get_i64(&self, index: usize) -> i64 {
        self.read_scalar(index, Value::as_i64).unwrap_or(0)
    }

    pub fn get_u64(&self, index: usize) -> u64 {
        self.read_scalar(index, Value::as_u64).unwrap_or(0)
    }

    pub fn get_f64(&self, index: usize) -> f64 {
        self.read_scalar(index, Value::as_f64).unwrap_or(0.0)
    }

    pub fn get_bool(&self, index: usize) -> bool {
        self.read_scalar(index, Value::as_bool).unwrap_or(false)
    }

    pub fn get_bytes(&self, index: usize) -> Vec<u8> {
        self.read_scalar(index, |v| v.as_bytes().map(<[u8]>::to_vec))
            .unwrap_or_default()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Collections
    // ════════════════════════════════════════════════════════════════════════

    // Record elements handed out by these getters are re-linked like `get`.

    pub fn get_list(&self, index: usize) -> Vec<Value> {
        let items = {
            let data = self.inner.borrow();
            data.fields
                .get(index)
                .and_then(FieldValue::as_list)
                .map(<[Value]>::to_vec)
                .unwrap_or_default()
        };
        self.adopt_elements(index, &items);
        items
    }

    pub fn list_len(&self, index: usize) -> usize {
        let data = self.inner.borrow();
        data.fields
            .get(index)
            .and_then(FieldValue::as_list)
            .map_or(0, <[Value]>::len)
    }

    /// Element `position` of list field `index`.
    pub fn get_element(&self, index: usize, position: usize) -> Option<Value> {
        let value = self
            .inner
            .borrow()
            .fields
            .get(index)
            .and_then(FieldValue::as_list)
            .and_then(|items| items.get(position))
            .cloned()?;
        self.adopt_elements(index, std::slice::from_ref(&value));
        Some(value)
    }

    pub fn get_map(&self, index: usize) -> FieldMap<MapKey, Value> {
        let map = {
            let data = self.inner.borrow();
            data.fields
                .get(index)
                .and_then(FieldValue::as_map)
                .cloned()
                .unwrap_or_default()
        };
        for child in map.values().filter_map(Value::as_record) {
            child.set_parent_link(self, index);
        }
        map
    }

    pub fn get_map_value(&self, index: usize, key: impl Into<MapKey>) -> Option<Value> {
        let key = key.into();
        let value = self
            .inner
            .borrow()
            .fields
            .get(index)
            .and_then(FieldValue::as_map)
            .and_then(|m| m.get(&key))
            .cloned()?;
        self.adopt_elements(index, std::slice::from_ref(&value));
        Some(value)
    }

    fn adopt_elements(&self, index: usize, values: &[Value]) {
        for child in values.iter().filter_map(Value::as_record) {
            child.set_parent_link(self, index);
        }
    }
}
