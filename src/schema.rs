use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::RecordError;
use crate::record::Record;
use crate::types::{ElementKind, FieldKind, ScalarKind};
use crate::value::FieldValue;

// ─── FieldDef ───────────────────────────────────────────────────────────────

/// One declared field. Its position in [`Schema::fields`] is its field index.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: SmolStr,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn zero_value(&self) -> FieldValue {
        FieldValue::zero(&self.kind)
    }
}

// ─── Schema ─────────────────────────────────────────────────────────────────

/// Fixed field layout of a record type.
///
/// Field indexes are assigned in declaration order and never change. Records
/// hold an `Arc<Schema>`, so one schema is shared by every record of the type.
#[derive(Debug)]
pub struct Schema {
    name: SmolStr,
    fields: Vec<FieldDef>,
    by_name: FxHashMap<SmolStr, usize>,
}

impl Schema {
    pub fn builder(name: impl Into<SmolStr>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    #[inline]
    pub fn field(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Indexes of every list and map field, ascending.
    pub fn collection_fields(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.kind.is_collection())
            .map(|(i, _)| i)
    }

    /// Read `index` from a possibly absent record.
    ///
    /// An absent record yields the field's zero value with no side effects;
    /// a present one behaves like [`Record::get`], including the re-link of a
    /// nested child.
    pub fn field_or_zero(&self, record: Option<&Record>, index: usize) -> Option<FieldValue> {
        match record {
            Some(r) => r.get(index),
            None => self.field(index).map(FieldDef::zero_value),
        }
    }

    pub(crate) fn index_error(&self, index: usize) -> RecordError {
        RecordError::FieldIndexOutOfRange {
            schema: self.name.clone(),
            index,
            field_count: self.fields.len(),
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<usize, RecordError> {
        self.field_index(name).ok_or_else(|| RecordError::UnknownField {
            schema: self.name.clone(),
            name: SmolStr::from(name),
        })
    }
}

// ─── SchemaBuilder ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SchemaBuilder {
    name: SmolStr,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<SmolStr>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn scalar(self, name: impl Into<SmolStr>, kind: ScalarKind) -> Self {
        self.field(name, FieldKind::Scalar(kind))
    }

    pub fn record(self, name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        self.field(name, FieldKind::Record(type_name.into()))
    }

    pub fn list(self, name: impl Into<SmolStr>, element: impl Into<ElementKind>) -> Self {
        self.field(name, FieldKind::List(element.into()))
    }

    pub fn map(
        self,
        name: impl Into<SmolStr>,
        key: ScalarKind,
        value: impl Into<ElementKind>,
    ) -> Self {
        self.field(
            name,
            FieldKind::Map {
                key,
                value: value.into(),
            },
        )
    }

    /// List whose elements are records of `type_name`.
    pub fn record_list(self, name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        self.list(name, ElementKind::record(type_name))
    }

    /// Map whose values are records of `type_name`.
    pub fn record_map(
        self,
        name: impl Into<SmolStr>,
        key: ScalarKind,
        type_name: impl Into<SmolStr>,
    ) -> Self {
        self.map(name, key, ElementKind::record(type_name))
    }

    /// Finish the schema. Fails on a duplicate field name or a map keyed by
    /// a kind that cannot be a [`MapKey`](crate::value::MapKey).
    pub fn build(self) -> Result<Arc<Schema>, RecordError> {
        let mut by_name = FxHashMap::default();
        for (i, f) in self.fields.iter().enumerate() {
            if by_name.insert(f.name.clone(), i).is_some() {
                return Err(RecordError::DuplicateField(f.name.clone()));
            }
            if let FieldKind::Map { key, .. } = &f.kind {
                if !key.is_key_kind() {
                    return Err(RecordError::KindMismatch {
                        index: i,
                        expected: f.kind.clone(),
                        actual: SmolStr::new_static(key.name()),
                    });
                }
            }
        }
        Ok(Arc::new(Schema {
            name: self.name,
            fields: self.fields,
            by_name,
        }))
    }
}
