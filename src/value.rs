use serde::ser::{Serialize, Serializer};
use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::record::{Record, SeenPairs};
use crate::types::{DEFAULT_MAX_PROPAGATION_DEPTH, ElementKind, FieldKind, ScalarKind};

/// Storage of map fields. Entries stay ordered so dirty keys and snapshots
/// are deterministic.
pub type FieldMap<K, V> = BTreeMap<K, V>;

// ─── Number ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl std::fmt::Debug for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::I64(i) => write!(f, "I64({})", i),
            Number::U64(u) => write!(f, "U64({})", u),
            Number::F64(v) => write!(f, "F64({})", v),
        }
    }
}

impl Number {
    pub fn kind(self) -> ScalarKind {
        match self {
            Number::I64(_) => ScalarKind::I64,
            Number::U64(_) => ScalarKind::U64,
            Number::F64(_) => ScalarKind::F64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::I64(i) => i as f64,
            Number::U64(u) => u as f64,
            Number::F64(f) => f,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::I64(i) => Some(i),
            Number::U64(u) => i64::try_from(u).ok(),
            Number::F64(_) => None,
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            Number::U64(u) => Some(u),
            Number::I64(i) => u64::try_from(i).ok(),
            Number::F64(_) => None,
        }
    }
}

// ─── Value ──────────────────────────────────────────────────────────────────

/// A scalar field value, or one element of a list or map field. Collections
/// declared over a record type hold `Value::Record` elements.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Number(Number),
    Str(SmolStr),
    Bytes(Vec<u8>),
    Record(Record),
}

impl Value {
    /// The zero value of a scalar kind.
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::I64 => Value::Number(Number::I64(0)),
            ScalarKind::U64 => Value::Number(Number::U64(0)),
            ScalarKind::F64 => Value::Number(Number::F64(0.0)),
            ScalarKind::Str => Value::Str(SmolStr::default()),
            ScalarKind::Bytes => Value::Bytes(Vec::new()),
        }
    }

    /// `None` for a nested record.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Bool(_) => Some(ScalarKind::Bool),
            Value::Number(n) => Some(n.kind()),
            Value::Str(_) => Some(ScalarKind::Str),
            Value::Bytes(_) => Some(ScalarKind::Bytes),
            Value::Record(_) => None,
        }
    }

    /// Whether this value may be stored as an element of `kind`.
    pub fn fits(&self, kind: &ElementKind) -> bool {
        match (self, kind) {
            (Value::Record(r), ElementKind::Record(name)) => r.schema().name() == name.as_str(),
            (v, ElementKind::Scalar(k)) => v.scalar_kind() == Some(*k),
            _ => false,
        }
    }

    /// Kind name used in kind-mismatch errors.
    pub fn describe(&self) -> SmolStr {
        match self {
            Value::Record(r) => smol_str::format_smolstr!("record<{}>", r.schema().name()),
            v => v
                .scalar_kind()
                .map_or_else(SmolStr::default, |k| SmolStr::new_static(k.name())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn eq_guarded(&self, other: &Value, seen: &mut SeenPairs) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.eq_guarded(b, seen),
            _ => false,
        }
    }

    pub(crate) fn to_json(&self, depth: usize, path: &mut Vec<*const ()>) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => match n {
                Number::I64(i) => serde_json::json!(i),
                Number::U64(u) => serde_json::json!(u),
                Number::F64(f) => serde_json::json!(f),
            },
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Bytes(b) => serde_json::json!(b),
            Value::Record(r) => nested_json(r, depth, path),
        }
    }
}

/// Deep equality; nested records compare by content.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_guarded(other, &mut SeenPairs::default())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match n {
                Number::I64(i) => serializer.serialize_i64(*i),
                Number::U64(u) => serializer.serialize_u64(*u),
                Number::F64(f) => serializer.serialize_f64(*f),
            },
            Value::Str(s) => serializer.serialize_str(s.as_str()),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Record(r) => r.snapshot().serialize(serializer),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::F64(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::I64(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::U64(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<SmolStr> for Value {
    fn from(s: SmolStr) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<&Record> for Value {
    fn from(r: &Record) -> Self {
        Value::Record(r.clone())
    }
}

impl From<Value> for serde_json::Value {
    fn from(val: Value) -> Self {
        val.to_json(DEFAULT_MAX_PROPAGATION_DEPTH, &mut Vec::new())
    }
}

// ─── MapKey ─────────────────────────────────────────────────────────────────

/// Key of a map field. Floats and byte strings are not valid keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I64(i64),
    U64(u64),
    Str(SmolStr),
}

impl MapKey {
    pub fn kind(&self) -> ScalarKind {
        match self {
            MapKey::Bool(_) => ScalarKind::Bool,
            MapKey::I64(_) => ScalarKind::I64,
            MapKey::U64(_) => ScalarKind::U64,
            MapKey::Str(_) => ScalarKind::Str,
        }
    }

    /// Object key used when rendering a map as JSON.
    pub fn to_json_key(&self) -> String {
        match self {
            MapKey::Bool(b) => b.to_string(),
            MapKey::I64(i) => i.to_string(),
            MapKey::U64(u) => u.to_string(),
            MapKey::Str(s) => s.to_string(),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(SmolStr::from(s))
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::Str(SmolStr::from(s))
    }
}

impl From<i64> for MapKey {
    fn from(n: i64) -> Self {
        MapKey::I64(n)
    }
}

impl From<u64> for MapKey {
    fn from(n: u64) -> Self {
        MapKey::U64(n)
    }
}

impl From<bool> for MapKey {
    fn from(b: bool) -> Self {
        MapKey::Bool(b)
    }
}

impl TryFrom<Value> for MapKey {
    type Error = Value;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(MapKey::Bool(b)),
            Value::Number(Number::I64(i)) => Ok(MapKey::I64(i)),
            Value::Number(Number::U64(u)) => Ok(MapKey::U64(u)),
            Value::Str(s) => Ok(MapKey::Str(s)),
            other => Err(other),
        }
    }
}

// ─── FieldValue ─────────────────────────────────────────────────────────────

/// The current value of one record field.
///
/// Equality is deep: lists and maps compare element by element and nested
/// records compare by content (see `PartialEq for Record`).
#[derive(Debug, Clone)]
pub enum FieldValue {
    Scalar(Value),
    Record(Option<Record>),
    List(Vec<Value>),
    Map(FieldMap<MapKey, Value>),
}

impl FieldValue {
    /// The zero value for a declared field kind.
    pub fn zero(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Scalar(k) => FieldValue::Scalar(Value::zero(*k)),
            FieldKind::Record(_) => FieldValue::Record(None),
            FieldKind::List(_) => FieldValue::List(Vec::new()),
            FieldKind::Map { .. } => FieldValue::Map(FieldMap::new()),
        }
    }

    /// Whether this value may be stored in a field of `kind`.
    pub fn fits(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (FieldValue::Scalar(v), FieldKind::Scalar(k)) => v.scalar_kind() == Some(*k),
            (FieldValue::Record(None), FieldKind::Record(_)) => true,
            (FieldValue::Record(Some(r)), FieldKind::Record(name)) => {
                r.schema().name() == name.as_str()
            }
            (FieldValue::List(items), FieldKind::List(elem)) => items.iter().all(|v| v.fits(elem)),
            (FieldValue::Map(map), FieldKind::Map { key, value }) => map
                .iter()
                .all(|(mk, mv)| mk.kind() == *key && mv.fits(value)),
            _ => false,
        }
    }

    /// Short description of the value's shape, used in kind-mismatch errors.
    pub fn describe(&self) -> SmolStr {
        match self {
            FieldValue::Scalar(v) => v.describe(),
            FieldValue::Record(None) => SmolStr::new_static("record<none>"),
            FieldValue::Record(Some(r)) => smol_str::format_smolstr!("record<{}>", r.schema().name()),
            FieldValue::List(_) => SmolStr::new_static("list"),
            FieldValue::Map(_) => SmolStr::new_static("map"),
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(r) => r.as_ref(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FieldMap<MapKey, Value>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Every nested record held directly by this value: the record of a
    /// record field, or the record elements of a list or map.
    pub fn records(&self) -> Vec<&Record> {
        match self {
            FieldValue::Scalar(_) | FieldValue::Record(None) => Vec::new(),
            FieldValue::Record(Some(r)) => vec![r],
            FieldValue::List(items) => items.iter().filter_map(Value::as_record).collect(),
            FieldValue::Map(map) => map.values().filter_map(Value::as_record).collect(),
        }
    }

    pub(crate) fn eq_guarded(&self, other: &FieldValue, seen: &mut SeenPairs) -> bool {
        match (self, other) {
            (FieldValue::Scalar(a), FieldValue::Scalar(b)) => a.eq_guarded(b, seen),
            (FieldValue::Record(None), FieldValue::Record(None)) => true,
            (FieldValue::Record(Some(a)), FieldValue::Record(Some(b))) => a.eq_guarded(b, seen),
            (FieldValue::List(a), FieldValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_guarded(y, seen))
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.eq_guarded(vb, seen))
            }
            _ => false,
        }
    }

    /// Render as JSON. Nested records deeper than `depth` levels, or already
    /// on `path`, render as null.
    pub(crate) fn to_json(&self, depth: usize, path: &mut Vec<*const ()>) -> serde_json::Value {
        match self {
            FieldValue::Scalar(v) => v.to_json(depth, path),
            FieldValue::Record(None) => serde_json::Value::Null,
            FieldValue::Record(Some(r)) => nested_json(r, depth, path),
            FieldValue::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json(depth, path)).collect())
            }
            FieldValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_json_key(), v.to_json(depth, path)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.eq_guarded(other, &mut SeenPairs::default())
    }
}

fn nested_json(r: &Record, depth: usize, path: &mut Vec<*const ()>) -> serde_json::Value {
    match depth.checked_sub(1) {
        Some(rest) => r.snapshot_within(rest, path),
        None => serde_json::Value::Null,
    }
}

/// A record handle stored as a scalar becomes the record variant.
impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Record(r) => FieldValue::Record(Some(r)),
            v => FieldValue::Scalar(v),
        }
    }
}

impl From<Record> for FieldValue {
    fn from(r: Record) -> Self {
        FieldValue::Record(Some(r))
    }
}

impl From<&Record> for FieldValue {
    fn from(r: &Record) -> Self {
        FieldValue::Record(Some(r.clone()))
    }
}

impl From<Option<Record>> for FieldValue {
    fn from(r: Option<Record>) -> Self {
        FieldValue::Record(r)
    }
}

impl From<Vec<Value>> for FieldValue {
    fn from(items: Vec<Value>) -> Self {
        FieldValue::List(items)
    }
}

impl From<FieldMap<MapKey, Value>> for FieldValue {
    fn from(map: FieldMap<MapKey, Value>) -> Self {
        FieldValue::Map(map)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(Value::from(s))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(Value::from(s))
    }
}

impl From<SmolStr> for FieldValue {
    fn from(s: SmolStr) -> Self {
        FieldValue::Scalar(Value::Str(s))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Scalar(Value::from(n))
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Scalar(Value::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Scalar(Value::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Scalar(Value::from(b))
    }
}

/// Build a list field value from anything convertible to [`Value`].
///
/// ```ignore
/// rec.set(TAGS, list!["go", "rust"]);
/// ```
#[macro_export]
macro_rules! list {
    ($($val:expr),* $(,)?) => {
        $crate::value::FieldValue::List(vec![$($crate::value::Value::from($val)),*])
    };
}

/// Build a map field value from `key => value` pairs.
#[macro_export]
macro_rules! map {
    ($($key:expr => $val:expr),* $(,)?) => {{
        let mut map = $crate::value::FieldMap::new();
        $(
            map.insert(
                $crate::value::MapKey::from($key),
                $crate::value::Value::from($val),
            );
        )*
        $crate::value::FieldValue::Map(map)
    }};
}
