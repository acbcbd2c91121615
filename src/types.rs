use std::fmt;

use smol_str::SmolStr;

use crate::value::MapKey;

// ─── Bitmap Layout ──────────────────────────────────────────────────────────
//
//  field index i  →  word  i / WORD_BITS
//                    bit   i % WORD_BITS
//
//  ≤ 64 fields   : one inline u64
//  > 64 fields   : Box<[u64]> of ceil(n / 64) words

pub const WORD_BITS: usize = u64::BITS as usize;

/// Number of bitmap words needed for `field_count` fields.
#[inline]
pub const fn words_for(field_count: usize) -> usize {
    field_count.div_ceil(WORD_BITS)
}

pub const DEFAULT_MAX_PROPAGATION_DEPTH: usize = 1024;

// ─── Kinds ──────────────────────────────────────────────────────────────────

/// Scalar kinds a field, list element, map key or map value may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I64,
    U64,
    F64,
    Str,
    Bytes,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I64 => "i64",
            ScalarKind::U64 => "u64",
            ScalarKind::F64 => "f64",
            ScalarKind::Str => "str",
            ScalarKind::Bytes => "bytes",
        }
    }

    /// Whether values of this kind can be used as a map key.
    pub fn is_key_kind(self) -> bool {
        !matches!(self, ScalarKind::F64 | ScalarKind::Bytes)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a list element or map value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Scalar(ScalarKind),
    Record(SmolStr),
}

impl ElementKind {
    pub fn record(type_name: impl Into<SmolStr>) -> Self {
        ElementKind::Record(type_name.into())
    }
}

impl From<ScalarKind> for ElementKind {
    fn from(k: ScalarKind) -> Self {
        ElementKind::Scalar(k)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Scalar(k) => write!(f, "{k}"),
            ElementKind::Record(name) => write!(f, "record<{name}>"),
        }
    }
}

/// Declared kind of a field. Nested records are referenced by type name so a
/// schema may nest itself, directly or through a list or map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Record(SmolStr),
    List(ElementKind),
    Map { key: ScalarKind, value: ElementKind },
}

impl FieldKind {
    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::List(_) | FieldKind::Map { .. })
    }

    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self, FieldKind::Record(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(k) => write!(f, "{k}"),
            FieldKind::Record(name) => write!(f, "record<{name}>"),
            FieldKind::List(k) => write!(f, "list<{k}>"),
            FieldKind::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

// ─── Element Keys ───────────────────────────────────────────────────────────

/// Identifies one element of a list or map field in the element-tracking set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKey {
    Index(usize),
    Key(MapKey),
}

impl From<usize> for ElementKey {
    fn from(i: usize) -> Self {
        ElementKey::Index(i)
    }
}

impl From<MapKey> for ElementKey {
    fn from(k: MapKey) -> Self {
        ElementKey::Key(k)
    }
}
