// ─── Error ──────────────────────────────────────────────────────────────────
use smol_str::SmolStr;
use thiserror::Error;

use crate::types::FieldKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("field index {index} out of range for `{schema}` ({field_count} fields)")]
    FieldIndexOutOfRange {
        schema: SmolStr,
        index: usize,
        field_count: usize,
    },
    #[error("unknown field `{name}` on `{schema}`")]
    UnknownField { schema: SmolStr, name: SmolStr },
    #[error("kind mismatch on field {index}: expected {expected}, got {actual}")]
    KindMismatch {
        index: usize,
        expected: FieldKind,
        actual: SmolStr,
    },
    #[error("field {index} is {kind}, not a {wanted}")]
    NotACollection {
        index: usize,
        kind: FieldKind,
        wanted: &'static str,
    },
    #[error("field `{0}` declared twice")]
    DuplicateField(SmolStr),
    #[error("parent link cycle detected after {depth} hops")]
    PropagationCycle { depth: usize },
    #[error("propagation exceeded the depth limit of {limit}")]
    PropagationTooDeep { limit: usize },
}
