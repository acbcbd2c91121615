//! Change tracking for hierarchical records.
//!
//! A [`Record`] has a fixed, schema-defined list of fields. Every field has a
//! dirty bit; list and map fields also track which elements changed. Nested
//! records hold a weak link to the record that contains them, and a change
//! anywhere in the tree marks the containing slot dirty on every ancestor.
//!
//! ```
//! use dirty_record::{DirtyTracked, Record, ScalarKind, Schema};
//!
//! let profile = Schema::builder("Profile")
//!     .scalar("bio", ScalarKind::Str)
//!     .build()
//!     .unwrap();
//! let user = Schema::builder("User")
//!     .scalar("name", ScalarKind::Str)
//!     .record("profile", "Profile")
//!     .build()
//!     .unwrap();
//!
//! let u = Record::new(&user);
//! u.set(1, Record::new(&profile));
//! u.reset_dirty();
//!
//! u.get_record(1).unwrap().set(0, "hello");
//! assert!(u.is_field_dirty(1));
//! assert_eq!(u.dirty_field_indexes(), vec![1]);
//! ```

pub mod config;
pub mod dirty;
pub mod error;
pub mod record;
pub mod schema;
pub mod types;
pub mod value;

pub use config::TrackerConfig;
pub use dirty::{DirtyIndexes, DirtyState};
pub use error::RecordError;
pub use record::{DirtyTracked, ParentLink, Record};
pub use schema::{FieldDef, Schema, SchemaBuilder};
pub use types::{ElementKey, ElementKind, FieldKind, ScalarKind};
pub use value::{FieldMap, FieldValue, MapKey, Number, Value};
