mod bitmap;
mod state;

pub use bitmap::{DirtyIndexes, FieldBitmap};
pub use state::DirtyState;
