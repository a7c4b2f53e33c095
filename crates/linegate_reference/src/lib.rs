//! In-memory joined view over the two reference tables.
//!
//! The index is built once at startup from the device table and the batch
//! quality table, and is read-only afterwards - safe for concurrent lookups
//! without synchronization. Keys are the trimmed string form of the source
//! identifier; lookups are case-sensitive exact match on trimmed strings.

mod error;
mod index;
mod loader;

pub use error::LoadError;
pub use index::{ReferenceIndex, DEFAULT_COMPLIANCE};
pub use loader::{BATCH_KEY_COLUMN, DEVICE_KEY_COLUMN};
