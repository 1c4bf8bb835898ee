//! Embedded storage engine
//!
//! `NativeStore` keeps statements in SQLite and hands out connections through
//! a single creation entry point, `get_connection()`, which takes no per-call
//! parameter and delegates to an installed `ConnectionHook`. Everything the
//! coordination layer does is plugged in through that hook.

mod changes;
mod index_def;
mod native;
mod traits;

pub use changes::ChangeSet;
pub use index_def::{IndexDefinition, IndexSpec, Position, DEFAULT_INDEXES};
pub use native::{NativeConnection, NativeStore};
pub use traits::{ConnectionHook, DefaultHook, SailConnection, SailError, SailResult};
