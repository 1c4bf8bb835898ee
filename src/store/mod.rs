//! Connection coordination in front of the native engine
//!
//! `TripleStore` installs a `ConnectionPolicy` as the engine's connection
//! hook. The policy decides, per creation call, whether the engine hands back
//! a raw connection or an `EnrichingConnection`, and wraps either in a
//! `ReadonlyGuard` while the store is read-only.

mod collaborators;
mod dispatch;
mod enriching;
mod factory;
mod readonly;

pub use collaborators::Collaborators;
pub use dispatch::{ConnectionMode, ModeState};
pub use enriching::EnrichingConnection;
pub use factory::{StoreError, StoreResult, TripleStore};
pub use readonly::ReadonlyGuard;
