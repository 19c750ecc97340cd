//! tk-core: stable foundation for tokwire.
//!
//! Contains:
//! - ids (stable compact IDs for graph arenas)
//! - error (shared error types)

pub mod error;
pub mod ids;

pub use error::{CoreError, CoreResult};
pub use ids::*;
