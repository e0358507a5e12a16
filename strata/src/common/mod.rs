//! Shared types and helpers used across strata.
//!
//! - [`Value`]: the tagged value stored in document fields
//! - [`Atomic`]: shared, lock-protected state (`Arc<RwLock<T>>`)
//! - reserved field names and the embedded-path separator

mod constants;
mod type_utils;
mod value;

pub use constants::*;
pub use type_utils::*;
pub use value::*;
