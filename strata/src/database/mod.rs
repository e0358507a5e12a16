//! The database handle, its builder and its configuration.

mod database;
mod database_builder;
mod database_config;

pub use database::*;
pub use database_builder::*;
pub use database_config::*;
