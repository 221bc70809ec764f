//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` row struct matching the database columns
//! - A conversion into the `hyde_core` domain type where one exists
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod playlist;
pub mod session;
pub mod track;
pub mod user;
