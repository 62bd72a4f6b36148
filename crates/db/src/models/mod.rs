//! Row structs for the database tables.
//!
//! Each submodule contains a `FromRow` struct matching the table columns.
//! Conversions into domain types live next to the row they convert.

pub mod event;
pub mod project;
