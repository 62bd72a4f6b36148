//! Domain types shared by every Outreach crate.
//!
//! - [`project`] -- the `Project` entity, its create/update inputs, ordering
//!   and merge helpers, and client-side filtering.
//! - [`error`] -- [`CoreError`](error::CoreError), the domain error type.

pub mod error;
pub mod project;
pub mod roles;
pub mod types;
