//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod event_repo;
pub mod project_repo;

pub use event_repo::EventRepo;
pub use project_repo::ProjectRepo;
