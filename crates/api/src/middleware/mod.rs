//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller behind a valid Bearer token.
//! - [`rbac::RequireAdmin`] -- additionally requires the `admin` role.

pub mod auth;
pub mod rbac;
