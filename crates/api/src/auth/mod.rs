//! Bearer token verification. Tokens are issued by a separate identity
//! service; this server only checks them.

pub mod jwt;
