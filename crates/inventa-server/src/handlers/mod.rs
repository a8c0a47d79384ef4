//! Route handlers, one module per resource.
//!
//! Each handler takes its [`crate::auth::Authorized`] extractor before any
//! path or body extractor, so permission failures are reported ahead of
//! malformed input.

pub mod audit;
pub mod characteristics;
pub mod files;
pub mod materials;
pub mod roles;
pub mod tags;
