//! Core types, contracts and services for the Inventa material catalog.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::InventoryStore`] and
//! [`audit::AuditLog`]; the HTTP layer supplies a [`guard::PermissionGuard`].

// Trait futures declare their `Send` bounds explicitly where it matters.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod audit;
pub mod characteristic;
pub mod error;
pub mod guard;
pub mod history;
pub mod material;
pub mod service;
pub mod store;
pub mod tag;
pub mod validate;
pub mod value;

pub use error::{Error, Result};
