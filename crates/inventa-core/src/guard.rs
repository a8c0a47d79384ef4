//! The permission guard contract.
//!
//! Every action resolves its caller through a [`PermissionGuard`] before any
//! validation or store mutation happens.

use std::future::Future;

use crate::{
  Result,
  access::{Actor, Permission},
};

/// Credentials presented with a request.
#[derive(Clone)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .finish()
  }
}

pub trait PermissionGuard: Send + Sync {
  /// Resolve the actor behind `credentials`.
  ///
  /// Fails with [`crate::Error::NoActiveSession`] when there are no valid
  /// credentials or the user is inactive, and with
  /// [`crate::Error::MissingPermission`] when `required` is not granted.
  fn verify(
    &self,
    credentials: Option<Credentials>,
    required: Option<Permission>,
  ) -> impl Future<Output = Result<Actor>> + Send + '_;
}
