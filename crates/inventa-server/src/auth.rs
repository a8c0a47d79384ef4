//! HTTP Basic permission guard and the [`Authorized`] extractor.

use std::{marker::PhantomData, sync::Arc};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use inventa_core::{
  Error, Result,
  access::{Actor, Permission},
  audit::AuditLog,
  guard::{Credentials, PermissionGuard},
  store::InventoryStore,
};

use crate::{AppState, ApiError};

// ─── Guard ───────────────────────────────────────────────────────────────────

/// Resolves Basic credentials against the user table.
///
/// The user must exist, be active and present the password matching their
/// argon2 hash. Their role supplies the permissions.
pub struct BasicGuard<S> {
  store: Arc<S>,
}

impl<S> BasicGuard<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S: InventoryStore> PermissionGuard for BasicGuard<S> {
  async fn verify(
    &self,
    credentials: Option<Credentials>,
    required: Option<Permission>,
  ) -> Result<Actor> {
    let credentials = credentials.ok_or(Error::NoActiveSession)?;

    let principal = self
      .store
      .find_principal(credentials.email)
      .await
      .map_err(Error::storage)?
      .filter(|p| p.user.active)
      .ok_or(Error::NoActiveSession)?;

    let parsed_hash =
      PasswordHash::new(&principal.password_hash).map_err(|_| Error::NoActiveSession)?;
    Argon2::default()
      .verify_password(credentials.password.as_bytes(), &parsed_hash)
      .map_err(|_| Error::NoActiveSession)?;

    let actor = Actor::from_principal(&principal);
    if let Err(e) = actor.require(required) {
      tracing::info!(user = %actor.email, ?required, "permission denied");
      return Err(e);
    }
    Ok(actor)
  }
}

/// Decode an `Authorization: Basic` header into `email:password`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;

  let decoded = B64.decode(encoded).ok()?;
  let creds = std::str::from_utf8(&decoded).ok()?;
  let (email, password) = creds.split_once(':')?;

  Some(Credentials { email: email.to_owned(), password: password.to_owned() })
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// What a route demands of its caller.
pub trait Requirement: Send + Sync + 'static {
  const PERMISSION: Option<Permission>;
}

macro_rules! requirements {
  ($($(#[$meta:meta])* $name:ident => $permission:expr;)*) => {
    $(
      $(#[$meta])*
      pub struct $name;

      impl Requirement for $name {
        const PERMISSION: Option<Permission> = $permission;
      }
    )*
  };
}

requirements! {
  /// Any authenticated, active user.
  Session => None;
  CreateCharacteristics => Some(Permission::CharacteristicCreate);
  EditCharacteristics => Some(Permission::CharacteristicEdit);
  CreateTags => Some(Permission::TagCreate);
  EditTags => Some(Permission::TagEdit);
  CreateMaterials => Some(Permission::MaterialCreate);
  EditMaterials => Some(Permission::MaterialEdit);
  CreateRoles => Some(Permission::RoleCreate);
  EditRoles => Some(Permission::RoleEdit);
  ViewAudit => Some(Permission::AuditView);
}

/// The caller, verified against requirement `R`.
///
/// Extracted from request parts, so it runs before any body extractor.
pub struct Authorized<R> {
  pub actor:   Actor,
  requirement: PhantomData<R>,
}

impl<S, R> FromRequestParts<AppState<S>> for Authorized<R>
where
  S: InventoryStore + AuditLog,
  R: Requirement,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let credentials = basic_credentials(&parts.headers);
    let actor = state.guard.verify(credentials, R::PERMISSION).await?;
    Ok(Self { actor, requirement: PhantomData })
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::{body::Body, http::Request};
  use inventa_core::access::{NewUser, RoleInput};
  use inventa_store_sqlite::SqliteStore;
  use rand_core::OsRng;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let entity = store.add_entity("Acme".into()).await.unwrap().id;
    let role = store
      .insert_role(entity, RoleInput {
        name:        "Taggers".into(),
        permissions: BTreeSet::from([Permission::TagEdit]),
      })
      .await
      .unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();
    store
      .insert_user(entity, NewUser {
        email:         "ops@example.com".into(),
        name:          "Ops".into(),
        password_hash: hash,
        role_id:       role.id,
      })
      .await
      .unwrap();
    AppState::new(store)
  }

  async fn extract<R: Requirement>(
    req: Request<Body>,
    state: &AppState<SqliteStore>,
  ) -> Result<Authorized<R>, ApiError> {
    let (mut parts, _) = req.into_parts();
    Authorized::<R>::from_request_parts(&mut parts, state).await
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  fn request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder();
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn correct_credentials() {
    let state = make_state().await;
    let req = request(Some(&basic("OPS@example.com", "secret")));

    let authorized = extract::<EditTags>(req, &state).await.unwrap();
    assert_eq!(authorized.actor.email, "ops@example.com");
    assert!(authorized.actor.can(Permission::TagEdit));
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state().await;
    let req = request(Some(&basic("ops@example.com", "wrong")));
    assert!(matches!(
      extract::<Session>(req, &state).await,
      Err(ApiError(Error::NoActiveSession))
    ));
  }

  #[tokio::test]
  async fn unknown_user() {
    let state = make_state().await;
    let req = request(Some(&basic("nobody@example.com", "secret")));
    assert!(matches!(
      extract::<Session>(req, &state).await,
      Err(ApiError(Error::NoActiveSession))
    ));
  }

  #[tokio::test]
  async fn inactive_user() {
    let state = make_state().await;
    let principal = state
      .store
      .find_principal("ops@example.com".into())
      .await
      .unwrap()
      .unwrap();
    state
      .store
      .set_user_active(principal.user.id, principal.user.entity_id, false)
      .await
      .unwrap()
      .unwrap();

    let req = request(Some(&basic("ops@example.com", "secret")));
    assert!(matches!(
      extract::<Session>(req, &state).await,
      Err(ApiError(Error::NoActiveSession))
    ));
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state().await;
    assert!(matches!(
      extract::<Session>(request(None), &state).await,
      Err(ApiError(Error::NoActiveSession))
    ));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state().await;
    let req = request(Some("Basic !!!not-base64!!!"));
    assert!(matches!(
      extract::<Session>(req, &state).await,
      Err(ApiError(Error::NoActiveSession))
    ));
  }

  #[tokio::test]
  async fn missing_permission() {
    let state = make_state().await;
    let req = request(Some(&basic("ops@example.com", "secret")));
    assert!(matches!(
      extract::<CreateTags>(req, &state).await,
      Err(ApiError(Error::MissingPermission(Permission::TagCreate)))
    ));
  }
}
