//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Only business-rule failures with a stable code reach the caller. Anything
//! else is logged in full and answered with `{"error": "serverError"}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use inventa_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match &self.0 {
      Error::Validation(_) | Error::UnknownVariant(_) | Error::ShapeMismatch { .. } => {
        StatusCode::UNPROCESSABLE_ENTITY
      }
      Error::CharacteristicNotFound(_)
      | Error::TagNotFound(_)
      | Error::RoleNotFound(_)
      | Error::MaterialNotFound(_) => StatusCode::NOT_FOUND,
      Error::CharacteristicHasMaterials { .. }
      | Error::TagHasMaterials { .. }
      | Error::RoleHasUsers { .. } => StatusCode::CONFLICT,
      Error::NoActiveSession => StatusCode::UNAUTHORIZED,
      Error::MissingPermission(_) => StatusCode::FORBIDDEN,
      Error::Serialization(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let Some(code) = self.0.code() else {
      tracing::error!(error = ?self.0, "request failed");
      return (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "serverError" })),
      )
        .into_response();
    };

    let body = match &self.0 {
      Error::Validation(fields) => json!({ "error": code, "fields": fields }),
      _ => json!({ "error": code }),
    };
    let mut res = (self.status(), Json(body)).into_response();
    if matches!(self.0, Error::NoActiveSession) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"inventa\""),
      );
    }
    res
  }
}

// ─── Extractor rejections ────────────────────────────────────────────────────

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(%rejection, "rejected request body");
    Self(Error::invalid("body", "body.malformed"))
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    tracing::debug!(%rejection, "rejected path parameters");
    Self(Error::invalid("path", "path.malformed"))
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    tracing::debug!(%rejection, "rejected query string");
    Self(Error::invalid("query", "query.malformed"))
  }
}
