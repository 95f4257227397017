use axum::{
  http::{StatusCode, header},
  response::{Html, IntoResponse, Response},
};

use crate::pages;

/// Application error type
#[derive(Debug)]
pub enum AppError {
  SheetsError(tradebook_sheets::SheetsError),
  ValidationError(String),
  /// Missing or rejected basic-auth credentials for the named realm.
  Unauthorized(&'static str),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      AppError::SheetsError(err) => {
        // Log the detailed error server-side
        tracing::error!(?err, "Spreadsheet error occurred");

        // Don't expose remote API details
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Html(pages::error_page(
            "An internal error occurred. Please try again later.",
          )),
        )
          .into_response()
      }
      AppError::ValidationError(msg) => {
        tracing::warn!(validation_error = %msg, "Validation failed");
        (StatusCode::BAD_REQUEST, Html(pages::error_page(&msg))).into_response()
      }
      AppError::Unauthorized(realm) => (
        StatusCode::UNAUTHORIZED,
        [(
          header::WWW_AUTHENTICATE,
          format!("Basic realm=\"{realm}\", charset=\"UTF-8\""),
        )],
        Html(pages::error_page("Authentication required")),
      )
        .into_response(),
    }
  }
}

impl From<tradebook_sheets::SheetsError> for AppError {
  fn from(err: tradebook_sheets::SheetsError) -> Self {
    AppError::SheetsError(err)
  }
}

impl From<crate::validation::ValidationError> for AppError {
  fn from(err: crate::validation::ValidationError) -> Self {
    AppError::ValidationError(err.to_string())
  }
}
