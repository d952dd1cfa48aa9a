//! The HTTP façade's error type: translates `DecisionError` into the status
//! codes and RFC 7807 problem bodies the spec's external-interfaces section
//! specifies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eir_core::DecisionError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

/// Thin wrapper so `DecisionError` can be returned directly from axum
/// handlers via `?`.
#[derive(Debug)]
pub struct AppError(pub DecisionError);

impl From<DecisionError> for AppError {
    fn from(err: DecisionError) -> Self {
        AppError(err)
    }
}

fn status_for(err: &DecisionError) -> StatusCode {
    match err {
        DecisionError::Overload => StatusCode::SERVICE_UNAVAILABLE,
        DecisionError::Unknown | DecisionError::NotFound => StatusCode::NOT_FOUND,
        DecisionError::InvalidParameter
        | DecisionError::InvalidValue
        | DecisionError::InvalidLength
        | DecisionError::InvalidColor
        | DecisionError::ColorConflict
        | DecisionError::ImeiExist
        | DecisionError::RangeExist => StatusCode::BAD_REQUEST,
        DecisionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ProblemDetails {
            problem_type: format!("https://eir.local/problems/{}", self.0.code()),
            title: self.0.code().replace('_', " "),
            status: status.as_u16(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
