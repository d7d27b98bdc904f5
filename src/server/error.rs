//! HTTP error responses

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use validator::ValidationErrors;

use super::handlers::TranslateRequest;
use crate::translate::llm::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid request body: {0}")]
    Malformed(String),

    #[error(transparent)]
    Upstream(#[from] ProviderError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": field_errors_by_wire_name(&errors) }),
            ),
            Self::Malformed(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": { "body": [{ "code": "invalid_body", "message": message }] } }),
            ),
            Self::Upstream(e) => {
                tracing::error!(
                    status = ?e.status(),
                    body = e.upstream_body().unwrap_or_default(),
                    "Translation failed: {}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Field errors keyed by the names clients use (`fromLang`, not `from_lang`).
fn field_errors_by_wire_name(errors: &ValidationErrors) -> Value {
    let fields: Map<String, Value> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (TranslateRequest::wire_name(&*field).to_string(), json!(errs)))
        .collect();
    Value::Object(fields)
}
