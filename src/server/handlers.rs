//! Route handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{AppState, error::ApiError};
use crate::translate::normalize::TranslationResult;

/// Body of `POST /translate`. Missing fields deserialize empty and fail validation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TranslateRequest {
    #[serde(rename = "fromLang", default)]
    #[validate(length(min = 2))]
    pub from_lang: String,

    #[serde(rename = "toLang", default)]
    #[validate(length(min = 2))]
    pub to_lang: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub text: String,
}

impl TranslateRequest {
    /// JSON name of a field, as clients send it.
    pub fn wire_name(field: &str) -> &str {
        match field {
            "from_lang" => "fromLang",
            "to_lang" => "toLang",
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub backend: String,
    pub ok: bool,
    pub model: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let info = state.translator.provider().describe();
    Json(HealthResponse {
        backend: info.backend.to_string(),
        ok: true,
        model: info.model,
        base_url: info.base_url,
    })
}

pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslationResult>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let result = state
        .translator
        .translate(&request.from_lang, &request.to_lang, &request.text)
        .await?;

    Ok(Json(result))
}
