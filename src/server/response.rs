use crate::error::ScenarioError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl IntoResponse for ScenarioError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{} {}", status.as_u16(), message);
        } else {
            tracing::warn!("{} {}", status.as_u16(), message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
