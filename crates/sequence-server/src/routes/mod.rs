pub mod sequences;
pub mod steps;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// GET /v1/ — liveness probe.
pub async fn index() -> &'static str {
    "It works!"
}

/// Unwrap a JSON body, turning a decode failure into a 400 with the
/// decoder's message.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
