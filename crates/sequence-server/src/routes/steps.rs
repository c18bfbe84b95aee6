use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sequence_core::types::{parse_id, RecordId, Step, StepInput};

use super::json_body;
use crate::error::AppError;
use crate::state::AppState;

const NOT_FOUND: &str = "Step not found.";
const SUBJECT_TAKEN: &str = "Subject already taken.";

fn step_id(raw: &str) -> Result<RecordId, AppError> {
    parse_id(raw).ok_or_else(|| AppError::bad_request(format!("Step ID must be integer: {raw}")))
}

/// POST /v1/sequence-steps — create a step under an existing sequence.
///
/// The parent must exist (400 otherwise) and the subject must be free within
/// that sequence (409 otherwise). Nothing is written when either check fails.
pub async fn create_step(
    State(app): State<AppState>,
    body: Result<Json<StepInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Step>), AppError> {
    let input = json_body(body)?;
    input.validate()?;

    let (sequences, steps) = (app.sequences.clone(), app.steps.clone());
    let created = tokio::task::spawn_blocking(move || {
        if sequences.find_by_id(input.sequence_id)?.is_none() {
            return Err(AppError::bad_request("Sequence not found."));
        }
        if !steps.subject_available(&input.subject, input.sequence_id)? {
            return Err(AppError::conflict(SUBJECT_TAKEN));
        }
        Ok::<_, AppError>(steps.create(&input)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /v1/sequence-steps/:id — replace subject and content. The owning
/// sequence never changes.
pub async fn update_step(
    State(app): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<StepInput>, JsonRejection>,
) -> Result<Json<Step>, AppError> {
    let id = step_id(&raw)?;
    let body = json_body(body);

    let steps = app.steps.clone();
    let updated = tokio::task::spawn_blocking(move || {
        let Some(mut found) = steps.find_by_id(id)? else {
            return Err(AppError::not_found(NOT_FOUND));
        };

        let input = body?;
        input.validate()?;

        if steps
            .find_other_with_same_subject(&input.subject, found.sequence_id, id)?
            .is_some()
        {
            return Err(AppError::conflict(SUBJECT_TAKEN));
        }

        steps.update(&mut found, &input)?;
        Ok::<_, AppError>(found)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(updated))
}

/// DELETE /v1/sequence-steps/:id — permanently remove a step.
pub async fn delete_step(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = step_id(&raw)?;

    let steps = app.steps.clone();
    tokio::task::spawn_blocking(move || {
        let Some(found) = steps.find_by_id(id)? else {
            return Err(AppError::not_found(NOT_FOUND));
        };
        steps.delete(&found)?;
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "id": id, "deleted": true })))
}

/// GET /v1/sequence-steps/:id
pub async fn view_step(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Step>, AppError> {
    let id = step_id(&raw)?;

    let steps = app.steps.clone();
    let found = tokio::task::spawn_blocking(move || steps.find_by_id(id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    found.map(Json).ok_or_else(|| AppError::not_found(NOT_FOUND))
}
