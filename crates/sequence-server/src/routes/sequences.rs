use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sequence_core::types::{parse_id, Sequence, SequenceInput, SequenceWithSteps};

use super::json_body;
use crate::error::AppError;
use crate::state::AppState;

const NOT_FOUND: &str = "Sequence not found.";

fn name_taken(owner: i64) -> AppError {
    AppError::conflict(format!("Name already assigned to sequence: {owner}"))
}

fn bad_id(raw: &str) -> AppError {
    AppError::bad_request(format!("Sequence ID must be integer: {raw}"))
}

/// POST /v1/sequences — create a sequence with a globally unique name.
pub async fn create_sequence(
    State(app): State<AppState>,
    body: Result<Json<SequenceInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Sequence>), AppError> {
    let input = json_body(body)?;
    input.validate()?;

    let sequences = app.sequences.clone();
    let created = tokio::task::spawn_blocking(move || {
        if let Some(found) = sequences.find_by_name(&input.name)? {
            return Err(name_taken(found.id));
        }
        Ok::<_, AppError>(sequences.create(&input)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /v1/sequences/:id — replace name and tracking flags. A sequence may
/// keep its own name; taking another sequence's name is a conflict.
pub async fn update_sequence(
    State(app): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<SequenceInput>, JsonRejection>,
) -> Result<Json<Sequence>, AppError> {
    let id = parse_id(&raw).ok_or_else(|| bad_id(&raw))?;
    let body = json_body(body);

    let sequences = app.sequences.clone();
    let updated = tokio::task::spawn_blocking(move || {
        let Some(mut found) = sequences.find_by_id(id)? else {
            return Err(AppError::not_found(NOT_FOUND));
        };

        let input = body?;
        input.validate()?;

        if let Some(other) = sequences.find_other_with_same_name(&input.name, id)? {
            return Err(name_taken(other.id));
        }

        sequences.update(&mut found, &input)?;
        Ok::<_, AppError>(found)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(updated))
}

/// GET /v1/sequences/:id — the sequence together with its steps.
pub async fn view_sequence_with_steps(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<SequenceWithSteps>, AppError> {
    let id = parse_id(&raw).ok_or_else(|| bad_id(&raw))?;

    let sequences = app.sequences.clone();
    let view = tokio::task::spawn_blocking(move || sequences.find_with_steps(id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    view.map(Json).ok_or_else(|| AppError::not_found(NOT_FOUND))
}
