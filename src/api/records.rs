//! Record proxy handlers for the Locations and Food collections.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::documents::{Collection, RecordBatch};
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Outcome of a two-phase delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub success: bool,
    pub deleted_id: i64,
    pub attachments_cleaned: bool,
}

fn failure(action: &str, collection: Collection) -> String {
    format!("Failed to {} {}", action, collection.path())
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

pub async fn list(state: AppState, collection: Collection) -> Result<Response, ApiError> {
    let reply = state
        .documents
        .list_records(collection)
        .await
        .map_err(|e| ApiError::from_proxy(e, &failure("fetch", collection)))?;
    Ok(reply.into_response())
}

pub async fn create(
    state: AppState,
    collection: Collection,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let context = failure("create", collection);
    let batch = RecordBatch::from_create_body(json_body(body)?)
        .map_err(|e| ApiError::from_proxy(e, &context))?;

    tracing::debug!(table = state.documents.table(collection), count = batch.records.len(), "Creating records");

    let reply = state
        .documents
        .add_records(collection, &batch)
        .await
        .map_err(|e| ApiError::from_proxy(e, &context))?;
    Ok(reply.into_response())
}

pub async fn update(
    state: AppState,
    collection: Collection,
    id: i64,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let context = failure("update", collection);
    let batch = RecordBatch::from_update_body(id, json_body(body)?)
        .map_err(|e| ApiError::from_proxy(e, &context))?;

    let reply = state
        .documents
        .update_records(collection, &batch)
        .await
        .map_err(|e| ApiError::from_proxy(e, &context))?;
    Ok(reply.into_response())
}

/// Delete one record, then sweep unreferenced attachments.
///
/// A failed delete aborts before the sweep. A failed sweep does not undo
/// the delete; it is reported as `attachmentsCleaned: false`.
pub async fn delete(
    state: AppState,
    collection: Collection,
    id: i64,
) -> Result<Json<DeleteOutcome>, ApiError> {
    state
        .documents
        .delete_records(collection, &[id])
        .await
        .map_err(|e| ApiError::from_proxy(e, &failure("delete", collection)))?;

    let attachments_cleaned = match state.documents.remove_unused_attachments().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                table = state.documents.table(collection),
                deleted_id = id,
                error = %e,
                "Record deleted but attachment cleanup failed"
            );
            false
        }
    };

    Ok(Json(DeleteOutcome {
        success: true,
        deleted_id: id,
        attachments_cleaned,
    }))
}

pub async fn list_locations(State(state): State<AppState>) -> Result<Response, ApiError> {
    list(state, Collection::Locations).await
}

pub async fn create_location(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    create(state, Collection::Locations, body).await
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    update(state, Collection::Locations, id, body).await
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    delete(state, Collection::Locations, id).await
}

pub async fn list_food(State(state): State<AppState>) -> Result<Response, ApiError> {
    list(state, Collection::Food).await
}

pub async fn create_food(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    create(state, Collection::Food, body).await
}

pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    update(state, Collection::Food, id, body).await
}

pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    delete(state, Collection::Food, id).await
}
