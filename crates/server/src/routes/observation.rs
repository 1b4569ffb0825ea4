//! Observation resource HTTP handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use medrec_core::{Observation, ObservationDraft};
use serde_json::Value as JsonValue;

use super::parse_id;
use crate::db::{ObservationRepository, Store};
use crate::error::{AppError, Message};

const RESOURCE: &str = "Observation";

/// GET /observations
pub async fn list(State(store): State<Store>) -> Result<Json<Vec<Observation>>, AppError> {
    let repo = ObservationRepository::new(store);
    Ok(Json(repo.list().await?))
}

/// GET /observations/{id}
pub async fn read(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<Json<Observation>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let repo = ObservationRepository::new(store);

    repo.get(id).await?.map(Json).ok_or_else(not_found)
}

/// POST /observations - Record an observation about an existing patient
pub async fn create(
    State(store): State<Store>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let draft = ObservationDraft::from_json(body)?;

    let repo = ObservationRepository::new(store);
    let observation = repo.create(draft).await?;

    let location = format!("/observations/{}", observation.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(observation),
    ))
}

/// PUT /observations/{id}
pub async fn update(
    State(store): State<Store>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<Observation>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let Json(body) = body?;

    let repo = ObservationRepository::new(store);
    repo.update(id, body).await?.map(Json).ok_or_else(not_found)
}

/// DELETE /observations/{id}
pub async fn delete(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let repo = ObservationRepository::new(store);

    if repo.delete(id).await? {
        Ok(Json(Message::new("Observation deleted")))
    } else {
        Err(not_found())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Observation not found".to_string())
}
