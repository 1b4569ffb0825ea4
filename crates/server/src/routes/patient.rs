//! Patient resource HTTP handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use medrec_core::{Patient, PatientDraft};
use serde_json::Value as JsonValue;

use super::parse_id;
use crate::db::{PatientRepository, Store};
use crate::error::{AppError, Message};

const RESOURCE: &str = "Patient";

/// GET /patients - List all patients
pub async fn list(State(store): State<Store>) -> Result<Json<Vec<Patient>>, AppError> {
    let repo = PatientRepository::new(store);
    Ok(Json(repo.list().await?))
}

/// GET /patients/{id} - Read a patient
pub async fn read(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let repo = PatientRepository::new(store);

    match repo.get(id).await? {
        Some(patient) => Ok(Json(patient)),
        None => Err(not_found()),
    }
}

/// POST /patients - Create a new patient
pub async fn create(
    State(store): State<Store>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let draft = PatientDraft::from_json(body)?;

    let repo = PatientRepository::new(store);
    let patient = repo.create(draft).await?;

    let location = format!("/patients/{}", patient.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(patient),
    ))
}

/// PUT /patients/{id} - Merge the supplied fields into a patient
pub async fn update(
    State(store): State<Store>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<Patient>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let Json(body) = body?;

    let repo = PatientRepository::new(store);
    match repo.update(id, body).await? {
        Some(patient) => Ok(Json(patient)),
        None => Err(not_found()),
    }
}

/// DELETE /patients/{id} - Delete a patient and its observations
pub async fn delete(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let repo = PatientRepository::new(store);

    if repo.delete(id).await? {
        Ok(Json(Message::new("Patient deleted")))
    } else {
        Err(not_found())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Patient not found".to_string())
}
