pub mod health;
pub mod metrics;
mod observation;
mod patient;

use axum::{Router, routing::get};
use medrec_core::ResourceId;

use crate::db::Store;
use crate::error::AppError;

/// Build resource routes
pub fn resource_routes() -> Router<Store> {
    Router::new()
        .route("/patients", get(patient::list).post(patient::create))
        .route(
            "/patients/{id}",
            get(patient::read)
                .put(patient::update)
                .delete(patient::delete),
        )
        .route(
            "/observations",
            get(observation::list).post(observation::create),
        )
        .route(
            "/observations/{id}",
            get(observation::read)
                .put(observation::update)
                .delete(observation::delete),
        )
}

/// Parse a path id, reporting a malformed one as a 400 before any lookup
fn parse_id(raw: &str, resource: &str) -> Result<ResourceId, AppError> {
    ResourceId::parse(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} ID", resource)))
}
