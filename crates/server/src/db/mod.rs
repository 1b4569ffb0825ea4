//! Document storage behind the resource repositories

mod memory;
mod postgres;
mod repository;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{ObservationRepository, PatientRepository};

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, Runtime};
use medrec_core::{Observation, Patient, ResourceId};
use thiserror::Error;
use tokio_postgres::NoTls;

use crate::config::{Config as AppConfig, StorageBackend};

/// Shared handle to the configured store, injected into repositories
pub type Store = Arc<dyn DocumentStore>;

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create database pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("Database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Stored document is unreadable: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write named a record that does not exist
    #[error("{0}")]
    MissingReference(String),
}

/// Persistence for patients and observations, keyed by resource id.
///
/// Lists return records in insertion order. Replacements are
/// last-writer-wins. Deleting a patient also deletes every observation
/// whose subject it is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError>;
    async fn get_patient(&self, id: ResourceId) -> Result<Option<Patient>, StoreError>;
    async fn insert_patient(&self, patient: &Patient) -> Result<(), StoreError>;
    /// Returns false if no patient with that id exists
    async fn replace_patient(&self, patient: &Patient) -> Result<bool, StoreError>;
    /// Returns false if no patient with that id exists
    async fn delete_patient(&self, id: ResourceId) -> Result<bool, StoreError>;

    async fn list_observations(&self) -> Result<Vec<Observation>, StoreError>;
    async fn get_observation(&self, id: ResourceId) -> Result<Option<Observation>, StoreError>;
    /// Fails with `MissingReference` if the subject patient does not exist
    async fn insert_observation(&self, observation: &Observation) -> Result<(), StoreError>;
    async fn replace_observation(&self, observation: &Observation) -> Result<bool, StoreError>;
    async fn delete_observation(&self, id: ResourceId) -> Result<bool, StoreError>;
}

/// Create a connection pool from a database URL
pub fn create_pool(database_url: &str) -> Result<Pool, StoreError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    Ok(cfg.create_pool(Some(Runtime::Tokio1), NoTls)?)
}

/// Open the store selected by configuration, applying the schema if needed
pub async fn connect(config: &AppConfig) -> Result<Store, StoreError> {
    match config.storage {
        StorageBackend::Postgres => {
            let store = PgStore::new(create_pool(&config.database_url)?);
            store.migrate().await?;
            tracing::info!("Using PostgreSQL document store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn missing_subject(subject: ResourceId) -> StoreError {
    StoreError::MissingReference(format!(
        "Observation validation failed: subject Patient/{} does not exist",
        subject
    ))
}
