//! In-memory document store

use async_trait::async_trait;
use medrec_core::{Observation, Patient, ResourceId};
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, missing_subject};

#[derive(Default)]
struct Collections {
    patients: Vec<Patient>,
    observations: Vec<Observation>,
}

/// Process-local store for development and tests.
///
/// Keeps the same contract as the PostgreSQL store, including the
/// subject check on observation writes and the cascade on patient delete.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        Ok(self.inner.read().await.patients.clone())
    }

    async fn get_patient(&self, id: ResourceId) -> Result<Option<Patient>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_patient(&self, patient: &Patient) -> Result<(), StoreError> {
        self.inner.write().await.patients.push(patient.clone());
        Ok(())
    }

    async fn replace_patient(&self, patient: &Patient) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.patients.iter_mut().find(|p| p.id == patient.id) {
            Some(slot) => {
                *slot = patient.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_patient(&self, id: ResourceId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.patients.len();
        inner.patients.retain(|p| p.id != id);
        if inner.patients.len() == before {
            return Ok(false);
        }
        inner.observations.retain(|o| o.subject != id);
        Ok(true)
    }

    async fn list_observations(&self) -> Result<Vec<Observation>, StoreError> {
        Ok(self.inner.read().await.observations.clone())
    }

    async fn get_observation(&self, id: ResourceId) -> Result<Option<Observation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.observations.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_observation(&self, observation: &Observation) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.patients.iter().any(|p| p.id == observation.subject) {
            return Err(missing_subject(observation.subject));
        }
        inner.observations.push(observation.clone());
        Ok(())
    }

    async fn replace_observation(&self, observation: &Observation) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.patients.iter().any(|p| p.id == observation.subject) {
            return Err(missing_subject(observation.subject));
        }
        match inner.observations.iter_mut().find(|o| o.id == observation.id) {
            Some(slot) => {
                *slot = observation.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_observation(&self, id: ResourceId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.observations.len();
        inner.observations.retain(|o| o.id != id);
        Ok(inner.observations.len() < before)
    }
}
