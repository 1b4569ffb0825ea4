//! Resource repositories over the document store

use medrec_core::{
    Observation, ObservationDraft, ObservationPatch, Patient, PatientDraft, PatientPatch,
    ResourceId,
};
use serde_json::Value as JsonValue;

use super::{Store, missing_subject};
use crate::error::AppError;

/// Repository for Patient CRUD operations
#[derive(Clone)]
pub struct PatientRepository {
    store: Store,
}

impl PatientRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// List every patient in insertion order
    pub async fn list(&self) -> Result<Vec<Patient>, AppError> {
        Ok(self.store.list_patients().await?)
    }

    /// Get a patient by ID
    pub async fn get(&self, id: ResourceId) -> Result<Option<Patient>, AppError> {
        Ok(self.store.get_patient(id).await?)
    }

    /// Validate and persist a new patient, returning the stored record
    pub async fn create(&self, draft: PatientDraft) -> Result<Patient, AppError> {
        let patient = Patient::new(draft.validate()?);
        self.store.insert_patient(&patient).await?;
        tracing::info!(patient_id = %patient.id, "Patient created");
        Ok(patient)
    }

    /// Merge a request body into a stored patient.
    ///
    /// Returns `None` if the patient does not exist, whatever the body holds.
    pub async fn update(
        &self,
        id: ResourceId,
        body: JsonValue,
    ) -> Result<Option<Patient>, AppError> {
        let Some(current) = self.store.get_patient(id).await? else {
            return Ok(None);
        };

        let patch = PatientPatch::from_json(body)?;
        let updated = current.apply(patch)?;
        if !self.store.replace_patient(&updated).await? {
            // deleted between the read and the write
            return Ok(None);
        }
        tracing::info!(patient_id = %id, "Patient updated");
        Ok(Some(updated))
    }

    /// Delete a patient together with its observations
    pub async fn delete(&self, id: ResourceId) -> Result<bool, AppError> {
        let deleted = self.store.delete_patient(id).await?;
        if deleted {
            tracing::info!(patient_id = %id, "Patient deleted");
        }
        Ok(deleted)
    }
}

/// Repository for Observation CRUD operations.
///
/// The subject of every write must name an existing patient.
#[derive(Clone)]
pub struct ObservationRepository {
    store: Store,
}

impl ObservationRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Observation>, AppError> {
        Ok(self.store.list_observations().await?)
    }

    pub async fn get(&self, id: ResourceId) -> Result<Option<Observation>, AppError> {
        Ok(self.store.get_observation(id).await?)
    }

    pub async fn create(&self, draft: ObservationDraft) -> Result<Observation, AppError> {
        let observation = Observation::new(draft.validate()?);
        self.ensure_subject_exists(observation.subject).await?;
        self.store.insert_observation(&observation).await?;
        tracing::info!(
            observation_id = %observation.id,
            subject = %observation.subject,
            "Observation created"
        );
        Ok(observation)
    }

    pub async fn update(
        &self,
        id: ResourceId,
        body: JsonValue,
    ) -> Result<Option<Observation>, AppError> {
        let Some(current) = self.store.get_observation(id).await? else {
            return Ok(None);
        };

        let patch = ObservationPatch::from_json(body)?;

        let updated = current.apply(patch)?;
        if updated.subject != current.subject {
            self.ensure_subject_exists(updated.subject).await?;
        }
        if !self.store.replace_observation(&updated).await? {
            return Ok(None);
        }
        tracing::info!(observation_id = %id, "Observation updated");
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: ResourceId) -> Result<bool, AppError> {
        let deleted = self.store.delete_observation(id).await?;
        if deleted {
            tracing::info!(observation_id = %id, "Observation deleted");
        }
        Ok(deleted)
    }

    async fn ensure_subject_exists(&self, subject: ResourceId) -> Result<(), AppError> {
        match self.store.get_patient(subject).await? {
            Some(_) => Ok(()),
            None => Err(missing_subject(subject).into()),
        }
    }
}
