//! PostgreSQL document store

use async_trait::async_trait;
use deadpool_postgres::Pool;
use medrec_core::{Observation, Patient, ResourceId};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;

use super::{DocumentStore, StoreError, missing_subject};

const SCHEMA: &str = include_str!("schema.sql");

/// PostgreSQL-backed store keeping each record as a JSONB document
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }

    async fn query_documents<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client.query(sql, &[]).await?;
        rows.iter().map(decode::<T>).collect()
    }

    async fn query_document<T: DeserializeOwned>(
        &self,
        sql: &str,
        id: ResourceId,
    ) -> Result<Option<T>, StoreError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(sql, &[id.as_uuid()]).await?;
        row.as_ref().map(decode::<T>).transpose()
    }

    async fn delete_by_id(&self, sql: &str, id: ResourceId) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let affected = client.execute(sql, &[id.as_uuid()]).await?;
        Ok(affected > 0)
    }
}

fn decode<T: DeserializeOwned>(row: &Row) -> Result<T, StoreError> {
    let data: JsonValue = row.get(0);
    Ok(serde_json::from_value(data)?)
}

/// Translate a foreign-key violation on `observations.subject`
fn subject_violation(err: tokio_postgres::Error, subject: ResourceId) -> StoreError {
    if err.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
        missing_subject(subject)
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        self.query_documents("SELECT data FROM patients ORDER BY seq")
            .await
    }

    async fn get_patient(&self, id: ResourceId) -> Result<Option<Patient>, StoreError> {
        self.query_document("SELECT data FROM patients WHERE id = $1", id)
            .await
    }

    async fn insert_patient(&self, patient: &Patient) -> Result<(), StoreError> {
        let data = serde_json::to_value(patient)?;
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO patients (id, data) VALUES ($1, $2)",
                &[patient.id.as_uuid(), &data],
            )
            .await?;
        Ok(())
    }

    async fn replace_patient(&self, patient: &Patient) -> Result<bool, StoreError> {
        let data = serde_json::to_value(patient)?;
        let client = self.pool.get().await?;
        let affected = client
            .execute(
                "UPDATE patients SET data = $2 WHERE id = $1",
                &[patient.id.as_uuid(), &data],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn delete_patient(&self, id: ResourceId) -> Result<bool, StoreError> {
        // observations go with it through ON DELETE CASCADE
        self.delete_by_id("DELETE FROM patients WHERE id = $1", id)
            .await
    }

    async fn list_observations(&self) -> Result<Vec<Observation>, StoreError> {
        self.query_documents("SELECT data FROM observations ORDER BY seq")
            .await
    }

    async fn get_observation(&self, id: ResourceId) -> Result<Option<Observation>, StoreError> {
        self.query_document("SELECT data FROM observations WHERE id = $1", id)
            .await
    }

    async fn insert_observation(&self, observation: &Observation) -> Result<(), StoreError> {
        let data = serde_json::to_value(observation)?;
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO observations (id, subject, data) VALUES ($1, $2, $3)",
                &[
                    observation.id.as_uuid(),
                    observation.subject.as_uuid(),
                    &data,
                ],
            )
            .await
            .map_err(|e| subject_violation(e, observation.subject))?;
        Ok(())
    }

    async fn replace_observation(&self, observation: &Observation) -> Result<bool, StoreError> {
        let data = serde_json::to_value(observation)?;
        let client = self.pool.get().await?;
        let affected = client
            .execute(
                "UPDATE observations SET subject = $2, data = $3 WHERE id = $1",
                &[
                    observation.id.as_uuid(),
                    observation.subject.as_uuid(),
                    &data,
                ],
            )
            .await
            .map_err(|e| subject_violation(e, observation.subject))?;
        Ok(affected > 0)
    }

    async fn delete_observation(&self, id: ResourceId) -> Result<bool, StoreError> {
        self.delete_by_id("DELETE FROM observations WHERE id = $1", id)
            .await
    }
}
