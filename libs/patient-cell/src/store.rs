// libs/patient-cell/src/store.rs
//
// Patients are plain records, so the store surface is the bare CRUD
// primitive. Doctors, prescriptions, and lab requests follow this same
// shape in their own cells.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;
use shared_models::AppError;

use crate::models::Patient;

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Patient>, AppError>;
    async fn fetch(&self, id: Uuid) -> Result<Option<Patient>, AppError>;
    async fn insert(&self, patient: &Patient) -> Result<(), AppError>;
    async fn put(&self, patient: &Patient) -> Result<(), AppError>;
    async fn remove(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Default)]
pub struct InMemoryPatientStore {
    rows: RwLock<HashMap<Uuid, Patient>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn list(&self) -> Result<Vec<Patient>, AppError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, patient: &Patient) -> Result<(), AppError> {
        self.rows.write().await.insert(patient.id, patient.clone());
        Ok(())
    }

    async fn put(&self, patient: &Patient) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&patient.id) {
            return Err(AppError::not_found("patient", patient.id));
        }
        rows.insert(patient.id, patient.clone());
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

pub struct SupabasePatientStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePatientStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn row_body(patient: &Patient) -> Result<Value, AppError> {
        serde_json::to_value(patient)
            .map_err(|e| AppError::Database(format!("Failed to encode patient: {}", e)))
    }
}

#[async_trait]
impl PatientStore for SupabasePatientStore {
    async fn list(&self) -> Result<Vec<Patient>, AppError> {
        self.supabase
            .request::<Vec<Patient>>(Method::GET, "/rest/v1/patients", None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let mut rows = self
            .supabase
            .request::<Vec<Patient>>(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn insert(&self, patient: &Patient) -> Result<(), AppError> {
        debug!("Inserting patient {}", patient.id);

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                None,
                Some(Self::row_body(patient)?),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppError::Database("Insert returned no rows".to_string()));
        }
        Ok(())
    }

    async fn put(&self, patient: &Patient) -> Result<(), AppError> {
        debug!("Replacing patient {}", patient.id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient.id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(Self::row_body(patient)?),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppError::not_found("patient", patient.id));
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        debug!("Deleting patient {}", id);

        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(!result.is_empty())
    }
}
