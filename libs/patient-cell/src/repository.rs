// libs/patient-cell/src/repository.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{NewPatient, Patient, PatientUpdate};
use crate::store::PatientStore;

pub struct PatientRepository {
    store: Arc<dyn PatientStore>,
}

impl PatientRepository {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// All patients, newest record first.
    pub async fn get_all(&self) -> Result<Vec<Patient>, AppError> {
        let mut rows = self.store.list().await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub async fn create(&self, new: NewPatient) -> Result<Uuid, AppError> {
        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone_number: new.phone_number,
            date_of_birth: new.date_of_birth,
            created_at: Utc::now(),
            updated_at: None,
        };

        debug!("Creating patient {}", patient.id);
        self.store.insert(&patient).await?;
        Ok(patient.id)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        self.store.fetch(id).await
    }

    pub async fn update(&self, id: Uuid, changes: PatientUpdate) -> Result<Patient, AppError> {
        debug!("Updating patient: {}", id);

        let mut patient = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found("patient", id))?;

        changes.apply(&mut patient);
        patient.updated_at = Some(Utc::now());

        self.store.put(&patient).await?;
        Ok(patient)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        debug!("Deleting patient: {}", id);

        if !self.store.remove(id).await? {
            return Err(AppError::not_found("patient", id));
        }
        Ok(())
    }
}
