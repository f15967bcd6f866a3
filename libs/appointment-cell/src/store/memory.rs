// libs/appointment-cell/src/store/memory.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{Appointment, AppointmentFilter};
use super::AppointmentStore;

/// Process-local backend: a map of rows plus an atomic appointment-number
/// sequence. Used by tests and by deployments that run without Supabase.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    rows: RwLock<HashMap<Uuid, Appointment>>,
    sequence: AtomicI64,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|row| filter.matches(row)).cloned().collect())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;
        rows.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn put(&self, appointment: &Appointment) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&appointment.id) {
            return Err(AppError::not_found("appointment", appointment.id));
        }
        rows.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(&id).is_some())
    }

    async fn next_appointment_number(&self) -> Result<i64, AppError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
