// libs/appointment-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;
use shared_models::AppError;

use crate::models::{Appointment, AppointmentFilter};
use super::AppointmentStore;

/// Relational backend over Supabase PostgREST. Filter predicates are pushed
/// down as query-string clauses; everything else is left to the repository.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn list_path(filter: &AppointmentFilter) -> String {
        let mut query_parts = Vec::new();

        if let Some(patient_id) = filter.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(on_date) = filter.on_date {
            let date_str = on_date.format("%Y-%m-%d").to_string();
            query_parts.push(format!("appointment_date=eq.{}", urlencoding::encode(&date_str)));
        }
        if let Some(from_date) = filter.from_date {
            let date_str = from_date.format("%Y-%m-%d").to_string();
            query_parts.push(format!("appointment_date=gte.{}", urlencoding::encode(&date_str)));
        }
        if let Some(to_date) = filter.to_date {
            let date_str = to_date.format("%Y-%m-%d").to_string();
            query_parts.push(format!("appointment_date=lte.{}", urlencoding::encode(&date_str)));
        }

        if query_parts.is_empty() {
            "/rest/v1/appointments".to_string()
        } else {
            format!("/rest/v1/appointments?{}", query_parts.join("&"))
        }
    }

    fn row_body(appointment: &Appointment) -> Result<Value, AppError> {
        serde_json::to_value(appointment)
            .map_err(|e| AppError::Database(format!("Failed to encode appointment: {}", e)))
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppError> {
        let path = Self::list_path(filter);
        debug!("Listing appointments: {}", path);

        self.supabase
            .request::<Vec<Appointment>>(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);

        let mut rows = self
            .supabase
            .request::<Vec<Appointment>>(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn insert(&self, appointment: &Appointment) -> Result<(), AppError> {
        debug!("Inserting appointment {}", appointment.id);

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                None,
                Some(Self::row_body(appointment)?),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppError::Database("Insert returned no rows".to_string()));
        }
        Ok(())
    }

    async fn put(&self, appointment: &Appointment) -> Result<(), AppError> {
        debug!("Replacing appointment {}", appointment.id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(Self::row_body(appointment)?),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppError::not_found("appointment", appointment.id));
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        debug!("Deleting appointment {}", id);

        let path = format!("/rest/v1/appointments?id=eq.{}", id);
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

    async fn next_appointment_number(&self) -> Result<i64, AppError> {
        self.supabase
            .request::<i64>(
                Method::POST,
                "/rest/v1/rpc/next_appointment_number",
                None,
                Some(json!({})),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
