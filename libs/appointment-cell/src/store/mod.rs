// libs/appointment-cell/src/store/mod.rs
//
// Storage backends implement only this narrow primitive. Every query rule
// of the appointment contract (ordering, bucketing, slot counting) lives in
// the repository, so backends cannot drift apart.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{Appointment, AppointmentFilter};

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Rows matching the filter, in no particular order.
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;

    async fn insert(&self, appointment: &Appointment) -> Result<(), AppError>;

    /// Whole-row replace of an existing appointment. Fails with `NotFound`
    /// if the row has disappeared.
    async fn put(&self, appointment: &Appointment) -> Result<(), AppError>;

    /// Returns whether a row was actually deleted.
    async fn remove(&self, id: Uuid) -> Result<bool, AppError>;

    /// Next value of the backend-owned appointment number sequence.
    async fn next_appointment_number(&self) -> Result<i64, AppError>;
}

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;
