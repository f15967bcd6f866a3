// libs/appointment-cell/src/services/scheduling.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment};
use crate::repository::AppointmentRepository;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment slot not available")]
    SlotNotAvailable,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AppError> for SchedulingError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::NotFound(_) => SchedulingError::NotFound,
            other => SchedulingError::Database(other.to_string()),
        }
    }
}

/// Front-desk use cases over the appointment repository.
///
/// The repository itself enforces no booking policy; the capacity gate and
/// the practical one-directional status flow live here, where the original
/// use-case layer kept them.
pub struct SchedulingService {
    repository: Arc<AppointmentRepository>,
}

impl SchedulingService {
    pub fn new(repository: Arc<AppointmentRepository>) -> Self {
        Self { repository }
    }

    /// Book a new appointment after the slot-capacity gate.
    pub async fn book_appointment(
        &self,
        request: NewAppointment,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        let slot_open = self
            .repository
            .check_time_slot_availability(request.appointment_date, request.appointment_time, None)
            .await?;
        if !slot_open {
            warn!(
                "Slot {} {} is at capacity",
                request.appointment_date, request.appointment_time
            );
            return Err(SchedulingError::SlotNotAvailable);
        }

        // Consulted for call-site compatibility only; same-day repeat visits
        // are allowed, so the result never blocks the booking.
        let _ = self
            .repository
            .check_patient_duplicate_appointment(request.patient_id, request.appointment_date, None)
            .await?;

        let id = self.repository.create(request).await?;
        let appointment = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(SchedulingError::NotFound)?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    /// Move an appointment to a new slot. The appointment's own booking
    /// does not count against the target slot, so rescheduling within the
    /// same slot stays legal.
    pub async fn reschedule_appointment(
        &self,
        id: Uuid,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Rescheduling appointment: {}", id);

        let current = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(SchedulingError::NotFound)?;
        if current.status.is_terminal() {
            return Err(SchedulingError::InvalidStatusTransition(current.status));
        }

        let slot_open = self
            .repository
            .check_time_slot_availability(new_date, new_time, Some(id))
            .await?;
        if !slot_open {
            return Err(SchedulingError::SlotNotAvailable);
        }

        let changes = AppointmentUpdate {
            appointment_date: Some(new_date),
            appointment_time: Some(new_time),
            ..Default::default()
        };
        Ok(self.repository.update(id, changes).await?)
    }

    /// Confirm a pending appointment. Only confirmed appointments consume
    /// slot capacity, so the gate runs here rather than at booking status.
    pub async fn confirm_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        debug!("Confirming appointment: {}", id);

        let current = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(SchedulingError::NotFound)?;
        if current.status.is_terminal() {
            return Err(SchedulingError::InvalidStatusTransition(current.status));
        }

        let slot_open = self
            .repository
            .check_time_slot_availability(
                current.appointment_date,
                current.appointment_time,
                Some(id),
            )
            .await?;
        if !slot_open {
            return Err(SchedulingError::SlotNotAvailable);
        }

        let appointment = self
            .repository
            .update(id, AppointmentUpdate::status(AppointmentStatus::Confirmed))
            .await?;
        Ok(appointment)
    }

    pub async fn complete_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.transition_to_terminal(id, AppointmentStatus::Completed).await
    }

    pub async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.transition_to_terminal(id, AppointmentStatus::Cancelled).await
    }

    async fn transition_to_terminal(
        &self,
        id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Transitioning appointment {} to {}", id, target);

        let current = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(SchedulingError::NotFound)?;
        if current.status.is_terminal() {
            return Err(SchedulingError::InvalidStatusTransition(current.status));
        }

        let appointment = self
            .repository
            .update(id, AppointmentUpdate::status(target))
            .await?;
        info!("Appointment {} is now {}", id, target);
        Ok(appointment)
    }
}
