//! Composition root for the clinic cells.
//!
//! Storage is chosen from configuration exactly once, here, and every
//! repository receives its already-constructed collaborators by parameter.
//! There is no process-wide registry to mutate and nothing resolves
//! dependencies at call time; an embedding server holds [`ClinicCells`] in
//! its state and hands the pieces to whatever surface it exposes.

use std::sync::Arc;

use tracing::info;

use appointment_cell::repository::AppointmentRepository;
use appointment_cell::services::SchedulingService;
use appointment_cell::store::{
    AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore,
};
use patient_cell::repository::PatientRepository;
use patient_cell::store::{InMemoryPatientStore, PatientStore, SupabasePatientStore};
use shared_config::{AppConfig, StorageBackend};
use shared_database::SupabaseClient;
use shared_models::AppError;

pub struct ClinicCells {
    pub appointments: Arc<AppointmentRepository>,
    pub scheduling: SchedulingService,
    pub patients: Arc<PatientRepository>,
}

impl std::fmt::Debug for ClinicCells {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClinicCells").finish_non_exhaustive()
    }
}

/// Build the clinic from configuration. Fails fast when the selected
/// backend is missing its settings instead of limping along half-wired.
pub fn assemble(config: &AppConfig) -> Result<ClinicCells, AppError> {
    let (appointment_store, patient_store): (Arc<dyn AppointmentStore>, Arc<dyn PatientStore>) =
        match config.storage_backend {
            StorageBackend::Memory => (
                Arc::new(InMemoryAppointmentStore::new()),
                Arc::new(InMemoryPatientStore::new()),
            ),
            StorageBackend::Supabase => {
                if !config.is_supabase_configured() {
                    return Err(AppError::Configuration(
                        "Supabase backend selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing"
                            .to_string(),
                    ));
                }
                let supabase = Arc::new(SupabaseClient::new(config));
                (
                    Arc::new(SupabaseAppointmentStore::new(Arc::clone(&supabase))),
                    Arc::new(SupabasePatientStore::new(supabase)),
                )
            }
        };

    let appointments = Arc::new(AppointmentRepository::new(
        appointment_store,
        config.clinic_utc_offset,
    ));
    let scheduling = SchedulingService::new(Arc::clone(&appointments));
    let patients = Arc::new(PatientRepository::new(patient_store));

    info!(
        "Clinic cells assembled: {:?} storage, clinic timezone {} ({})",
        config.storage_backend, config.clinic_timezone, config.clinic_utc_offset
    );

    Ok(ClinicCells {
        appointments,
        scheduling,
        patients,
    })
}
