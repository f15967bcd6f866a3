// libs/patient-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinic patient record. Appointments, prescriptions, and lab requests
/// reference patients by id only; nothing here is derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Partial patch for a stored patient; only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl PatientUpdate {
    pub fn apply(&self, patient: &mut Patient) {
        if let Some(ref first_name) = self.first_name {
            patient.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            patient.last_name = last_name.clone();
        }
        if let Some(ref email) = self.email {
            patient.email = email.clone();
        }
        if let Some(ref phone_number) = self.phone_number {
            patient.phone_number = Some(phone_number.clone());
        }
        if let Some(date_of_birth) = self.date_of_birth {
            patient.date_of_birth = Some(date_of_birth);
        }
    }
}
