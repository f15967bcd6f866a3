// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    #[serde(deserialize_with = "one_or_many_reasons")]
    pub reason_for_visit: Vec<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub appointment_number: i64,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// The (date, time) pair that competes for slot capacity.
    pub fn slot(&self) -> (NaiveDate, NaiveTime) {
        (self.appointment_date, self.appointment_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Completed and cancelled appointments are never revisited by the
    /// front desk.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    #[serde(deserialize_with = "one_or_many_reasons")]
    pub reason_for_visit: Vec<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

/// Partial patch applied onto a stored appointment. Only the supplied
/// fields change; everything else keeps its stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub reason_for_visit: Option<Vec<String>>,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentUpdate {
    pub fn apply(&self, appointment: &mut Appointment) {
        if let Some(patient_id) = self.patient_id {
            appointment.patient_id = patient_id;
        }
        if let Some(doctor_id) = self.doctor_id {
            appointment.doctor_id = doctor_id;
        }
        if let Some(ref reasons) = self.reason_for_visit {
            appointment.reason_for_visit = reasons.clone();
        }
        if let Some(date) = self.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(time) = self.appointment_time {
            appointment.appointment_time = time;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
    }

    pub fn status(status: AppointmentStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }
}

// ==============================================================================
// STORE FILTER
// ==============================================================================

/// The only query primitive a storage backend has to honor. Relational
/// backends translate it into WHERE clauses; the in-memory backend
/// evaluates [`AppointmentFilter::matches`]. All ordering and aggregation
/// happen above the store, so every backend answers queries identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub on_date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(patient_id) = self.patient_id {
            if appointment.patient_id != patient_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if appointment.status != status {
                return false;
            }
        }
        if let Some(on_date) = self.on_date {
            if appointment.appointment_date != on_date {
                return false;
            }
        }
        if let Some(from_date) = self.from_date {
            if appointment.appointment_date < from_date {
                return false;
            }
        }
        if let Some(to_date) = self.to_date {
            if appointment.appointment_date > to_date {
                return false;
            }
        }
        true
    }

    pub fn for_patient(patient_id: Uuid) -> Self {
        Self { patient_id: Some(patient_id), ..Default::default() }
    }

    pub fn on(date: NaiveDate) -> Self {
        Self { on_date: Some(date), ..Default::default() }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from_date: Some(from), to_date: Some(to), ..Default::default() }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

// ==============================================================================
// SUMMARY AND REPORTING MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryGranularity {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSummaryQuery {
    pub granularity: Option<SummaryGranularity>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppointmentSummaryBucket {
    /// Bucket key: the day itself, the Monday of the week, or the first of
    /// the month, depending on granularity.
    pub bucket_start: NaiveDate,
    pub total_count: u32,
    pub completed_count: u32,
    pub cancelled_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopReasonsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VisitReasonCount {
    pub reason: String,
    pub count: u32,
    /// Share of non-cancelled appointments in the window, one decimal.
    pub percentage: f64,
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

/// Older records stored a single free-text reason; current rows store an
/// array. Accept both shapes on the way in.
fn one_or_many_reasons<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(reason) => vec![reason],
        OneOrMany::Many(reasons) => reasons,
    })
}
