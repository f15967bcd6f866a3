// libs/appointment-cell/src/repository.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentSummaryBucket,
    AppointmentSummaryQuery, AppointmentUpdate, NewAppointment, SummaryGranularity,
    TopReasonsQuery, VisitReasonCount,
};
use crate::store::AppointmentStore;

/// Confirmed appointments that may share one (date, time) slot.
pub const SLOT_CAPACITY: usize = 4;
/// Rows returned by `get_top_visit_reasons` when the caller sets no limit.
pub const DEFAULT_TOP_REASONS_LIMIT: usize = 10;
/// Default reporting window, counted back from the summary end date.
pub const DEFAULT_SUMMARY_WINDOW_MONTHS: u32 = 3;

/// The uniform query surface over the appointment collection.
///
/// Every ordering, counting, and bucketing rule lives here, once, over the
/// narrow [`AppointmentStore`] primitive. Swapping the backend cannot change
/// what any of these operations return. "Today" is computed from the
/// configured clinic offset, never from a backend's idea of the calendar.
pub struct AppointmentRepository {
    store: Arc<dyn AppointmentStore>,
    clinic_offset: FixedOffset,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn AppointmentStore>, clinic_offset: FixedOffset) -> Self {
        Self { store, clinic_offset }
    }

    /// The current calendar date at the clinic.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.clinic_offset).date_naive()
    }

    /// All appointments, newest record first.
    pub async fn get_all(&self) -> Result<Vec<Appointment>, AppError> {
        let mut rows = self.store.list(&AppointmentFilter::default()).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    /// Persist a new appointment and hand back its generated id. The
    /// appointment number comes from the backend-owned sequence.
    pub async fn create(&self, new: NewAppointment) -> Result<Uuid, AppError> {
        let appointment_number = self.store.next_appointment_number().await?;
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            reason_for_visit: new.reason_for_visit,
            appointment_date: new.appointment_date,
            appointment_time: new.appointment_time,
            appointment_number,
            status: new.status,
            created_at: Utc::now(),
            updated_at: None,
        };

        debug!("Creating appointment {} (number {})", appointment.id, appointment_number);
        self.store.insert(&appointment).await?;
        Ok(appointment.id)
    }

    /// Merge the supplied fields onto the stored record. Fails with
    /// `NotFound` when the id is unknown; stamps `updated_at` otherwise.
    pub async fn update(
        &self,
        id: Uuid,
        changes: AppointmentUpdate,
    ) -> Result<Appointment, AppError> {
        debug!("Updating appointment: {}", id);

        let mut appointment = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found("appointment", id))?;

        changes.apply(&mut appointment);
        appointment.updated_at = Some(Utc::now());

        self.store.put(&appointment).await?;
        Ok(appointment)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        debug!("Deleting appointment: {}", id);

        if !self.store.remove(id).await? {
            return Err(AppError::not_found("appointment", id));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        self.store.fetch(id).await
    }

    /// A patient's history, most recent visit first.
    pub async fn get_by_patient_id(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppError> {
        let mut rows = self.store.list(&AppointmentFilter::for_patient(patient_id)).await?;
        rows.sort_by(|a, b| b.slot().cmp(&a.slot()));
        Ok(rows)
    }

    /// Today's schedule at the clinic, earliest time first.
    pub async fn get_today_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        self.get_appointments_by_date(self.today()).await
    }

    pub async fn get_today_confirmed_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        let filter = AppointmentFilter::on(self.today()).with_status(AppointmentStatus::Confirmed);
        let mut rows = self.store.list(&filter).await?;
        rows.sort_by_key(|a| a.appointment_time);
        Ok(rows)
    }

    pub async fn get_confirmed_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        let filter = AppointmentFilter::default().with_status(AppointmentStatus::Confirmed);
        let mut rows = self.store.list(&filter).await?;
        rows.sort_by_key(|a| a.slot());
        Ok(rows)
    }

    pub async fn get_appointments_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut rows = self.store.list(&AppointmentFilter::on(date)).await?;
        rows.sort_by_key(|a| a.appointment_time);
        Ok(rows)
    }

    /// Inclusive date-range listing, chronological order.
    pub async fn get_appointments_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut rows = self.store.list(&AppointmentFilter::between(start, end)).await?;
        rows.sort_by_key(|a| a.slot());
        Ok(rows)
    }

    /// Time-bucketed appointment counts.
    ///
    /// Defaults: weekly granularity, window ending today at the clinic and
    /// starting three calendar months earlier. Weekly buckets are keyed by
    /// the Monday of the ISO week; monthly buckets by the first of the
    /// month. Buckets come back in ascending date order.
    pub async fn get_weekly_appointment_summary(
        &self,
        query: AppointmentSummaryQuery,
    ) -> Result<Vec<AppointmentSummaryBucket>, AppError> {
        let granularity = query.granularity.unwrap_or_default();
        let end_date = query.end_date.unwrap_or_else(|| self.today());
        let start_date = query.start_date.unwrap_or_else(|| {
            end_date
                .checked_sub_months(Months::new(DEFAULT_SUMMARY_WINDOW_MONTHS))
                .unwrap_or(end_date)
        });

        debug!(
            "Summarizing appointments {:?} from {} to {}",
            granularity, start_date, end_date
        );

        let rows = self
            .store
            .list(&AppointmentFilter::between(start_date, end_date))
            .await?;

        let mut buckets: BTreeMap<NaiveDate, AppointmentSummaryBucket> = BTreeMap::new();
        for row in &rows {
            let key = bucket_start(row.appointment_date, granularity);
            let bucket = buckets.entry(key).or_insert_with(|| AppointmentSummaryBucket {
                bucket_start: key,
                total_count: 0,
                completed_count: 0,
                cancelled_count: 0,
            });
            bucket.total_count += 1;
            match row.status {
                AppointmentStatus::Completed => bucket.completed_count += 1,
                AppointmentStatus::Cancelled => bucket.cancelled_count += 1,
                _ => {}
            }
        }

        Ok(buckets.into_values().collect())
    }

    /// True while the slot still has capacity: fewer than [`SLOT_CAPACITY`]
    /// confirmed appointments at exactly this date and time. Pass the
    /// appointment's own id when re-checking an existing booking so it does
    /// not count against itself.
    pub async fn check_time_slot_availability(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let filter = AppointmentFilter::on(date).with_status(AppointmentStatus::Confirmed);
        let confirmed = self.store.list(&filter).await?;

        let occupied = confirmed
            .iter()
            .filter(|a| a.appointment_time == time && Some(a.id) != exclude_id)
            .count();

        Ok(occupied < SLOT_CAPACITY)
    }

    /// Always false: the clinic allows a patient any number of same-day
    /// appointments. The predicate survives for callers that still consult
    /// it and must never be used to block creation.
    pub async fn check_patient_duplicate_appointment(
        &self,
        _patient_id: Uuid,
        _appointment_date: NaiveDate,
        _exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        Ok(false)
    }

    /// The soonest appointment, by date then time, that has not reached a
    /// terminal status. `None` when nothing is pending.
    pub async fn get_current_patient_appointment(&self) -> Result<Option<Appointment>, AppError> {
        let rows = self.store.list(&AppointmentFilter::default()).await?;
        Ok(rows
            .into_iter()
            .filter(|a| !a.status.is_terminal())
            .min_by_key(|a| (a.slot(), a.appointment_number)))
    }

    /// Frequency table of visit reasons over non-cancelled appointments,
    /// optionally restricted to an inclusive date window. Reasons are
    /// counted case-sensitively, exactly as recorded.
    pub async fn get_top_visit_reasons(
        &self,
        query: TopReasonsQuery,
    ) -> Result<Vec<VisitReasonCount>, AppError> {
        let filter = AppointmentFilter {
            from_date: query.start_date,
            to_date: query.end_date,
            ..Default::default()
        };
        let rows = self.store.list(&filter).await?;

        let counted: Vec<&Appointment> = rows
            .iter()
            .filter(|a| a.status != AppointmentStatus::Cancelled)
            .collect();
        let total = counted.len();

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for appointment in &counted {
            for reason in &appointment.reason_for_visit {
                *counts.entry(reason.as_str()).or_insert(0) += 1;
            }
        }

        let mut reasons: Vec<VisitReasonCount> = counts
            .into_iter()
            .map(|(reason, count)| VisitReasonCount {
                reason: reason.to_string(),
                count,
                percentage: share_percentage(count, total),
            })
            .collect();

        reasons.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(&b.reason)));
        reasons.truncate(query.limit.unwrap_or(DEFAULT_TOP_REASONS_LIMIT));
        Ok(reasons)
    }
}

/// Bucket key for one appointment date at the given granularity.
fn bucket_start(date: NaiveDate, granularity: SummaryGranularity) -> NaiveDate {
    match granularity {
        SummaryGranularity::Daily => date,
        SummaryGranularity::Monthly => date.with_day(1).unwrap_or(date),
        SummaryGranularity::Weekly => {
            // Monday of the ISO week; a Sunday rolls back six days.
            let days_from_monday = date.weekday().number_from_monday() as i64 - 1;
            date - Duration::days(days_from_monday)
        }
    }
}

/// `count / total * 100`, rounded to one decimal; 0 when the window is empty.
fn share_percentage(count: u32, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}
