// libs/appointment-cell/tests/repository_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, FixedOffset, Months, NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::models::{
    AppointmentStatus, AppointmentSummaryQuery, AppointmentUpdate, NewAppointment,
    SummaryGranularity, TopReasonsQuery,
};
use appointment_cell::repository::{AppointmentRepository, SLOT_CAPACITY};
use appointment_cell::store::InMemoryAppointmentStore;
use shared_models::AppError;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

fn manila() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

fn repository() -> AppointmentRepository {
    AppointmentRepository::new(Arc::new(InMemoryAppointmentStore::new()), manila())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, min, 0).unwrap()
}

fn request(
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    status: AppointmentStatus,
) -> NewAppointment {
    NewAppointment {
        patient_id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        reason_for_visit: vec!["Checkup".to_string()],
        appointment_date,
        appointment_time,
        status,
    }
}

fn request_with_reasons(
    appointment_date: NaiveDate,
    status: AppointmentStatus,
    reasons: &[&str],
) -> NewAppointment {
    NewAppointment {
        reason_for_visit: reasons.iter().map(|r| r.to_string()).collect(),
        ..request(appointment_date, time(10, 0), status)
    }
}

// ==============================================================================
// SLOT AVAILABILITY
// ==============================================================================

#[tokio::test]
async fn slot_stays_available_until_four_confirmed_bookings() {
    let repo = repository();
    let slot_date = date(2026, 8, 10);
    let slot_time = time(9, 0);

    for _ in 0..SLOT_CAPACITY {
        assert!(repo
            .check_time_slot_availability(slot_date, slot_time, None)
            .await
            .unwrap());
        repo.create(request(slot_date, slot_time, AppointmentStatus::Confirmed))
            .await
            .unwrap();
    }

    // The fifth confirmed booking no longer fits.
    assert!(!repo
        .check_time_slot_availability(slot_date, slot_time, None)
        .await
        .unwrap());
}

#[tokio::test]
async fn non_confirmed_appointments_do_not_consume_the_slot() {
    let repo = repository();
    let slot_date = date(2026, 8, 10);
    let slot_time = time(9, 0);

    for status in [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Scheduled,
    ] {
        repo.create(request(slot_date, slot_time, status)).await.unwrap();
    }
    for _ in 0..(SLOT_CAPACITY - 1) {
        repo.create(request(slot_date, slot_time, AppointmentStatus::Confirmed))
            .await
            .unwrap();
    }

    // Three confirmed plus a pile of non-confirmed bookings: still open.
    assert!(repo
        .check_time_slot_availability(slot_date, slot_time, None)
        .await
        .unwrap());

    // A different time on the same date is a different slot entirely.
    assert!(repo
        .check_time_slot_availability(slot_date, time(9, 30), None)
        .await
        .unwrap());
}

#[tokio::test]
async fn slot_check_can_exclude_the_appointment_being_rescheduled() {
    let repo = repository();
    let slot_date = date(2026, 8, 10);
    let slot_time = time(9, 0);

    let mut ids = Vec::new();
    for _ in 0..SLOT_CAPACITY {
        ids.push(
            repo.create(request(slot_date, slot_time, AppointmentStatus::Confirmed))
                .await
                .unwrap(),
        );
    }

    assert!(!repo
        .check_time_slot_availability(slot_date, slot_time, None)
        .await
        .unwrap());
    // Re-checking on behalf of one of the four occupants leaves room.
    assert!(repo
        .check_time_slot_availability(slot_date, slot_time, Some(ids[0]))
        .await
        .unwrap());
}

#[tokio::test]
async fn duplicate_check_never_reports_a_duplicate() {
    let repo = repository();
    let day = date(2026, 8, 10);
    let patient_id = Uuid::new_v4();

    for hour in [8, 11, 15] {
        let mut new = request(day, time(hour, 0), AppointmentStatus::Confirmed);
        new.patient_id = patient_id;
        repo.create(new).await.unwrap();
    }

    assert!(!repo
        .check_patient_duplicate_appointment(patient_id, day, None)
        .await
        .unwrap());
}

// ==============================================================================
// CURRENT PATIENT SELECTION
// ==============================================================================

#[tokio::test]
async fn current_patient_is_the_earliest_non_terminal_appointment() {
    let repo = repository();
    let base = date(2026, 8, 10);

    repo.create(request(base + Duration::days(7), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    let afternoon = repo
        .create(request(base + Duration::days(1), time(14, 0), AppointmentStatus::Confirmed))
        .await
        .unwrap();
    repo.create(request(base + Duration::days(1), time(9, 0), AppointmentStatus::Completed))
        .await
        .unwrap();

    let current = repo.get_current_patient_appointment().await.unwrap().unwrap();
    assert_eq!(current.id, afternoon);
    assert_eq!(current.appointment_time, time(14, 0));
}

#[tokio::test]
async fn current_patient_is_none_when_everything_is_terminal() {
    let repo = repository();

    assert!(repo.get_current_patient_appointment().await.unwrap().is_none());

    repo.create(request(date(2026, 8, 10), time(9, 0), AppointmentStatus::Completed))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 11), time(9, 0), AppointmentStatus::Cancelled))
        .await
        .unwrap();

    assert!(repo.get_current_patient_appointment().await.unwrap().is_none());
}

// ==============================================================================
// ORDERING
// ==============================================================================

#[tokio::test]
async fn by_date_listing_orders_by_time_regardless_of_insertion_order() {
    let repo = repository();
    let day = date(2026, 8, 10);

    repo.create(request(day, time(16, 0), AppointmentStatus::Scheduled)).await.unwrap();
    repo.create(request(day, time(8, 15), AppointmentStatus::Confirmed)).await.unwrap();
    repo.create(request(day, time(12, 30), AppointmentStatus::Scheduled)).await.unwrap();
    repo.create(request(date(2026, 8, 11), time(7, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let listed = repo.get_appointments_by_date(day).await.unwrap();
    let times: Vec<_> = listed.iter().map(|a| a.appointment_time).collect();
    assert_eq!(times, vec![time(8, 15), time(12, 30), time(16, 0)]);
}

#[tokio::test]
async fn today_listings_use_the_clinic_calendar() {
    let repo = repository();
    let today = repo.today();

    repo.create(request(today, time(15, 0), AppointmentStatus::Scheduled)).await.unwrap();
    repo.create(request(today, time(9, 0), AppointmentStatus::Confirmed)).await.unwrap();
    repo.create(request(today + Duration::days(1), time(8, 0), AppointmentStatus::Confirmed))
        .await
        .unwrap();

    let todays = repo.get_today_appointments().await.unwrap();
    assert_eq!(todays.len(), 2);
    assert_eq!(todays[0].appointment_time, time(9, 0));

    let confirmed = repo.get_today_confirmed_appointments().await.unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn confirmed_listing_orders_by_date_then_time() {
    let repo = repository();

    repo.create(request(date(2026, 8, 11), time(9, 0), AppointmentStatus::Confirmed))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 10), time(14, 0), AppointmentStatus::Confirmed))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 10), time(9, 0), AppointmentStatus::Confirmed))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 10), time(7, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let confirmed = repo.get_confirmed_appointments().await.unwrap();
    let slots: Vec<_> = confirmed.iter().map(|a| a.slot()).collect();
    assert_eq!(
        slots,
        vec![
            (date(2026, 8, 10), time(9, 0)),
            (date(2026, 8, 10), time(14, 0)),
            (date(2026, 8, 11), time(9, 0)),
        ]
    );
}

#[tokio::test]
async fn patient_history_is_most_recent_first() {
    let repo = repository();
    let patient_id = Uuid::new_v4();

    for (day, hour) in [(date(2026, 7, 1), 9), (date(2026, 8, 2), 9), (date(2026, 8, 2), 14)] {
        let mut new = request(day, time(hour, 0), AppointmentStatus::Completed);
        new.patient_id = patient_id;
        repo.create(new).await.unwrap();
    }
    repo.create(request(date(2026, 8, 3), time(8, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let history = repo.get_by_patient_id(patient_id).await.unwrap();
    let slots: Vec<_> = history.iter().map(|a| a.slot()).collect();
    assert_eq!(
        slots,
        vec![
            (date(2026, 8, 2), time(14, 0)),
            (date(2026, 8, 2), time(9, 0)),
            (date(2026, 7, 1), time(9, 0)),
        ]
    );
}

#[tokio::test]
async fn date_range_is_inclusive_on_both_ends() {
    let repo = repository();

    repo.create(request(date(2026, 8, 1), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 15), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 31), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    repo.create(request(date(2026, 9, 1), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let august = repo
        .get_appointments_by_date_range(date(2026, 8, 1), date(2026, 8, 31))
        .await
        .unwrap();
    assert_eq!(august.len(), 3);
    assert_eq!(august[0].appointment_date, date(2026, 8, 1));
    assert_eq!(august[2].appointment_date, date(2026, 8, 31));
}

// ==============================================================================
// WEEKLY SUMMARY
// ==============================================================================

#[tokio::test]
async fn sunday_appointments_bucket_with_the_preceding_monday() {
    let repo = repository();

    // 2026-08-03 is a Monday, 2026-08-09 the Sunday closing that week.
    repo.create(request(date(2026, 8, 3), time(9, 0), AppointmentStatus::Completed))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 9), time(9, 0), AppointmentStatus::Cancelled))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 10), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let buckets = repo
        .get_weekly_appointment_summary(AppointmentSummaryQuery {
            granularity: Some(SummaryGranularity::Weekly),
            start_date: Some(date(2026, 8, 1)),
            end_date: Some(date(2026, 8, 31)),
        })
        .await
        .unwrap();

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].bucket_start, date(2026, 8, 3));
    assert_eq!(buckets[0].total_count, 2);
    assert_eq!(buckets[0].completed_count, 1);
    assert_eq!(buckets[0].cancelled_count, 1);
    assert_eq!(buckets[1].bucket_start, date(2026, 8, 10));
    assert_eq!(buckets[1].total_count, 1);
    assert_eq!(buckets[1].cancelled_count, 0);
}

#[tokio::test]
async fn summary_supports_daily_and_monthly_buckets() {
    let repo = repository();

    repo.create(request(date(2026, 7, 30), time(9, 0), AppointmentStatus::Completed))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 5), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    repo.create(request(date(2026, 8, 5), time(11, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let daily = repo
        .get_weekly_appointment_summary(AppointmentSummaryQuery {
            granularity: Some(SummaryGranularity::Daily),
            start_date: Some(date(2026, 7, 1)),
            end_date: Some(date(2026, 8, 31)),
        })
        .await
        .unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].bucket_start, date(2026, 7, 30));
    assert_eq!(daily[1].total_count, 2);

    let monthly = repo
        .get_weekly_appointment_summary(AppointmentSummaryQuery {
            granularity: Some(SummaryGranularity::Monthly),
            start_date: Some(date(2026, 7, 1)),
            end_date: Some(date(2026, 8, 31)),
        })
        .await
        .unwrap();
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].bucket_start, date(2026, 7, 1));
    assert_eq!(monthly[1].bucket_start, date(2026, 8, 1));
    assert_eq!(monthly[1].total_count, 2);
}

#[tokio::test]
async fn summary_defaults_to_a_three_month_window_ending_today() {
    let repo = repository();
    let today = repo.today();
    let long_ago = today.checked_sub_months(Months::new(4)).unwrap();

    repo.create(request(today, time(9, 0), AppointmentStatus::Scheduled)).await.unwrap();
    repo.create(request(long_ago, time(9, 0), AppointmentStatus::Scheduled)).await.unwrap();

    let buckets = repo
        .get_weekly_appointment_summary(AppointmentSummaryQuery::default())
        .await
        .unwrap();

    let total: u32 = buckets.iter().map(|b| b.total_count).sum();
    assert_eq!(total, 1, "appointments older than three months fall outside the default window");
}

// ==============================================================================
// TOP VISIT REASONS
// ==============================================================================

#[tokio::test]
async fn top_reasons_report_share_of_non_cancelled_appointments() {
    let repo = repository();
    let day = date(2026, 8, 10);

    repo.create(request_with_reasons(day, AppointmentStatus::Completed, &["Checkup"]))
        .await
        .unwrap();
    repo.create(request_with_reasons(day, AppointmentStatus::Confirmed, &["Checkup"]))
        .await
        .unwrap();
    repo.create(request_with_reasons(day, AppointmentStatus::Scheduled, &["Rash"]))
        .await
        .unwrap();
    // Cancelled visits are left out of the table and the total.
    repo.create(request_with_reasons(day, AppointmentStatus::Cancelled, &["Checkup"]))
        .await
        .unwrap();

    let reasons = repo.get_top_visit_reasons(TopReasonsQuery::default()).await.unwrap();

    assert_eq!(reasons.len(), 2);
    assert_eq!(reasons[0].reason, "Checkup");
    assert_eq!(reasons[0].count, 2);
    assert_eq!(reasons[0].percentage, 66.7);
    assert_eq!(reasons[1].reason, "Rash");
    assert_eq!(reasons[1].percentage, 33.3);
}

#[tokio::test]
async fn top_reasons_flatten_multi_reason_visits_and_honor_the_limit() {
    let repo = repository();
    let day = date(2026, 8, 10);

    repo.create(request_with_reasons(day, AppointmentStatus::Completed, &["Checkup", "Flu shot"]))
        .await
        .unwrap();
    repo.create(request_with_reasons(day, AppointmentStatus::Completed, &["Flu shot"]))
        .await
        .unwrap();

    let all = repo.get_top_visit_reasons(TopReasonsQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].reason, "Flu shot");
    assert_eq!(all[0].count, 2);
    // Percentages are shares of appointments, not of reason mentions.
    assert_eq!(all[0].percentage, 100.0);

    let top_one = repo
        .get_top_visit_reasons(TopReasonsQuery { limit: Some(1), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].reason, "Flu shot");
}

#[tokio::test]
async fn top_reasons_date_window_is_inclusive() {
    let repo = repository();

    repo.create(request_with_reasons(date(2026, 8, 1), AppointmentStatus::Completed, &["Checkup"]))
        .await
        .unwrap();
    repo.create(request_with_reasons(date(2026, 8, 20), AppointmentStatus::Completed, &["Rash"]))
        .await
        .unwrap();

    let windowed = repo
        .get_top_visit_reasons(TopReasonsQuery {
            start_date: Some(date(2026, 8, 1)),
            end_date: Some(date(2026, 8, 1)),
            limit: None,
        })
        .await
        .unwrap();

    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].reason, "Checkup");
    assert_eq!(windowed[0].percentage, 100.0);
}

// ==============================================================================
// CRUD CONTRACT
// ==============================================================================

#[tokio::test]
async fn created_appointments_read_back_with_generated_fields() {
    let repo = repository();
    let new = request(date(2026, 8, 10), time(9, 30), AppointmentStatus::Scheduled);
    let patient_id = new.patient_id;

    let id = repo.create(new).await.unwrap();
    let stored = repo.get_by_id(id).await.unwrap().unwrap();

    assert_eq!(stored.id, id);
    assert_eq!(stored.patient_id, patient_id);
    assert_eq!(stored.reason_for_visit, vec!["Checkup".to_string()]);
    assert_eq!(stored.appointment_date, date(2026, 8, 10));
    assert_eq!(stored.appointment_time, time(9, 30));
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
    assert!(stored.updated_at.is_none());
    assert_eq!(stored.appointment_number, 1);

    let second = repo
        .create(request(date(2026, 8, 11), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    assert_eq!(repo.get_by_id(second).await.unwrap().unwrap().appointment_number, 2);
}

#[tokio::test]
async fn update_merges_supplied_fields_and_stamps_updated_at() {
    let repo = repository();
    let id = repo
        .create(request(date(2026, 8, 10), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    let before = repo.get_by_id(id).await.unwrap().unwrap();

    let updated = repo
        .update(id, AppointmentUpdate::status(AppointmentStatus::Confirmed))
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Confirmed);
    assert_eq!(updated.appointment_date, before.appointment_date);
    assert_eq!(updated.appointment_time, before.appointment_time);
    assert_eq!(updated.patient_id, before.patient_id);
    assert!(updated.updated_at.is_some());

    let stored = repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn writes_against_unknown_ids_fail_with_not_found() {
    let repo = repository();

    assert_matches!(
        repo.update(Uuid::new_v4(), AppointmentUpdate::default()).await,
        Err(AppError::NotFound(_))
    );
    assert_matches!(repo.delete(Uuid::new_v4()).await, Err(AppError::NotFound(_)));

    // Reads stay quiet about missing rows.
    assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_removes_the_row() {
    let repo = repository();
    let id = repo
        .create(request(date(2026, 8, 10), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    repo.delete(id).await.unwrap();
    assert!(repo.get_by_id(id).await.unwrap().is_none());
    assert!(repo.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_all_returns_newest_records_first() {
    let repo = repository();

    let first = repo
        .create(request(date(2026, 8, 10), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    let second = repo
        .create(request(date(2026, 8, 9), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();
    let third = repo
        .create(request(date(2026, 8, 11), time(9, 0), AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let all = repo.get_all().await.unwrap();
    let ids: Vec<_> = all.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![third, second, first]);
}
