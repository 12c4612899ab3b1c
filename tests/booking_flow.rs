use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use ulid::Ulid;

use innkeep::config::Config;
use innkeep::model::{Room, RoomId, RoomType, StayRange};
use innkeep::service::{BookingService, ConfirmError, StageError, StayForm, SummaryError};

// ── Test infrastructure ──────────────────────────────────────

fn test_config() -> Config {
    let dir = std::env::temp_dir().join(format!("innkeep_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    Config {
        data_dir: dir,
        ..Config::default()
    }
}

async fn start_service(config: &Config) -> BookingService {
    BookingService::open(config).unwrap()
}

async fn add_room(service: &BookingService, id: RoomId, number: &str) {
    service
        .engine()
        .add_room(
            Room {
                id,
                room_number: number.into(),
                accessible: false,
                description: "Garden view".into(),
                image_ref: String::new(),
            },
            RoomType {
                name: "Queen".into(),
                nightly_rate: Decimal::new(15000, 2),
                max_occupancy: 4,
                bed_configuration: "1 Queen".into(),
            },
        )
        .await
        .unwrap();
}

/// Date `n` days from today, in form format. Tests use future dates so the
/// past-date validation never trips.
fn day(n: u64) -> String {
    let date = chrono::Utc::now()
        .date_naive()
        .checked_add_days(Days::new(n))
        .unwrap();
    date.format("%Y-%m-%d").to_string()
}

fn form(check_in: u64, check_out: u64, guests: &str) -> StayForm {
    StayForm {
        check_in: day(check_in),
        check_out: day(check_out),
        guests: guests.into(),
    }
}

// ── The happy path, auth detour included ─────────────────────

#[tokio::test]
async fn full_flow_with_auth_detour() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;

    let staged = service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
    assert_eq!(staged.nights, 3);
    assert_eq!(staged.subtotal, Decimal::new(45000, 2));

    // Not signed in: the summary demands auth but keeps the stage
    assert_eq!(service.summary("s1", None).await, Err(SummaryError::AuthRequired));

    // Signed in: totals are recomputed server-side
    let summary = service.summary("s1", Some(42)).await.unwrap();
    assert_eq!(summary.room_number, "107");
    assert_eq!(summary.nights, 3);
    assert_eq!(summary.nightly_rate, Decimal::new(15000, 2));
    assert_eq!(summary.subtotal, Decimal::new(45000, 2)); // 150.00 × 3
    assert_eq!(summary.check_in, day(10));
    assert_eq!(summary.guests, 2);

    let id = service.confirm("s1", 42).await.unwrap();

    // The stage is gone, the reservation is real
    assert_eq!(service.summary("s1", Some(42)).await, Err(SummaryError::NothingStaged));
    assert_eq!(service.confirm("s1", 42).await, Err(ConfirmError::NothingStaged));
    let info = service.engine().find_reservation(id).await.unwrap();
    assert_eq!(info.customer_id, 42);
    assert_eq!(info.room_number, "107");
}

// ── Staging ──────────────────────────────────────────────────

#[tokio::test]
async fn stage_rejects_bad_input() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;

    let result = service.stage("s1", 99, &form(10, 13, "2")).await;
    assert_eq!(result, Err(StageError::RoomNotFound(99)));

    let past = StayForm {
        check_in: "2020-01-10".into(),
        check_out: "2020-01-13".into(),
        guests: "2".into(),
    };
    assert!(matches!(
        service.stage("s1", 7, &past).await,
        Err(StageError::Validation(_))
    ));

    assert!(matches!(
        service.stage("s1", 7, &form(10, 13, "nine")).await,
        Err(StageError::Validation(_))
    ));
    assert!(matches!(
        service.stage("s1", 7, &form(13, 10, "2")).await,
        Err(StageError::Validation(_))
    ));
    assert!(matches!(
        service.stage("s1", 7, &form(10, 13, "5")).await,
        Err(StageError::Validation(_))
    ));

    // Nothing was staged by any of the failures
    assert_eq!(service.summary("s1", Some(42)).await, Err(SummaryError::NothingStaged));
}

#[tokio::test]
async fn overlong_stay_fails_at_staging_not_confirm() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;

    // A 100-night stay must be turned away by validation, never staged and
    // then killed at confirm as corrupt
    let result = service.stage("s1", 7, &form(10, 110, "2")).await;
    assert!(matches!(result, Err(StageError::Validation(_))));
    assert_eq!(service.summary("s1", Some(42)).await, Err(SummaryError::NothingStaged));

    // A stay at the cap goes all the way through
    service.stage("s1", 7, &form(10, 100, "2")).await.unwrap();
    service.confirm("s1", 42).await.unwrap();
}

#[tokio::test]
async fn restage_replaces_previous_stay() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;
    add_room(&service, 8, "108").await;

    service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
    service.stage("s1", 8, &form(20, 22, "3")).await.unwrap();

    let summary = service.summary("s1", Some(42)).await.unwrap();
    assert_eq!(summary.room_number, "108");
    assert_eq!(summary.nights, 2);
    assert_eq!(summary.guests, 3);
}

#[tokio::test]
async fn cancel_drops_the_stage() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;

    service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
    assert!(service.cancel("s1"));
    assert!(!service.cancel("s1"));
    assert_eq!(service.summary("s1", Some(42)).await, Err(SummaryError::NothingStaged));
}

// ── Confirm ──────────────────────────────────────────────────

#[tokio::test]
async fn lost_race_keeps_stage_for_retry() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;

    service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
    service.stage("s2", 7, &form(12, 14, "2")).await.unwrap();

    service.confirm("s1", 42).await.unwrap();
    assert_eq!(service.confirm("s2", 43).await, Err(ConfirmError::Unavailable));

    // The loser's stage survives so they can pick new dates
    assert!(service.summary("s2", Some(43)).await.is_ok());
    service.stage("s2", 7, &form(13, 15, "2")).await.unwrap();
    service.confirm("s2", 43).await.unwrap();
}

#[tokio::test]
async fn sessions_do_not_share_stages() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;
    add_room(&service, 8, "108").await;

    service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
    service.stage("s2", 8, &form(10, 13, "1")).await.unwrap();

    assert_eq!(service.summary("s1", Some(1)).await.unwrap().room_number, "107");
    assert_eq!(service.summary("s2", Some(2)).await.unwrap().room_number, "108");

    service.cancel("s1");
    assert!(service.summary("s2", Some(2)).await.is_ok());
}

#[tokio::test]
async fn concurrent_confirms_commit_exactly_one() {
    let config = test_config();
    let service = start_service(&config).await;
    add_room(&service, 7, "107").await;

    service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
    service.stage("s2", 7, &form(11, 14, "2")).await.unwrap();

    let (a, b) = tokio::join!(service.confirm("s1", 42), service.confirm("s2", 43));
    assert_eq!(
        a.is_ok() as u32 + b.is_ok() as u32,
        1,
        "exactly one overlapping confirm may win: {a:?} / {b:?}"
    );
    let loser = if a.is_err() { a } else { b };
    assert_eq!(loser, Err(ConfirmError::Unavailable));
}

// ── Durability ───────────────────────────────────────────────

#[tokio::test]
async fn reservations_survive_restart() {
    let config = test_config();
    let check_in: NaiveDate = day(10).parse().unwrap();
    let check_out: NaiveDate = day(13).parse().unwrap();

    let id = {
        let service = start_service(&config).await;
        add_room(&service, 7, "107").await;
        service.stage("s1", 7, &form(10, 13, "2")).await.unwrap();
        service.confirm("s1", 42).await.unwrap()
    };

    let service = start_service(&config).await;
    let info = service.engine().find_reservation(id).await.unwrap();
    assert_eq!(info.customer_id, 42);
    assert_eq!(info.range, StayRange::new(check_in, check_out));

    // Staged state was per-process scratch; only the reservation came back
    assert_eq!(service.summary("s1", Some(42)).await, Err(SummaryError::NothingStaged));

    // And the replayed reservation still blocks its dates
    service.stage("s2", 7, &form(11, 14, "2")).await.unwrap();
    assert_eq!(service.confirm("s2", 43).await, Err(ConfirmError::Unavailable));
}
