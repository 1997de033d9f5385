//! End-to-end tests for the HTTP surface against an in-memory SQLite database.
//!
//! Run with:
//!   cargo test --test api_tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use plantcare_server::api::{self, middleware::USER_COOKIE, Services};
use plantcare_server::entities::{reminder, CareType, Priority, ReminderStatus};
use plantcare_server::migrator::Migrator;
use plantcare_server::error::{AppError, Result as AppResult};
use plantcare_server::notifications::{LogNotifier, Notifier, ReminderEvent, ReminderEventKind};
use plantcare_server::repository::reminders;
use plantcare_server::scheduler::{
    ForecastDay, NewReminder, ReminderScheduler, Season, SeasonalMultipliers, WeatherConditions,
};
use plantcare_server::weather::WeatherProvider;
use plantcare_server::worker;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const USER: i32 = 1;
const OTHER_USER: i32 = 2;

async fn test_db() -> DatabaseConnection {
    // One connection, otherwise every pooled connection opens its own empty database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn services() -> Services {
    Services {
        scheduler: ReminderScheduler::default(),
        weather: None,
        notifier: Arc::new(LogNotifier),
    }
}

async fn test_app() -> (Router, DatabaseConnection) {
    let db = test_db().await;
    let app = api::router(db.clone(), services(), "http://localhost:3000");
    (app, db)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<i32>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::COOKIE, format!("{}={}", USER_COOKIE, user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).unwrap()
}

/// Storage may truncate sub-second precision.
fn assert_same_instant(actual: DateTime<Utc>, expected: DateTime<Utc>) {
    let drift = (actual - expected).num_milliseconds().abs();
    assert!(drift < 1000, "expected {} but got {}", expected, actual);
}

async fn create_plant(app: &Router, body: Value) -> i64 {
    let (status, created) = call(app, Method::POST, "/plants", Some(USER), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created["data"]["id"].as_i64().unwrap()
}

async fn create_reminder(app: &Router, body: Value) -> Value {
    let (status, created) = call(app, Method::POST, "/reminders", Some(USER), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created["data"].clone()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _db) = test_app().await;
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requests_without_user_cookie_are_rejected() {
    let (app, _db) = test_app().await;
    let (status, body) = call(&app, Method::GET, "/reminders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_plant_crud() {
    let (app, _db) = test_app().await;
    let id = create_plant(
        &app,
        json!({"name": "Monstera", "species": "Monstera deliciosa", "watering_every_days": 7}),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/plants/{}", id),
        Some(USER),
        Some(json!({"location": "Living room"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], "Living room");
    assert_eq!(body["data"]["name"], "Monstera");

    let (status, _) = call(&app, Method::GET, &format!("/plants/{}", id), Some(OTHER_USER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, &format!("/plants/{}", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, Method::GET, "/plants", Some(USER), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_plant_rejects_invalid_frequency() {
    let (app, _db) = test_app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/plants",
        Some(USER),
        Some(json!({"name": "Fern", "watering_every_days": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_logging_care_schedules_first_reminder() {
    let (app, _db) = test_app().await;
    let plant_id = create_plant(&app, json!({"name": "Pothos", "watering_every_days": 10})).await;

    let performed_at = Utc::now() - Duration::days(2);
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/plants/{}/care-logs", plant_id),
        Some(USER),
        Some(json!({"care_type": "watering", "performed_at": performed_at})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let reminder = &body["data"]["reminder"];
    assert_eq!(reminder["status"], "pending");
    assert_eq!(reminder["title"], "Water Pothos");
    let days = ReminderScheduler::adjusted_frequency_days(
        10,
        Season::of(Utc::now()),
        &SeasonalMultipliers::default(),
    );
    assert_same_instant(timestamp(&reminder["due_date"]), performed_at + Duration::days(days));

    // A second log doesn't stack another active reminder.
    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/plants/{}/care-logs", plant_id),
        Some(USER),
        Some(json!({"care_type": "watering"})),
    )
    .await;
    assert!(body["data"]["reminder"].is_null());

    let (_, logs) = call(&app, Method::GET, &format!("/plants/{}/care-logs", plant_id), Some(USER), None).await;
    assert_eq!(logs["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_care_log_in_future_is_rejected() {
    let (app, _db) = test_app().await;
    let plant_id = create_plant(&app, json!({"name": "Cactus"})).await;
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/plants/{}/care-logs", plant_id),
        Some(USER),
        Some(json!({"care_type": "watering", "performed_at": Utc::now() + Duration::days(1)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_reminder_requires_frequency() {
    let (app, _db) = test_app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/reminders",
        Some(USER),
        Some(json!({"care_type": "pruning"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("frequency_days"));
}

#[tokio::test]
async fn test_create_reminder_rejects_bad_seasonal_adjustments() {
    let (app, _db) = test_app().await;
    for adjustments in [
        json!({"spring": 1e9, "summer": 1.0, "fall": 1.0, "winter": 1.0}),
        json!({"spring": -5.0, "summer": -5.0, "fall": -5.0, "winter": -5.0}),
        json!({"spring": 1.0, "summer": 0.0, "fall": 1.0, "winter": 1.0}),
    ] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/reminders",
            Some(USER),
            Some(json!({
                "care_type": "pruning",
                "frequency_days": 30,
                "seasonal_adjustments": adjustments,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(body["message"].as_str().unwrap().contains("multiplier"));
    }

    let (_, body) = call(&app, Method::GET, "/reminders", Some(USER), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let reminder = create_reminder(
        &app,
        json!({
            "care_type": "pruning",
            "frequency_days": 30,
            "seasonal_adjustments": {"spring": 0.1, "summer": 5.0, "fall": 1.0, "winter": 1.0},
        }),
    )
    .await;
    assert_eq!(reminder["seasonal_adjustments"]["summer"], 5.0);
}

#[tokio::test]
async fn test_create_reminder_without_history_uses_half_interval() {
    let (app, _db) = test_app().await;
    let plant_id = create_plant(&app, json!({"name": "Calathea", "watering_every_days": 6})).await;

    let before = Utc::now();
    let reminder = create_reminder(&app, json!({"plant_id": plant_id, "care_type": "watering"})).await;
    let after = Utc::now();

    let adjusted = ReminderScheduler::adjusted_frequency_days(
        6,
        Season::of(before),
        &SeasonalMultipliers::default(),
    );
    let half = ((adjusted as f64) / 2.0).round().max(1.0) as i64;
    let due = timestamp(&reminder["due_date"]);
    assert!(due >= before + Duration::days(half) - Duration::seconds(1));
    assert!(due <= after + Duration::days(half));
    assert_eq!(reminder["frequency_days"], 6);
    assert_eq!(reminder["priority"], "medium");
}

#[tokio::test]
async fn test_snooze_limit() {
    let (app, _db) = test_app().await;
    let reminder = create_reminder(
        &app,
        json!({
            "care_type": "pruning",
            "frequency_days": 30,
            "due_date": Utc::now() + Duration::days(1),
        }),
    )
    .await;
    let id = reminder["id"].as_str().unwrap().to_string();
    let original_due = timestamp(&reminder["due_date"]);

    for i in 1..=3 {
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/reminders/{}/snooze", id),
            Some(USER),
            Some(json!({"hours": 24})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "snoozed");
        assert_eq!(body["data"]["snooze_count"], i);
        assert_same_instant(
            timestamp(&body["data"]["due_date"]),
            original_due + Duration::hours(24 * i),
        );
    }

    let (status, body) = call(&app, Method::POST, &format!("/reminders/{}/snooze", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, Method::GET, &format!("/reminders/{}", id), Some(USER), None).await;
    assert_eq!(body["data"]["snooze_count"], 3);
    assert_eq!(body["data"]["snooze_history"].as_array().unwrap().len(), 3);
    assert_same_instant(timestamp(&body["data"]["original_due_date"]), original_due);
}

#[tokio::test]
async fn test_snooze_rejects_out_of_range_hours() {
    let (app, _db) = test_app().await;
    let reminder = create_reminder(
        &app,
        json!({"care_type": "repotting", "frequency_days": 180, "due_date": Utc::now() + Duration::days(3)}),
    )
    .await;
    let id = reminder["id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/reminders/{}/snooze", id),
        Some(USER),
        Some(json!({"hours": 169})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_late_creates_linked_sibling() {
    let (app, _db) = test_app().await;
    let plant_id = create_plant(&app, json!({"name": "Ficus", "fertilizer_every_weeks": 4})).await;
    let reminder = create_reminder(
        &app,
        json!({
            "plant_id": plant_id,
            "care_type": "fertilizing",
            "due_date": Utc::now() - Duration::days(2) + Duration::hours(1),
        }),
    )
    .await;
    assert_eq!(reminder["status"], "overdue");
    assert_eq!(reminder["frequency_days"], 28);
    let id = reminder["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/reminders/{}/complete", id),
        Some(USER),
        Some(json!({"notes": "half strength"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let data = &body["data"];
    assert_eq!(data["reminder"]["status"], "completed");
    assert_eq!(data["completion"]["was_on_time"], false);
    assert_eq!(data["completion"]["days_overdue"], 2);
    assert_eq!(data["reminder"]["compliance_rate"], 0.0);

    let next = &data["next_reminder"];
    assert_eq!(next["parent_id"], id.as_str());
    assert_eq!(next["status"], "pending");
    assert_eq!(next["completion_history"].as_array().unwrap().len(), 1);
    let completed_at = timestamp(&data["reminder"]["completed_at"]);
    let days = ReminderScheduler::adjusted_frequency_days(
        28,
        Season::of(completed_at),
        &SeasonalMultipliers::default(),
    );
    assert_same_instant(timestamp(&next["due_date"]), completed_at + Duration::days(days));

    // Completing also logs the care against the plant.
    let (_, logs) = call(&app, Method::GET, &format!("/plants/{}/care-logs", plant_id), Some(USER), None).await;
    let logs = logs["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["reminder_id"], id.as_str());

    let (status, _) = call(&app, Method::POST, &format!("/reminders/{}/complete", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = call(&app, Method::POST, &format!("/reminders/{}/snooze", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_complete_is_atomic_with_next_occurrence() {
    let (app, db) = test_app().await;
    let reminder = create_reminder(&app, json!({"care_type": "pruning", "frequency_days": 30})).await;
    let id = reminder["id"].as_str().unwrap().to_string();

    db.execute_unprepared(
        "CREATE TRIGGER block_successors BEFORE INSERT ON reminders \
         WHEN NEW.parent_id IS NOT NULL \
         BEGIN SELECT RAISE(ABORT, 'successor insert blocked'); END;",
    )
    .await
    .unwrap();

    let (status, body) = call(&app, Method::POST, &format!("/reminders/{}/complete", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, Method::GET, &format!("/reminders/{}", id), Some(USER), None).await;
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["completion_history"].as_array().unwrap().is_empty());

    db.execute_unprepared("DROP TRIGGER block_successors").await.unwrap();

    let (status, body) = call(&app, Method::POST, &format!("/reminders/{}/complete", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["next_reminder"]["parent_id"], id.as_str());

    let (_, body) = call(&app, Method::GET, "/reminders", Some(USER), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_one_off_reminder_has_no_successor() {
    let (app, _db) = test_app().await;
    let reminder = create_reminder(
        &app,
        json!({"care_type": "health-check", "frequency_days": 14, "is_recurring": false}),
    )
    .await;
    let id = reminder["id"].as_str().unwrap();

    let (status, body) = call(&app, Method::POST, &format!("/reminders/{}/complete", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completion"]["was_on_time"], true);
    assert!(body["data"]["next_reminder"].is_null());
}

#[tokio::test]
async fn test_dismiss_and_update_rules() {
    let (app, _db) = test_app().await;
    let reminder = create_reminder(&app, json!({"care_type": "pruning", "frequency_days": 60})).await;
    let id = reminder["id"].as_str().unwrap();

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/reminders/{}", id),
        Some(USER),
        Some(json!({"title": "Trim the dead leaves", "max_snoozes": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Trim the dead leaves");
    assert_eq!(body["data"]["max_snoozes"], 5);

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/reminders/{}", id),
        Some(USER),
        Some(json!({"frequency_days": 400})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::POST, &format!("/reminders/{}/dismiss", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "dismissed");

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/reminders/{}", id),
        Some(USER),
        Some(json!({"title": "Too late"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reminders_are_scoped_to_owner() {
    let (app, _db) = test_app().await;
    let reminder = create_reminder(&app, json!({"care_type": "pruning", "frequency_days": 60})).await;
    let id = reminder["id"].as_str().unwrap();

    let (status, _) = call(&app, Method::GET, &format!("/reminders/{}", id), Some(OTHER_USER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::POST, &format!("/reminders/{}/snooze", id), Some(OTHER_USER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/reminders", Some(OTHER_USER), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_reminder() {
    let (app, _db) = test_app().await;
    let reminder = create_reminder(&app, json!({"care_type": "pruning", "frequency_days": 60})).await;
    let id = reminder["id"].as_str().unwrap();

    let (status, _) = call(&app, Method::DELETE, &format!("/reminders/{}", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, &format!("/reminders/{}", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_applies_pending_transitions() {
    let (app, db) = test_app().await;
    let scheduler = ReminderScheduler::default();
    let now = Utc::now();

    // Stored as pending with a due date that has since passed.
    let mut stale = scheduler
        .new_reminder(draft(CareType::Watering, now + Duration::hours(1)), now)
        .unwrap();
    stale.due_date = now - Duration::days(4);
    let stale = reminders::insert(&db, stale).await.unwrap();
    assert_eq!(stale.status, ReminderStatus::Pending);

    let (status, body) = call(&app, Method::GET, "/reminders?status=overdue", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["status"], "overdue");
    assert_eq!(listed[0]["priority"], "high");

    let (_, stats) = call(&app, Method::GET, "/reminders/stats", Some(USER), None).await;
    assert_eq!(stats["data"]["total"], 1);
    assert_eq!(stats["data"]["by_status"]["overdue"], 1);
    assert_eq!(stats["data"]["compliance_rate"], 0.8);
}

#[tokio::test]
async fn test_stats_persists_pending_transitions() {
    let (app, db) = test_app().await;
    let scheduler = ReminderScheduler::default();
    let now = Utc::now();

    let mut stale = scheduler
        .new_reminder(draft(CareType::Fertilizing, now + Duration::hours(1)), now)
        .unwrap();
    stale.due_date = now - Duration::days(8);
    let stale = reminders::insert(&db, stale).await.unwrap();

    let (status, stats) = call(&app, Method::GET, "/reminders/stats", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["by_status"]["overdue"], 1);

    let stored = reminders::find_owned(&db, USER, stale.id).await.unwrap();
    assert_eq!(stored.status, ReminderStatus::Overdue);
    assert_eq!(stored.priority, Priority::Urgent);
}

#[tokio::test]
async fn test_smart_schedule() {
    let (app, _db) = test_app().await;

    let (status, body) = call(&app, Method::POST, "/reminders/smart-schedule", Some(USER), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let plant_id = create_plant(
        &app,
        json!({"name": "Basil", "watering_every_days": 2, "fertilizer_every_weeks": 2}),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/reminders/smart-schedule",
        Some(USER),
        Some(json!({"plant_id": plant_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let recs = body["data"]["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    // No history and no weather.
    assert_eq!(recs[0]["confidence"], 0.4);
    assert!(body["data"]["created"].as_array().unwrap().is_empty());

    let (_, body) = call(
        &app,
        Method::POST,
        "/reminders/smart-schedule",
        Some(USER),
        Some(json!({"plant_id": plant_id, "create": true})),
    )
    .await;
    assert_eq!(body["data"]["created"].as_array().unwrap().len(), 2);

    let (_, body) = call(
        &app,
        Method::POST,
        "/reminders/smart-schedule",
        Some(USER),
        Some(json!({"plant_id": plant_id, "create": true})),
    )
    .await;
    assert!(body["data"]["created"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sweep_marks_overdue_and_wakes_snoozed() {
    let db = test_db().await;
    let scheduler = ReminderScheduler::default();
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let now = Utc::now();

    let due_soon = reminders::insert(
        &db,
        scheduler
            .new_reminder(draft(CareType::Watering, now + Duration::hours(1)), now)
            .unwrap(),
    )
    .await
    .unwrap();

    let mut snoozed = scheduler
        .new_reminder(draft(CareType::Pruning, now + Duration::hours(1)), now)
        .unwrap();
    scheduler.snooze(&mut snoozed, 2, None, now).unwrap();
    let snoozed = reminders::insert(&db, snoozed).await.unwrap();

    let later = now + Duration::hours(4);
    let outcome = worker::sweep_once(&db, &scheduler, &notifier, later).await.unwrap();
    assert_eq!(outcome.marked_overdue, 2);
    assert_eq!(outcome.woken, 1);

    let due_soon = reminders::find_owned(&db, USER, due_soon.id).await.unwrap();
    assert_eq!(due_soon.status, ReminderStatus::Overdue);
    let snoozed = reminders::find_owned(&db, USER, snoozed.id).await.unwrap();
    assert_eq!(snoozed.status, ReminderStatus::Overdue);
    assert!(snoozed.snoozed_until.is_none());

    let again = worker::sweep_once(&db, &scheduler, &notifier, later).await.unwrap();
    assert_eq!(again.marked_overdue, 0);
}

fn draft(care_type: CareType, due_date: DateTime<Utc>) -> NewReminder {
    NewReminder {
        user_id: USER,
        plant_id: None,
        parent_id: None,
        care_type,
        title: "Check plant".to_string(),
        notes: None,
        due_date,
        frequency_days: 7,
        flexibility_days: 0,
        is_recurring: true,
        max_snoozes: 3,
        seasonal_adjustments: SeasonalMultipliers::default(),
        completion_history: reminder::CompletionHistory::default(),
    }
}

/// Keeps every event it is handed.
#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<ReminderEvent>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: ReminderEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

impl RecordingNotifier {
    /// Dispatch happens on a spawned task, so wait for it to land.
    async fn wait_for(&self, count: usize) -> Vec<ReminderEventKind> {
        for _ in 0..200 {
            {
                let events = self.events.lock().unwrap();
                if events.len() >= count {
                    return events.iter().map(|e| e.kind).collect();
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("expected {} notifications", count);
    }
}

/// Returns fixed conditions, or fails every lookup when `None`.
struct FixedWeather(Option<WeatherConditions>);

#[async_trait::async_trait]
impl WeatherProvider for FixedWeather {
    async fn conditions(&self, _lat: f64, _lon: f64) -> AppResult<WeatherConditions> {
        self.0
            .clone()
            .ok_or_else(|| AppError::upstream("weather service unavailable"))
    }
}

fn app_with(
    db: &DatabaseConnection,
    weather: Option<WeatherConditions>,
    notifier: Arc<dyn Notifier>,
) -> Router {
    let services = Services {
        scheduler: ReminderScheduler::default(),
        weather: Some(Arc::new(FixedWeather(weather))),
        notifier,
    };
    api::router(db.clone(), services, "http://localhost:3000")
}

#[tokio::test]
async fn test_rain_forecast_delays_watering() {
    let db = test_db().await;
    let rainy = WeatherConditions {
        temperature_c: 18.0,
        humidity_pct: 80.0,
        forecast: vec![ForecastDay { rainfall_mm: 14.0, days_ahead: 2 }],
    };
    let app = app_with(&db, Some(rainy), Arc::new(LogNotifier));
    let plant_id = create_plant(
        &app,
        json!({"name": "Hydrangea", "watering_every_days": 4, "latitude": 51.5, "longitude": -0.12}),
    )
    .await;

    let performed_at = Utc::now() - Duration::hours(1);
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/plants/{}/care-logs", plant_id),
        Some(USER),
        Some(json!({"care_type": "watering", "performed_at": performed_at})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let days = ReminderScheduler::adjusted_frequency_days(
        4,
        Season::of(Utc::now()),
        &SeasonalMultipliers::default(),
    );
    assert_same_instant(
        timestamp(&body["data"]["reminder"]["due_date"]),
        performed_at + Duration::days(days + 2),
    );

    let (_, body) = call(
        &app,
        Method::POST,
        "/reminders/smart-schedule",
        Some(USER),
        Some(json!({"plant_id": plant_id})),
    )
    .await;
    assert_eq!(body["data"]["recommendations"][0]["weather_impact"], "decrease");
    assert_eq!(body["data"]["weather"]["humidity_pct"], 80.0);
}

#[tokio::test]
async fn test_weather_failure_falls_back_to_unadjusted_schedule() {
    let db = test_db().await;
    let app = app_with(&db, None, Arc::new(LogNotifier));
    let plant_id = create_plant(
        &app,
        json!({"name": "Fern", "watering_every_days": 4, "latitude": 40.7, "longitude": -74.0}),
    )
    .await;

    let performed_at = Utc::now() - Duration::hours(1);
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/plants/{}/care-logs", plant_id),
        Some(USER),
        Some(json!({"care_type": "watering", "performed_at": performed_at})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let days = ReminderScheduler::adjusted_frequency_days(
        4,
        Season::of(Utc::now()),
        &SeasonalMultipliers::default(),
    );
    assert_same_instant(
        timestamp(&body["data"]["reminder"]["due_date"]),
        performed_at + Duration::days(days),
    );
}

#[tokio::test]
async fn test_lifecycle_events_are_dispatched() {
    let db = test_db().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let app = app_with(&db, None, notifier.clone());

    let reminder = create_reminder(&app, json!({"care_type": "pruning", "frequency_days": 30})).await;
    let id = reminder["id"].as_str().unwrap();
    assert_eq!(notifier.wait_for(1).await, vec![ReminderEventKind::Created]);

    let (status, _) = call(&app, Method::POST, &format!("/reminders/{}/snooze", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    notifier.wait_for(2).await;

    let (status, _) = call(&app, Method::POST, &format!("/reminders/{}/complete", id), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut kinds = notifier.wait_for(4).await;
    kinds.sort_by_key(|k| k.as_str());
    assert_eq!(
        kinds,
        vec![
            ReminderEventKind::Completed,
            ReminderEventKind::Created,
            ReminderEventKind::Created,
            ReminderEventKind::Snoozed,
        ]
    );
}
