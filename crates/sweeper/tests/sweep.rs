//! End-to-end sweep tests against a real database and an in-memory asset
//! store fake. The fake records which keys exist and can be told to fail
//! specific deletes, which is how the partial-failure and idempotence
//! properties are exercised.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use proofroom_core::retention::RetentionPolicy;
use proofroom_db::models::event::CreateEvent;
use proofroom_db::models::photo::CreatePhoto;
use proofroom_db::models::user::CreateUser;
use proofroom_db::repositories::{EventRepo, PhotoRepo, UserRepo};
use proofroom_storage::{AssetStore, DeleteOutcome, StorageError, UploadedAsset};
use proofroom_sweeper::run_sweep;

// ---------------------------------------------------------------------------
// In-memory asset store fake
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeStore {
    assets: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeStore {
    fn seed(&self, key: &str) {
        self.assets.lock().unwrap().insert(key.to_string());
    }

    fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn contains(&self, key: &str) -> bool {
        self.assets.lock().unwrap().contains(key)
    }
}

#[async_trait::async_trait]
impl AssetStore for FakeStore {
    async fn upload(
        &self,
        key: &str,
        _file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<UploadedAsset, StorageError> {
        self.seed(key);
        Ok(UploadedAsset {
            url: format!("https://cdn.test/{key}"),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StorageError> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(StorageError::Api {
                status: 500,
                message: "simulated outage".to_string(),
            });
        }
        if self.assets.lock().unwrap().remove(key) {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a delivered event with `photo_count` photos whose selections were
/// submitted `submitted_days_ago` days ago. Returns (event_id, asset_keys).
async fn delivered_event(
    pool: &PgPool,
    store: &FakeStore,
    email_tag: &str,
    photo_count: usize,
    submitted_days_ago: i64,
) -> (i64, Vec<String>) {
    let photographer = UserRepo::create(
        pool,
        &CreateUser {
            email: format!("photographer-{email_tag}@test.com"),
            password_hash: "$argon2id$fake".to_string(),
            role: "photographer".to_string(),
            display_name: "Sweep Fixture".to_string(),
            phone: String::new(),
            verification_token: format!("token-{email_tag}"),
        },
    )
    .await
    .expect("user creation should succeed");

    let event = EventRepo::create(
        pool,
        &CreateEvent {
            photographer_id: photographer.id,
            client_email: "client@test.com".to_string(),
            name: format!("Event {email_tag}"),
            event_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            max_selections: photo_count as i32,
        },
    )
    .await
    .expect("event creation should succeed");

    let mut keys = Vec::new();
    let mut photo_ids = Vec::new();
    for i in 0..photo_count {
        let key = format!("events/{}/photo-{i}", event.id);
        store.seed(&key);
        let photo = PhotoRepo::create(
            pool,
            &CreatePhoto {
                event_id: event.id,
                url: format!("https://cdn.test/{key}"),
                asset_key: key.clone(),
                file_name: format!("{i:03}.jpg"),
                width: None,
                height: None,
            },
        )
        .await
        .expect("photo creation should succeed");
        keys.push(key);
        photo_ids.push(photo.id);
    }

    EventRepo::submit_selections(pool, event.id, &photo_ids)
        .await
        .unwrap()
        .expect("submit should succeed");
    EventRepo::deliver_finals(pool, event.id, &["https://cdn.test/final.jpg".to_string()])
        .await
        .unwrap()
        .expect("delivery should succeed");

    // Backdate the submit so the retention cutoff logic sees real age.
    sqlx::query("UPDATE events SET submitted_at = NOW() - make_interval(days => $2::int) WHERE id = $1")
        .bind(event.id)
        .bind(submitted_days_ago as i32)
        .execute(pool)
        .await
        .unwrap();

    (event.id, keys)
}

fn policy() -> RetentionPolicy {
    RetentionPolicy::from_days(90)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// An event submitted 91 days ago is torn down and archived; one submitted
/// 89 days ago is untouched.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_sweep_archives_expired_and_spares_recent(pool: PgPool) {
    let store = FakeStore::default();
    let (old_id, old_keys) = delivered_event(&pool, &store, "old", 3, 91).await;
    let (new_id, new_keys) = delivered_event(&pool, &store, "new", 2, 89).await;

    let report = run_sweep(&pool, &store, policy(), &CancellationToken::new())
        .await
        .expect("sweep should run");

    assert_eq!(report.events_scanned, 1);
    assert_eq!(report.events_archived, 1);
    assert_eq!(report.photos_deleted, 3);
    assert_eq!(report.assets_deleted, 3);
    assert!(report.fully_clean());

    let old_event = EventRepo::find_by_id(&pool, old_id).await.unwrap().unwrap();
    assert!(old_event.archived);
    assert!(old_event.photos_deleted_at.is_some());
    assert_eq!(PhotoRepo::count_for_event(&pool, old_id).await.unwrap(), 0);
    assert!(old_keys.iter().all(|k| !store.contains(k)));

    let new_event = EventRepo::find_by_id(&pool, new_id).await.unwrap().unwrap();
    assert!(!new_event.archived);
    assert_eq!(PhotoRepo::count_for_event(&pool, new_id).await.unwrap(), 2);
    assert!(new_keys.iter().all(|k| store.contains(k)));
}

/// Running the sweep twice converges to the same state as running it once.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_sweep_is_idempotent(pool: PgPool) {
    let store = FakeStore::default();
    let (event_id, _) = delivered_event(&pool, &store, "idem", 2, 120).await;

    let first = run_sweep(&pool, &store, policy(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.events_archived, 1);

    let second = run_sweep(&pool, &store, policy(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.events_scanned, 0, "archived events must not be rescanned");
    assert_eq!(second.events_archived, 0);
    assert!(second.fully_clean());

    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert!(event.archived);
}

/// An asset already gone from the CDN counts as success, not failure.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_missing_asset_is_success(pool: PgPool) {
    let store = FakeStore::default();
    let (event_id, keys) = delivered_event(&pool, &store, "gone", 2, 100).await;

    // Simulate a prior partial run that deleted one asset but crashed
    // before removing the row.
    store.delete(&keys[0]).await.unwrap();

    let report = run_sweep(&pool, &store, policy(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.assets_missing, 1);
    assert_eq!(report.assets_deleted, 1);
    assert_eq!(report.photos_deleted, 2);
    assert_eq!(report.events_archived, 1);
    assert!(report.fully_clean());

    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert!(event.archived);
}

/// A failed asset delete keeps the photo row and the event for the next
/// run, which then converges once the CDN recovers.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_failed_asset_delete_retries_next_run(pool: PgPool) {
    let store = FakeStore::default();
    let (event_id, keys) = delivered_event(&pool, &store, "flaky", 2, 100).await;
    store.fail_on(&keys[1]);

    let first = run_sweep(&pool, &store, policy(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.errors.len(), 1);
    assert_eq!(first.photos_deleted, 1);
    assert_eq!(first.events_archived, 0, "a dirty event must not be archived");

    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert!(!event.archived);
    assert_eq!(PhotoRepo::count_for_event(&pool, event_id).await.unwrap(), 1);

    // CDN recovers; the rerun picks up the leftover photo and finishes.
    store.clear_failures();
    let second = run_sweep(&pool, &store, policy(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(second.fully_clean());
    assert_eq!(second.photos_deleted, 1);
    assert_eq!(second.events_archived, 1);
    assert!(!store.contains(&keys[1]));

    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert!(event.archived);
    assert_eq!(PhotoRepo::count_for_event(&pool, event_id).await.unwrap(), 0);
}

/// A cancelled token stops the sweep before it touches anything.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancelled_sweep_leaves_state_untouched(pool: PgPool) {
    let store = FakeStore::default();
    let (event_id, keys) = delivered_event(&pool, &store, "cancel", 2, 100).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = run_sweep(&pool, &store, policy(), &cancel).await.unwrap();

    assert_eq!(report.events_scanned, 0);
    assert_eq!(report.photos_deleted, 0);
    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert!(!event.archived);
    assert!(keys.iter().all(|k| store.contains(k)));
}
