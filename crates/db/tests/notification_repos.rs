//! Integration tests for the notification repositories.
//!
//! Exercises the repository layer against a real database:
//! - Seeded notification catalog
//! - Idempotent dispatch creation
//! - Compare-and-set status transitions
//! - Settings upsert and the missing-row case
//! - Target cleanup cascading to dispatches

use docket_core::dispatch_status::DispatchStatus;
use docket_core::roles::UserRole;
use docket_db::models::notification::{CreateNotification, UpdateNotificationSetting};
use docket_db::repositories::{
    NotificationDispatchRepo, NotificationRepo, NotificationSettingRepo, NotificationTargetRepo,
    NotificationTypeRepo, PushDeviceRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_user(pool: &PgPool, email: &str, role: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (email, first_name, last_name, role) \
         VALUES ($1, 'Test', 'User', $2) RETURNING id",
    )
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_notification(pool: &PgPool, tag: &str, target_id: &str) -> i64 {
    let notification_type = NotificationTypeRepo::get_by_runtime_tag(pool, tag)
        .await
        .unwrap()
        .expect("seeded type");
    NotificationRepo::create(
        pool,
        &CreateNotification {
            notification_type_id: notification_type.id,
            title: "Matter updated".to_string(),
            extra_payload: serde_json::json!({ "new_status": "closed" }),
            target_kind: "matter".to_string(),
            target_id: target_id.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_types_and_groups(pool: PgPool) {
    docket_db::health_check(&pool).await.unwrap();

    let groups = NotificationTypeRepo::list_groups(&pool).await.unwrap();
    assert_eq!(groups.len(), 7);

    let all = NotificationTypeRepo::list_all(&pool).await.unwrap();
    assert_eq!(all.len(), 29);

    let status_update = NotificationTypeRepo::get_by_runtime_tag(&pool, "matter_status_update")
        .await
        .unwrap()
        .unwrap();
    assert!(status_update.is_for_client);
    assert_eq!(status_update.recipient_type(), "client");

    let for_clients = NotificationTypeRepo::list_for_role(&pool, UserRole::Client)
        .await
        .unwrap();
    assert!(for_clients.iter().all(|t| t.is_for_client));
    assert!(for_clients
        .iter()
        .any(|t| t.runtime_tag == "matter_status_update"));

    let stage = NotificationTypeRepo::get_by_runtime_tag(&pool, "matter_stage_update")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stage.recipient_type(), "client");
    let proposal_accepted = NotificationTypeRepo::get_by_runtime_tag(&pool, "proposal_accepted")
        .await
        .unwrap()
        .unwrap();
    assert!(proposal_accepted.is_for_attorney && !proposal_accepted.is_for_client);

    let missing = NotificationTypeRepo::get_by_runtime_tag(&pool, "no_such_tag")
        .await
        .unwrap();
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Dispatches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_dispatches_is_idempotent(pool: PgPool) {
    let a = insert_user(&pool, "a@example.com", "client").await;
    let b = insert_user(&pool, "b@example.com", "client").await;
    let notification_id = insert_notification(&pool, "matter_status_update", "1").await;

    let created =
        NotificationDispatchRepo::create_for_recipients(&pool, notification_id, None, &[a, b])
            .await
            .unwrap();
    assert_eq!(created.len(), 2);

    let again =
        NotificationDispatchRepo::create_for_recipients(&pool, notification_id, None, &[a, b])
            .await
            .unwrap();
    assert!(again.is_empty());

    let all = NotificationDispatchRepo::list_for_notification(&pool, notification_id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|d| d.status == "prepared"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transition_is_compare_and_set(pool: PgPool) {
    let a = insert_user(&pool, "a@example.com", "client").await;
    let notification_id = insert_notification(&pool, "matter_status_update", "1").await;
    let ids = NotificationDispatchRepo::create_for_recipients(&pool, notification_id, None, &[a])
        .await
        .unwrap();
    let id = ids[0];

    let moved =
        NotificationDispatchRepo::transition(&pool, id, DispatchStatus::Prepared, DispatchStatus::Sent)
            .await
            .unwrap();
    assert!(moved);

    // Row is no longer prepared, so the same transition is a no-op.
    let moved_again =
        NotificationDispatchRepo::transition(&pool, id, DispatchStatus::Prepared, DispatchStatus::Sent)
            .await
            .unwrap();
    assert!(!moved_again);

    let prepared = NotificationDispatchRepo::filter_prepared(&pool, &[id])
        .await
        .unwrap();
    assert!(prepared.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_prepared_listing_rotates_after_attempts(pool: PgPool) {
    let a = insert_user(&pool, "a@example.com", "client").await;
    let b = insert_user(&pool, "b@example.com", "client").await;
    let c = insert_user(&pool, "c@example.com", "client").await;
    let notification_id = insert_notification(&pool, "matter_status_update", "1").await;
    let ids =
        NotificationDispatchRepo::create_for_recipients(&pool, notification_id, None, &[a, b, c])
            .await
            .unwrap();

    let first = NotificationDispatchRepo::list_prepared_ids(&pool, 2).await.unwrap();
    assert_eq!(first, vec![ids[0], ids[1]]);

    let touched = NotificationDispatchRepo::touch_prepared(&pool, &first).await.unwrap();
    assert_eq!(touched, 2);

    let next = NotificationDispatchRepo::list_prepared_ids(&pool, 2).await.unwrap();
    assert_eq!(next, vec![ids[2], ids[0]]);

    // Sent dispatches are left alone.
    NotificationDispatchRepo::transition(&pool, ids[2], DispatchStatus::Prepared, DispatchStatus::Sent)
        .await
        .unwrap();
    let touched = NotificationDispatchRepo::touch_prepared(&pool, &[ids[2]]).await.unwrap();
    assert_eq!(touched, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unread_count_and_listing_order(pool: PgPool) {
    let a = insert_user(&pool, "a@example.com", "client").await;
    let first = insert_notification(&pool, "matter_status_update", "1").await;
    let second = insert_notification(&pool, "matter_status_update", "2").await;
    let d1 = NotificationDispatchRepo::create_for_recipients(&pool, first, None, &[a])
        .await
        .unwrap()[0];
    let d2 = NotificationDispatchRepo::create_for_recipients(&pool, second, None, &[a])
        .await
        .unwrap()[0];

    NotificationDispatchRepo::transition(&pool, d1, DispatchStatus::Prepared, DispatchStatus::Read)
        .await
        .unwrap();

    assert_eq!(NotificationDispatchRepo::unread_count(&pool, a).await.unwrap(), 1);

    let listed = NotificationDispatchRepo::list_for_recipient(&pool, a, 10, 0)
        .await
        .unwrap();
    let ids: Vec<i64> = listed.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![d2, d1]);

    let mine = NotificationDispatchRepo::find_for_recipient(&pool, d1, a)
        .await
        .unwrap();
    assert!(mine.is_some());
    let other = insert_user(&pool, "b@example.com", "client").await;
    let not_mine = NotificationDispatchRepo::find_for_recipient(&pool, d1, other)
        .await
        .unwrap();
    assert!(not_mine.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deliveries_join_settings(pool: PgPool) {
    let with_settings = insert_user(&pool, "a@example.com", "client").await;
    let without_settings = insert_user(&pool, "b@example.com", "client").await;
    NotificationSettingRepo::upsert(
        &pool,
        with_settings,
        &UpdateNotificationSetting {
            by_push: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let notification_id = insert_notification(&pool, "matter_status_update", "1").await;
    let ids = NotificationDispatchRepo::create_for_recipients(
        &pool,
        notification_id,
        None,
        &[with_settings, without_settings],
    )
    .await
    .unwrap();

    let deliveries = NotificationDispatchRepo::list_deliveries(&pool, &ids)
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 2);

    let a = deliveries
        .iter()
        .find(|d| d.recipient_id == with_settings)
        .unwrap();
    assert_eq!(a.runtime_tag, "matter_status_update");
    assert_eq!(a.extra_payload["new_status"], "closed");
    let prefs = a.preferences().unwrap();
    assert!(prefs.by_email);
    assert!(!prefs.by_push);

    let b = deliveries
        .iter()
        .find(|d| d.recipient_id == without_settings)
        .unwrap();
    assert!(b.preferences().is_none());
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_settings_partial_upsert(pool: PgPool) {
    let user = insert_user(&pool, "a@example.com", "client").await;

    assert!(NotificationSettingRepo::get_for_user(&pool, user)
        .await
        .unwrap()
        .is_none());

    let created = NotificationSettingRepo::get_or_create(&pool, user).await.unwrap();
    assert!(created.by_email && created.by_push && created.by_matters);

    let updated = NotificationSettingRepo::upsert(
        &pool,
        user,
        &UpdateNotificationSetting {
            by_matters: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!updated.by_matters);
    assert!(updated.by_email);

    // get_or_create returns the existing row untouched.
    let existing = NotificationSettingRepo::get_or_create(&pool, user).await.unwrap();
    assert_eq!(existing.id, created.id);
    assert!(!existing.by_matters);

    let listed = NotificationSettingRepo::list_for_users(&pool, &[user, user + 1000])
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

// ---------------------------------------------------------------------------
// Targets and cleanup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_target_notifications_cascades(pool: PgPool) {
    let user = insert_user(&pool, "a@example.com", "client").await;
    NotificationTargetRepo::upsert(&pool, "matter", "7", &serde_json::json!({ "id": 7 }))
        .await
        .unwrap();
    let notification_id = insert_notification(&pool, "matter_status_update", "7").await;
    let ids = NotificationDispatchRepo::create_for_recipients(&pool, notification_id, None, &[user])
        .await
        .unwrap();

    assert!(NotificationTargetRepo::delete(&pool, "matter", "7").await.unwrap());
    assert!(NotificationTargetRepo::find(&pool, "matter", "7")
        .await
        .unwrap()
        .is_none());

    let deleted = NotificationRepo::delete_for_target(&pool, "matter", "7")
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(NotificationRepo::find_by_id(&pool, notification_id)
        .await
        .unwrap()
        .is_none());
    assert!(NotificationDispatchRepo::find_by_id(&pool, ids[0])
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Users and devices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_follower_queries(pool: PgPool) {
    let attorney = insert_user(&pool, "att@example.com", "attorney").await;
    let follower = insert_user(&pool, "f@example.com", "client").await;
    let inactive = insert_user(&pool, "gone@example.com", "client").await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(inactive)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO user_followers (user_id, follower_id) VALUES ($1, $2), ($1, $3)")
        .bind(attorney)
        .bind(follower)
        .bind(inactive)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO topic_followers (topic_id, user_id) VALUES (3, $1)")
        .bind(follower)
        .execute(&pool)
        .await
        .unwrap();

    let followers = UserRepo::list_followers(&pool, attorney).await.unwrap();
    assert_eq!(followers.iter().map(|u| u.id).collect::<Vec<_>>(), vec![follower]);

    let topic = UserRepo::list_topic_followers(&pool, 3).await.unwrap();
    assert_eq!(topic.len(), 1);
    assert!(UserRepo::list_post_followers(&pool, 3).await.unwrap().is_empty());

    let by_ids = UserRepo::list_by_ids(&pool, &[attorney, inactive]).await.unwrap();
    assert_eq!(by_ids.len(), 1);
    assert!(by_ids[0].is_attorney());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_push_device_registration(pool: PgPool) {
    let a = insert_user(&pool, "a@example.com", "client").await;
    let b = insert_user(&pool, "b@example.com", "client").await;

    PushDeviceRepo::register(&pool, a, "token-1").await.unwrap();
    assert_eq!(PushDeviceRepo::list_active_for_user(&pool, a).await.unwrap().len(), 1);

    // Re-registering the same token moves it to the new user.
    let moved = PushDeviceRepo::register(&pool, b, "token-1").await.unwrap();
    assert_eq!(moved.user_id, b);
    assert!(PushDeviceRepo::list_active_for_user(&pool, a).await.unwrap().is_empty());

    assert!(PushDeviceRepo::deactivate(&pool, "token-1").await.unwrap());
    assert!(PushDeviceRepo::list_active_for_user(&pool, b).await.unwrap().is_empty());
}
