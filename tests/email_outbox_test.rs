//! Outbox worker behaviour against a migrated Postgres at `DATABASE_URL`.
//! Run with `cargo test -- --ignored`.

mod common;

use mockhire_backend::services::notification_service::{EmailRelay, NotificationService};
use sqlx::PgPool;
use uuid::Uuid;

use common::db_app;

async fn seed_claimed(pool: &PgPool, claimed_minutes_ago: i32) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO email_outbox (template, recipient, subject, html, status, created_at, updated_at)
        VALUES ('reminder', $1, 'Reminder', '<p>hi</p>', 'sending',
                NOW() - INTERVAL '30 days', NOW() - make_interval(mins => $2))
        RETURNING id
        "#,
    )
    .bind(format!("outbox_{}@example.com", Uuid::new_v4()))
    .bind(claimed_minutes_ago)
    .fetch_one(pool)
    .await
    .expect("seed outbox row")
}

async fn status_of(pool: &PgPool, id: Uuid) -> String {
    sqlx::query_scalar(r#"SELECT status FROM email_outbox WHERE id = $1"#)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn abandoned_claims_are_delivered_again() {
    let (_app, pool) = db_app().await;
    let abandoned = seed_claimed(&pool, 30).await;
    let in_flight = seed_claimed(&pool, 0).await;

    // No relay configured, so a delivered row ends up `skipped`.
    let worker = NotificationService::new(pool.clone(), EmailRelay::default());
    for _ in 0..200 {
        if status_of(&pool, abandoned).await != "sending" {
            break;
        }
        if !worker.run_once().await.expect("run_once") {
            break;
        }
    }

    assert_eq!(status_of(&pool, abandoned).await, "skipped");
    assert_eq!(status_of(&pool, in_flight).await, "sending");

    sqlx::query(r#"DELETE FROM email_outbox WHERE id = ANY($1)"#)
        .bind(vec![abandoned, in_flight])
        .execute(&pool)
        .await
        .unwrap();
}
