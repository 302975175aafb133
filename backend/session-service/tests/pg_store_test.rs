//! PostgreSQL adapter checks
//!
//! Run with `DATABASE_URL` pointing at a disposable database:
//! `cargo test --test pg_store_test -- --ignored`
use chrono::{Duration, Utc};
use session_service::db::{AccountRepository, PgAccountRepository, PgTokenStore, TokenStore};
use session_service::models::{NewAccount, NewTokenRecord, TokenKind};
use session_service::SessionError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connect to PostgreSQL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn new_account(tag: &str) -> NewAccount {
    NewAccount {
        name: "Pg Test".to_string(),
        username: format!("pg_{tag}"),
        email: format!("pg-{tag}@example.com"),
        password_hash: "$argon2id$placeholder".to_string(),
        activated: false,
    }
}

#[tokio::test]
#[ignore]
async fn test_account_and_token_round_trip() {
    let pool = pool().await;
    let accounts = PgAccountRepository::new(pool.clone());
    let tokens = PgTokenStore::new(pool.clone());

    let tag = Uuid::new_v4().simple().to_string()[..12].to_string();
    let account = accounts.create(new_account(&tag)).await.unwrap();
    assert!(matches!(
        accounts.create(new_account(&tag)).await,
        Err(SessionError::UsernameAlreadyExists) | Err(SessionError::EmailAlreadyExists)
    ));

    assert!(accounts
        .update_activated_flag(account.id, true)
        .await
        .unwrap());
    assert!(accounts.find_by_id(account.id).await.unwrap().unwrap().activated);

    let now = Utc::now();
    let record = NewTokenRecord::new(
        account.id,
        TokenKind::RefreshToken,
        format!("refresh-{tag}"),
        now + Duration::days(30),
        now,
    )
    .unwrap();
    let created = tokens.create(record).await.unwrap();

    let replacement = NewTokenRecord::new(
        account.id,
        TokenKind::RefreshToken,
        format!("refresh-{tag}-2"),
        now + Duration::days(30),
        now,
    )
    .unwrap();
    let rotated = tokens
        .rotate(created.id, replacement.clone())
        .await
        .unwrap()
        .expect("first rotation wins");
    assert!(tokens.rotate(created.id, replacement).await.unwrap().is_none());

    let remaining = tokens.find_by_owner(account.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, rotated.id);

    assert_eq!(
        tokens
            .delete_many(account.id, TokenKind::RefreshToken)
            .await
            .unwrap(),
        1
    );
    tokens.delete_by_id(rotated.id).await.unwrap();
}
