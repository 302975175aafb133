//! Login, refresh rotation, and logout over the in-memory adapters
mod common;

use chrono::Duration;
use common::{Harness, PASSWORD};
use http::StatusCode;
use session_service::db::TokenStore;
use session_service::models::{NewTokenRecord, TokenKind};
use session_service::security::TokenClass;
use session_service::services::{ReusePolicy, SessionIssuer};
use session_service::status::{ErrorResponse, INVALID_REFRESH_TOKEN};
use session_service::SessionError;

#[tokio::test]
async fn test_activated_account_gets_persisted_pair() {
    let h = Harness::new();
    let account = h.seed_account("ada@example.com", true).await;

    let pair = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());

    let record = h
        .tokens
        .find_by_owner_and_value(account.id, &pair.refresh_token)
        .await
        .unwrap()
        .expect("refresh record persisted");
    assert_eq!(record.kind, TokenKind::RefreshToken);
    assert_eq!(record.created_at, h.clock_now());
    assert_eq!(record.expires_at, h.clock_now() + Duration::days(30));

    let access = h
        .codec
        .verify(TokenClass::Access, &pair.access_token, h.clock_now())
        .unwrap();
    assert_eq!(access.sub, account.id.to_string());
    assert!(access.email.is_none());

    let refresh = h
        .codec
        .verify(TokenClass::Refresh, &pair.refresh_token, h.clock_now())
        .unwrap();
    assert_eq!(refresh.email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let h = Harness::new();
    h.seed_account("ada@example.com", true).await;

    let unknown = h
        .service
        .authenticate("nobody@example.com", PASSWORD)
        .await
        .unwrap_err();
    let wrong = h
        .service
        .authenticate("ada@example.com", "Wr0ng-Password!")
        .await
        .unwrap_err();

    for err in [&unknown, &wrong] {
        assert!(matches!(err, SessionError::InvalidCredentials));
        let response = ErrorResponse::from(err);
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.message, "Email or password incorrect");
    }
    assert!(h.tokens.is_empty().await);
}

#[tokio::test]
async fn test_unactivated_account_is_refused() {
    let h = Harness::new();
    h.seed_account("pending@example.com", false).await;

    let err = h
        .service
        .authenticate("pending@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotActivated));

    let response = ErrorResponse::from(&err);
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message, "User not activated");
    assert!(h.tokens.is_empty().await);
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let h = Harness::new();
    let account = h.seed_account("ada@example.com", true).await;
    let first = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let second = h.service.refresh(&first.refresh_token).await.unwrap();
    assert_eq!(second.account, account.projection());
    assert_eq!(
        second.account.profile_picture.as_deref(),
        Some("https://cdn.example.com/ada.png")
    );

    let replay = h.service.refresh(&first.refresh_token).await.unwrap_err();
    assert!(matches!(replay, SessionError::ReuseOrUnknownToken));
    let response = ErrorResponse::from(&replay);
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message, INVALID_REFRESH_TOKEN);

    let third = h.service.refresh(&second.refresh_token).await.unwrap();
    assert_ne!(third.refresh_token, second.refresh_token);

    let records = h.tokens.find_by_owner(account.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, third.refresh_token);
}

#[tokio::test]
async fn test_reject_only_keeps_sibling_sessions() {
    let h = Harness::new();
    h.seed_account("ada@example.com", true).await;
    let laptop = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();
    let phone = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    h.service.refresh(&laptop.refresh_token).await.unwrap();
    assert!(h.service.refresh(&laptop.refresh_token).await.is_err());

    assert!(h.service.refresh(&phone.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_revoke_all_policy_ends_every_session_on_reuse() {
    let h = Harness::with_policy(ReusePolicy::RevokeAll);
    h.seed_account("ada@example.com", true).await;
    let laptop = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();
    let phone = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let rotated = h.service.refresh(&laptop.refresh_token).await.unwrap();
    assert!(h.service.refresh(&laptop.refresh_token).await.is_err());

    for token in [&phone.refresh_token, &rotated.refresh_token] {
        assert!(matches!(
            h.service.refresh(token).await,
            Err(SessionError::ReuseOrUnknownToken)
        ));
    }
    assert!(h.tokens.is_empty().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_has_one_winner() {
    let h = Harness::new();
    let account = h.seed_account("ada@example.com", true).await;
    let pair = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = h.service.clone();
        let token = pair.refresh_token.clone();
        handles.push(tokio::spawn(async move { service.refresh(&token).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert!(matches!(err, SessionError::ReuseOrUnknownToken)),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(h.tokens.find_by_owner(account.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
    let h = Harness::new();
    h.seed_account("ada@example.com", true).await;
    let pair = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    h.clock.advance(Duration::days(30));
    let err = h.service.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, SessionError::ExpiredOrInvalidSignature));
    assert_eq!(ErrorResponse::from(&err).message, INVALID_REFRESH_TOKEN);
}

#[tokio::test]
async fn test_record_expired_before_token_is_reaped_at_lookup() {
    let h = Harness::new();
    let account = h.seed_account("ada@example.com", true).await;

    // Record outlives its creation by one day while the token itself lasts 30
    let issuer = SessionIssuer::new(h.tokens.clone(), h.codec.clone(), h.clock.clone());
    let (pair, _) = issuer.mint(&account).unwrap();
    h.tokens
        .create(
            NewTokenRecord::new(
                account.id,
                TokenKind::RefreshToken,
                pair.refresh_token.clone(),
                h.clock_now() + Duration::days(1),
                h.clock_now(),
            )
            .unwrap(),
        )
        .await
        .unwrap();

    h.clock.advance(Duration::days(2));
    assert!(matches!(
        h.service.refresh(&pair.refresh_token).await,
        Err(SessionError::ReuseOrUnknownToken)
    ));
    assert!(h.tokens.is_empty().await);
}

#[tokio::test]
async fn test_tampered_and_cross_class_tokens_are_rejected() {
    let h = Harness::new();
    h.seed_account("ada@example.com", true).await;
    let pair = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    // Flip one payload character so the signature no longer matches
    let mut segments: Vec<String> = pair.refresh_token.split('.').map(String::from).collect();
    let payload = &mut segments[1];
    let last = payload.pop().unwrap();
    payload.push(if last == 'x' { 'y' } else { 'x' });
    let tampered = segments.join(".");

    for raw in [tampered.as_str(), pair.access_token.as_str(), ""] {
        assert!(matches!(
            h.service.refresh(raw).await,
            Err(SessionError::ExpiredOrInvalidSignature)
        ));
    }
}

#[tokio::test]
async fn test_logout_and_revoke_all() {
    let h = Harness::new();
    let account = h.seed_account("ada@example.com", true).await;
    let first = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();
    let second = h
        .service
        .authenticate("ada@example.com", PASSWORD)
        .await
        .unwrap();

    h.service.logout(&first.refresh_token).await.unwrap();
    h.service.logout(&first.refresh_token).await.unwrap();
    assert!(matches!(
        h.service.refresh(&first.refresh_token).await,
        Err(SessionError::ReuseOrUnknownToken)
    ));

    assert_eq!(h.service.revoke_all(account.id).await.unwrap(), 1);
    assert!(h.service.refresh(&second.refresh_token).await.is_err());
    assert_eq!(h.service.revoke_all(account.id).await.unwrap(), 0);
}
