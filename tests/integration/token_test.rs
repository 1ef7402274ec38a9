//! Integration tests for token issuance, validation, and revocation.

use chrono::Duration;

use shopfront_auth::{Claims, JwtEncoder, TokenType};
use shopfront_core::error::ErrorKind;
use shopfront_database::UserStore;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.register("alice", "pw123").await;
    let bob = app.register("bob", "pw123").await;

    // Alice's header and signature around Bob's payload.
    let alice_parts: Vec<&str> = alice.access_token.split('.').collect();
    let bob_parts: Vec<&str> = bob.access_token.split('.').collect();
    let tampered = format!("{}.{}.{}", alice_parts[0], bob_parts[1], alice_parts[2]);

    let err = app.auth.tokens.validate(&tampered).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
    assert!(app.auth.tokens.extract_username(&tampered).is_err());
}

#[tokio::test]
async fn test_foreign_key_token_is_rejected() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;
    let claims = app.auth.tokens.decode(&login.access_token).unwrap();

    let forged = JwtEncoder::new(b"some-other-signing-key-of-enough-length", None)
        .encode(&claims)
        .unwrap();

    let err = app.auth.tokens.validate(&forged).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_refresh_token_cannot_authorize_requests() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;

    let err = app
        .auth
        .sessions
        .resolve_principal(&login.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let err = app
        .auth
        .sessions
        .refresh(&login.access_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;

    app.auth
        .sessions
        .refresh(&login.refresh_token)
        .await
        .unwrap();
    let err = app
        .auth
        .sessions
        .refresh(&login.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_expired_token_has_no_subject() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;
    app.advance(Duration::minutes(16));

    let err = app
        .auth
        .tokens
        .extract_username(&login.access_token)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenExpired);
}

#[tokio::test]
async fn test_claims_carry_identity() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;

    let claims: Claims = app.auth.tokens.validate(&login.access_token).await.unwrap();
    assert_eq!(claims.uid, login.user_id);
    assert_eq!(claims.typ, TokenType::Access);
    assert_eq!(claims.exp - claims.iat, 15 * 60);

    let refresh = app.auth.tokens.validate(&login.refresh_token).await.unwrap();
    assert_eq!(refresh.typ, TokenType::Refresh);
    assert_ne!(refresh.jti, claims.jti);
}

#[tokio::test]
async fn test_disabled_account_loses_session() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;

    let mut user = app.store.find_by_id(login.user_id).await.unwrap().unwrap();
    user.enabled = false;
    app.store.save(&user).await.unwrap();

    let err = app
        .auth
        .sessions
        .resolve_principal(&login.access_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let err = app
        .auth
        .sessions
        .authenticate("alice", "pw123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
}

#[tokio::test]
async fn test_logout_everywhere_revokes_all_sessions() {
    let app = TestApp::new().await;
    let first = app.register("alice", "pw123").await;
    let second = app
        .auth
        .sessions
        .authenticate("alice", "pw123")
        .await
        .unwrap();
    app.advance(Duration::seconds(1));

    let caller = app.principal(&second).await;
    app.auth.sessions.logout_everywhere(&caller).await.unwrap();

    for token in [
        &first.access_token,
        &first.refresh_token,
        &second.access_token,
        &second.refresh_token,
    ] {
        assert!(!app.auth.tokens.is_valid(token).await);
    }

    let fresh = app
        .auth
        .sessions
        .authenticate("alice", "pw123")
        .await
        .unwrap();
    assert!(app.auth.tokens.is_valid(&fresh.access_token).await);
}
