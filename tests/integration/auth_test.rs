//! Integration tests for the credential and session flows.

use chrono::Duration;

use shopfront_auth::RegisterRequest;
use shopfront_core::error::ErrorKind;
use shopfront_database::UserStore;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new().await;
    app.register("alice", "pw123").await;

    let response = app
        .auth
        .sessions
        .authenticate("alice", "pw123")
        .await
        .unwrap();

    assert_eq!(response.token_type, "Bearer");
    assert_eq!(
        response.expires_in_seconds,
        app.config.auth.jwt_access_ttl_minutes as i64 * 60
    );
    assert_eq!(
        app.auth
            .tokens
            .extract_username(&response.access_token)
            .unwrap(),
        "alice"
    );
    assert!(response.roles.unwrap().contains("USER"));
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_username() {
    let app = TestApp::new().await;
    app.register("alice", "pw123").await;

    let response = app
        .auth
        .sessions
        .authenticate("ALICE", "pw123")
        .await
        .unwrap();
    assert_eq!(response.username, "alice");
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new().await;
    app.register("alice", "pw123").await;

    let err = app
        .auth
        .sessions
        .authenticate("alice", "wrongpassword")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
}

#[tokio::test]
async fn test_login_nonexistent_user() {
    let app = TestApp::new().await;

    let err = app
        .auth
        .sessions
        .authenticate("nobody", "pw123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_race() {
    let app = TestApp::new().await;

    let attempts = (0..10).map(|i| {
        let sessions = app.auth.sessions.clone();
        tokio::spawn(async move {
            sessions
                .register(RegisterRequest::new(
                    "alice",
                    format!("alice{i}@example.com"),
                    "pw123",
                ))
                .await
        })
    });

    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind == ErrorKind::DuplicateResource)
    );
}

#[tokio::test]
async fn test_open_registration_never_grants_privilege() {
    let app = TestApp::new().await;
    let alice = app.register("alice", "pw123").await;
    let caller = app.principal(&alice).await;

    assert!(!caller.is_privileged());
    let err = app
        .auth
        .sessions
        .register_super_admin(
            &caller,
            RegisterRequest::new("mallory", "mallory@example.com", "pw123"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthorizationFailed);
    assert!(
        !app.store
            .exists_by_username("mallory")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_admin_registration_response_visibility() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;

    let admin = app
        .auth
        .sessions
        .register_admin(
            &root,
            RegisterRequest::new("admin", "admin@example.com", "pw123").with_full_name("Ada"),
        )
        .await
        .unwrap();
    assert_eq!(admin.email.as_deref(), Some("admin@example.com"));

    let alice = app.register("alice", "pw123").await;
    let viewer = app.principal(&alice).await;
    let shown = admin.visible_to(&viewer);
    assert!(shown.is_public());
    assert_eq!(shown.username, "admin");
}

#[tokio::test]
async fn test_refresh_round_trip() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;
    app.advance(Duration::minutes(20));

    let err = app
        .auth
        .tokens
        .validate(&login.access_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenExpired);

    let refreshed = app
        .auth
        .sessions
        .refresh(&login.refresh_token)
        .await
        .unwrap();
    let claims = app
        .auth
        .tokens
        .validate(&refreshed.access_token)
        .await
        .unwrap();
    assert_eq!(claims.sub, "alice");
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;
    app.advance(Duration::days(8));

    let err = app
        .auth
        .sessions
        .refresh(&login.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenExpired);
}

#[tokio::test]
async fn test_logout_then_reuse() {
    let app = TestApp::new().await;
    let login = app.register("alice", "pw123").await;

    app.auth.sessions.logout(&login.access_token).await.unwrap();
    assert!(!app.auth.tokens.is_valid(&login.access_token).await);

    // Logging out twice is harmless.
    app.auth.sessions.logout(&login.access_token).await.unwrap();
}

#[tokio::test]
async fn test_logout_with_garbage_token() {
    let app = TestApp::new().await;

    let err = app
        .auth
        .sessions
        .logout("not-a-token")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_super_admin_password_reset_flow() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let ops = app
        .auth
        .sessions
        .register_super_admin(
            &root,
            RegisterRequest::new("ops", "ops@example.com", "ops-password"),
        )
        .await
        .unwrap();
    app.advance(Duration::seconds(1));

    app.auth
        .sessions
        .reset_super_admin_password(&root, "ops", "fresh-password")
        .await
        .unwrap();

    assert!(!app.auth.tokens.is_valid(&ops.refresh_token).await);
    assert!(
        app.auth
            .sessions
            .authenticate("ops", "fresh-password")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_reset_on_non_super_admin_leaves_hash() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let alice = app.register("alice", "pw123").await;
    let before = app.store.find_by_id(alice.user_id).await.unwrap().unwrap();

    let err = app
        .auth
        .sessions
        .reset_super_admin_password(&root, "alice", "hijacked1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidRole);

    let after = app.store.find_by_id(alice.user_id).await.unwrap().unwrap();
    assert_eq!(before.password_hash, after.password_hash);
    assert_eq!(before.updated_at, after.updated_at);
}
