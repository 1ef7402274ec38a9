//! Integration tests for role administration and the authorization gate.

use shopfront_auth::RegisterRequest;
use shopfront_core::error::ErrorKind;
use shopfront_entity::permission::CreatePermission;
use shopfront_entity::role::{BuiltinRole, CreateRole, RoleName, UpdateRole};

use crate::helpers::TestApp;

fn custom(name: &str) -> RoleName {
    name.parse().expect("valid role name")
}

#[tokio::test]
async fn test_bootstrap_roles_is_idempotent() {
    let app = TestApp::new().await;

    let seeded = app.auth.authority.bootstrap_roles().await.unwrap();
    assert_eq!(seeded, 0);

    let root = app.super_admin().await;
    let roles = app.auth.authority.list_roles(&root).await.unwrap();
    for builtin in BuiltinRole::ALL {
        assert_eq!(
            roles.iter().filter(|r| r.name == builtin).count(),
            1,
            "{builtin} seeded once"
        );
    }
}

#[tokio::test]
async fn test_custom_role_permissions_reach_principal() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let authority = &app.auth.authority;

    let permission = authority
        .create_permission(
            &root,
            CreatePermission {
                name: "orders:read".to_string(),
                description: Some("Read any order".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(permission.name, "ORDERS:READ");

    let support = authority
        .create_role(
            &root,
            CreateRole {
                name: custom("support"),
                description: None,
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap();
    authority
        .add_permission_to_role(&root, support.id, permission.id)
        .await
        .unwrap();

    let alice = app.register("alice", "pw123").await;
    authority
        .add_role_to_user(&root, alice.user_id, support.id)
        .await
        .unwrap();

    let caller = app.principal(&alice).await;
    assert!(caller.has_role(&custom("SUPPORT")));
    assert!(caller.has_permission("orders:read"));
    assert!(!caller.is_privileged());
}

#[tokio::test]
async fn test_permission_toggle_is_exact() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let authority = &app.auth.authority;

    let permission = authority
        .create_permission(
            &root,
            CreatePermission {
                name: "catalog.write".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    let role = authority
        .get_role_by_name(&root, &BuiltinRole::Admin.into())
        .await
        .unwrap();

    let err = authority
        .remove_permission_from_role(&root, role.id, permission.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    authority
        .add_permission_to_role(&root, role.id, permission.id)
        .await
        .unwrap();
    let err = authority
        .add_permission_to_role(&root, role.id, permission.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let role = authority
        .remove_permission_from_role(&root, role.id, permission.id)
        .await
        .unwrap();
    assert!(!role.has_permission(permission.id));
}

#[tokio::test]
async fn test_admin_cannot_grant_super_admin() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let admin = app
        .auth
        .sessions
        .register_admin(
            &root,
            RegisterRequest::new("admin", "admin@example.com", "pw123"),
        )
        .await
        .unwrap();
    let admin = app.principal(&admin).await;
    let alice = app.register("alice", "pw123").await;

    let super_admin = app
        .auth
        .authority
        .builtin_role(BuiltinRole::SuperAdmin)
        .await
        .unwrap();
    let err = app
        .auth
        .authority
        .add_role_to_user(&admin, alice.user_id, super_admin.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthorizationFailed);

    let caller = app.principal(&alice).await;
    assert!(!caller.has_builtin(BuiltinRole::SuperAdmin));
}

#[tokio::test]
async fn test_plain_user_cannot_manage_roles() {
    let app = TestApp::new().await;
    let alice = app.register("alice", "pw123").await;
    let caller = app.principal(&alice).await;

    let err = app
        .auth
        .authority
        .create_role(
            &caller,
            CreateRole {
                name: custom("AUDITOR"),
                description: None,
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthorizationFailed);

    let err = app.auth.authority.list_roles(&caller).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthorizationFailed);
}

#[tokio::test]
async fn test_role_lifecycle_guards() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let authority = &app.auth.authority;

    let user_role = authority.builtin_role(BuiltinRole::User).await.unwrap();
    let err = authority
        .update_role(
            &root,
            user_role.id,
            UpdateRole {
                name: custom("MEMBER"),
                description: None,
                permissions: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = authority.delete_role(&root, user_role.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let vip = authority
        .create_role(
            &root,
            CreateRole {
                name: custom("VIP"),
                description: None,
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap();
    let alice = app.register("alice", "pw123").await;
    authority
        .add_role_to_user(&root, alice.user_id, vip.id)
        .await
        .unwrap();

    let err = authority.delete_role(&root, vip.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    authority
        .remove_role_from_user(&root, alice.user_id, vip.id)
        .await
        .unwrap();
    authority.delete_role(&root, vip.id).await.unwrap();

    let err = authority.get_role(&root, vip.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_duplicate_role_name_is_rejected() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;

    let err = app
        .auth
        .authority
        .create_role(
            &root,
            CreateRole {
                name: BuiltinRole::Admin.into(),
                description: None,
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateResource);
}

#[tokio::test]
async fn test_super_admin_cannot_drop_own_role() {
    let app = TestApp::new().await;
    let root = app.super_admin().await;
    let super_admin = app
        .auth
        .authority
        .builtin_role(BuiltinRole::SuperAdmin)
        .await
        .unwrap();

    let err = app
        .auth
        .authority
        .remove_role_from_user(&root, root.user_id, super_admin.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}
