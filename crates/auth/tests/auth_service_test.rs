//! Integration tests for the session and invite flows.

use auth::token::hash_token;
use auth::{AuthConfig, AuthService, RegisterInput};
use chrono::{Duration, Utc};
use tour::MemoryStore;
use tour::error::TourError;
use tour::models::invite::{CreateInvite, InviteCreator};
use tour::models::session::CreateSession;
use tour::models::user::{Role, User};
use tour::repository::{InviteRepository, SessionRepository};

fn setup() -> (AuthService<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    (AuthService::new(store.clone(), AuthConfig::default()), store)
}

fn input(token: &str, email: &str, name: &str) -> RegisterInput {
    RegisterInput {
        token: token.into(),
        email: email.into(),
        name: name.into(),
    }
}

/// Bootstraps the first (admin) operator.
async fn admin(svc: &AuthService<MemoryStore>) -> User {
    let status = svc.bootstrap().await.unwrap();
    let invite = status.invite.unwrap();
    svc.register(input(&invite.token, "admin@example.com", "Admin"))
        .await
        .unwrap()
        .user
}

#[tokio::test]
async fn bootstrap_then_first_user_is_admin() {
    let (svc, _) = setup();

    let status = svc.bootstrap().await.unwrap();
    assert!(status.needs_bootstrap);
    let first = status.invite.unwrap();
    assert_eq!(first.created_by, InviteCreator::System);

    // Repeated calls hand out the same pending invite.
    let again = svc.bootstrap().await.unwrap().invite.unwrap();
    assert_eq!(again.token, first.token);

    let out = svc
        .register(input(&first.token, "  Root@Example.com ", "Root"))
        .await
        .unwrap();
    assert_eq!(out.user.role, Role::Admin);
    assert_eq!(out.user.email, "root@example.com");

    let status = svc.bootstrap().await.unwrap();
    assert!(!status.needs_bootstrap);
    assert!(status.invite.is_none());
}

#[tokio::test]
async fn later_registrations_are_standard() {
    let (svc, _) = setup();
    let root = admin(&svc).await;

    let invite = svc
        .create_invite(InviteCreator::User(root.id), None)
        .await
        .unwrap();
    let out = svc
        .register(input(&invite.token, "ops@example.com", "Ops"))
        .await
        .unwrap();
    assert_eq!(out.user.role, Role::Standard);
    assert_eq!(out.user.invited_by, Some(root.id));
}

#[tokio::test]
async fn invite_cannot_be_redeemed_twice() {
    let (svc, _) = setup();
    let root = admin(&svc).await;
    let invite = svc
        .create_invite(InviteCreator::User(root.id), None)
        .await
        .unwrap();

    svc.register(input(&invite.token, "a@example.com", "A"))
        .await
        .unwrap();
    let err = svc
        .register(input(&invite.token, "b@example.com", "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, TourError::InviteAlreadyUsed), "got {err:?}");

    let err = svc.validate_invite(&invite.token).await.unwrap_err();
    assert!(matches!(err, TourError::InviteAlreadyUsed));
}

#[tokio::test]
async fn expired_invite_is_rejected() {
    let (svc, store) = setup();
    store
        .create_invite(CreateInvite {
            token: "stale".into(),
            email: None,
            created_by: InviteCreator::System,
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();

    let err = svc.validate_invite("stale").await.unwrap_err();
    assert!(matches!(err, TourError::InviteExpired));
    let err = svc
        .register(input("stale", "late@example.com", "Late"))
        .await
        .unwrap_err();
    assert!(matches!(err, TourError::InviteExpired));

    assert!(svc.validate_invite("nope").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn bound_invite_requires_matching_email() {
    let (svc, _) = setup();
    let root = admin(&svc).await;
    let invite = svc
        .create_invite(InviteCreator::User(root.id), Some("Guest@Example.com"))
        .await
        .unwrap();

    let check = svc.validate_invite(&invite.token).await.unwrap();
    assert!(check.valid);
    assert_eq!(check.email.as_deref(), Some("guest@example.com"));

    let err = svc
        .register(input(&invite.token, "other@example.com", "Other"))
        .await
        .unwrap_err();
    assert!(matches!(err, TourError::InviteEmailMismatch));

    // Case-insensitive match succeeds.
    svc.register(input(&invite.token, "GUEST@example.com", "Guest"))
        .await
        .unwrap();
}

#[tokio::test]
async fn existing_email_conflicts_and_keeps_invite() {
    let (svc, _) = setup();
    let root = admin(&svc).await;
    let invite = svc
        .create_invite(InviteCreator::User(root.id), None)
        .await
        .unwrap();

    let err = svc
        .register(input(&invite.token, "admin@example.com", "Again"))
        .await
        .unwrap_err();
    assert!(matches!(err, TourError::Conflict { .. }));
    assert!(svc.validate_invite(&invite.token).await.unwrap().valid);
}

#[tokio::test]
async fn login_issues_session_that_authenticates() {
    let (svc, _) = setup();
    let root = admin(&svc).await;

    let out = svc.login("ADMIN@example.com").await.unwrap();
    assert_eq!(out.user.id, root.id);
    assert_eq!(out.session.token_hash, hash_token(&out.token));
    let lifetime = out.session.expires_at - out.session.created_at;
    assert!((lifetime - Duration::days(7)).num_seconds().abs() < 5);

    let ctx = svc.authenticate(&out.token).await.unwrap();
    assert_eq!(ctx.user.id, root.id);

    svc.logout(ctx.session.id).await.unwrap();
    let err = svc.authenticate(&out.token).await.unwrap_err();
    assert!(matches!(err, TourError::Unauthenticated));
}

#[tokio::test]
async fn unknown_email_cannot_login() {
    let (svc, _) = setup();
    admin(&svc).await;
    assert!(svc.login("ghost@example.com").await.unwrap_err().is_not_found());
    assert!(matches!(
        svc.login("   ").await.unwrap_err(),
        TourError::Validation { .. }
    ));
}

#[tokio::test]
async fn expired_session_is_removed_on_lookup() {
    let (svc, store) = setup();
    let root = admin(&svc).await;
    let raw = "expired-session-token";
    store
        .create_session(CreateSession {
            user_id: root.id,
            token_hash: hash_token(raw),
            expires_at: Utc::now() - Duration::seconds(1),
        })
        .await
        .unwrap();

    for _ in 0..2 {
        let err = svc.authenticate(raw).await.unwrap_err();
        assert!(matches!(err, TourError::Unauthenticated));
    }
    assert!(
        store
            .find_session_by_token_hash(&hash_token(raw))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn purge_counts_expired_sessions() {
    let (svc, store) = setup();
    let root = admin(&svc).await;
    store
        .create_session(CreateSession {
            user_id: root.id,
            token_hash: hash_token("old"),
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();
    assert_eq!(svc.purge_expired_sessions().await.unwrap(), 1);
    assert_eq!(svc.purge_expired_sessions().await.unwrap(), 0);
}

#[tokio::test]
async fn only_creator_or_admin_can_revoke() {
    let (svc, _) = setup();
    let root = admin(&svc).await;

    let mut operators = Vec::new();
    for email in ["one@example.com", "two@example.com"] {
        let invite = svc
            .create_invite(InviteCreator::User(root.id), None)
            .await
            .unwrap();
        operators.push(svc.register(input(&invite.token, email, "Op")).await.unwrap().user);
    }
    let (one, two) = (&operators[0], &operators[1]);

    let mine = svc
        .create_invite(InviteCreator::User(one.id), None)
        .await
        .unwrap();
    let err = svc.revoke_invite(mine.id, two).await.unwrap_err();
    assert!(matches!(err, TourError::Forbidden { .. }));

    assert_eq!(svc.list_invites(one).await.unwrap().len(), 1);
    svc.revoke_invite(mine.id, one).await.unwrap();
    assert!(svc.list_invites(one).await.unwrap().is_empty());

    let theirs = svc
        .create_invite(InviteCreator::User(two.id), None)
        .await
        .unwrap();
    svc.revoke_invite(theirs.id, &root).await.unwrap();
    assert!(svc.revoke_invite(theirs.id, &root).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn oversized_lifetime_fails_instead_of_panicking() {
    let svc = AuthService::new(
        MemoryStore::new(),
        AuthConfig {
            session_lifetime_secs: 9_000_000_000_000,
            invite_lifetime_secs: 10_000_000_000_000_000,
        },
    );

    let err = svc.bootstrap().await.unwrap_err();
    assert!(matches!(err, TourError::Internal(_)));
    let err = svc
        .create_invite(InviteCreator::System, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TourError::Internal(_)));
}
