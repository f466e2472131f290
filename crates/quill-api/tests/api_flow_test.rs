//! End-to-end handler flows against a live database.
//!
//! These tests call the handler functions directly with a real `Database`,
//! real signing keys, and the mock assist backend, covering the journeys the
//! HTTP layer stitches together: register, login, note CRUD, organization,
//! sharing, and export.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use quill_api::handlers::{auth, features, notes, user};
use quill_api::{ApiError, AppState, AuthUser};
use quill_assist::MockAssistBackend;
use quill_auth::JwtKeys;
use quill_core::{EventBus, SharePermission, UserRole};
use quill_db::test_fixtures::{unique_email, TestDatabase};

fn test_keys() -> JwtKeys {
    JwtKeys::new("integration-test-secret", chrono::Duration::hours(1))
}

async fn test_state() -> (TestDatabase, AppState) {
    let test_db = TestDatabase::new().await;
    let state = AppState {
        db: test_db.db.clone(),
        keys: test_keys(),
        event_bus: Arc::new(EventBus::new(32)),
        assist: Arc::new(MockAssistBackend::new()),
        rate_limiter: None,
    };
    (test_db, state)
}

/// Register an account through the handler and return its AuthUser identity.
async fn register_user(state: &AppState, email: &str, password: &str) -> AuthUser {
    let (status, Json(profile)) = auth::register(
        State(state.clone()),
        Json(auth::RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Flow".to_string(),
            last_name: "Tester".to_string(),
            role: Some("student".to_string()),
        }),
    )
    .await
    .expect("registration should succeed");
    assert_eq!(status, StatusCode::CREATED);

    AuthUser {
        user_id: profile.id,
        email: profile.email,
    }
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_register_login_verify_flow() {
    let (test_db, state) = test_state().await;
    let email = unique_email();

    let caller = register_user(&state, &email, "hunter2plus").await;

    // Login with the same credentials yields a token for that user.
    let Json(auth_resp) = auth::login(
        State(state.clone()),
        Json(auth::LoginRequest {
            email: email.clone(),
            password: "hunter2plus".to_string(),
        }),
    )
    .await
    .expect("login should succeed");
    assert_eq!(auth_resp.user.id, caller.user_id);
    assert_eq!(auth_resp.user.role, UserRole::Student);

    // The issued token introspects as valid.
    let Json(verify_resp) = auth::verify(
        State(state.clone()),
        Json(auth::VerifyRequest {
            token: auth_resp.token.clone(),
        }),
    )
    .await;
    assert!(verify_resp.valid);
    assert_eq!(verify_resp.user_id, Some(caller.user_id));
    assert_eq!(verify_resp.email.as_deref(), Some(email.as_str()));

    // Wrong password is a 401, not a 404.
    let err = auth::login(
        State(state.clone()),
        Json(auth::LoginRequest {
            email: email.clone(),
            password: "wrong-password".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_duplicate_email_registration_conflicts() {
    let (test_db, state) = test_state().await;
    let email = unique_email();

    let caller = register_user(&state, &email, "first-password").await;

    // Same address, different case, still taken.
    let err = auth::register(
        State(state.clone()),
        Json(auth::RegisterRequest {
            email: email.to_uppercase(),
            password: "second-password".to_string(),
            first_name: "Dup".to_string(),
            last_name: "User".to_string(),
            role: None,
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_note_lifecycle() {
    let (test_db, state) = test_state().await;
    let caller = register_user(&state, &unique_email(), "note-password").await;

    // Create
    let (status, Json(note)) = notes::create_note(
        State(state.clone()),
        caller.clone(),
        Json(notes::CreateNoteRequest {
            title: "Lecture 4".to_string(),
            body: Some("Graph algorithms".to_string()),
            folder_id: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note.owner_id, caller.user_id);

    // Update the body only; the title survives.
    let Json(updated) = notes::update_note(
        State(state.clone()),
        caller.clone(),
        Path(note.id),
        Json(notes::UpdateNoteRequest {
            title: None,
            body: Some("Graph algorithms, BFS and DFS".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "Lecture 4");
    assert_eq!(updated.body, "Graph algorithms, BFS and DFS");

    // The detail endpoint needs no authentication.
    let Json(detail) = notes::get_note(State(state.clone()), Path(note.id))
        .await
        .unwrap();
    assert_eq!(detail.note.id, note.id);

    // Listing shows it.
    let Json(listed) = notes::my_notes(State(state.clone()), caller.clone())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    // Delete, then the detail lookup is a 404.
    let status = notes::delete_note(State(state.clone()), caller.clone(), Path(note.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = notes::get_note(State(state.clone()), Path(note.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_cross_user_access_is_forbidden() {
    let (test_db, state) = test_state().await;
    let owner = register_user(&state, &unique_email(), "owner-password").await;
    let intruder = register_user(&state, &unique_email(), "intruder-password").await;

    let (_, Json(note)) = notes::create_note(
        State(state.clone()),
        owner.clone(),
        Json(notes::CreateNoteRequest {
            title: "Private".to_string(),
            body: None,
            folder_id: None,
        }),
    )
    .await
    .unwrap();

    let err = notes::update_note(
        State(state.clone()),
        intruder.clone(),
        Path(note.id),
        Json(notes::UpdateNoteRequest {
            title: Some("Hijacked".to_string()),
            body: None,
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = notes::delete_note(State(state.clone()), intruder.clone(), Path(note.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // The note is untouched.
    let Json(detail) = notes::get_note(State(state.clone()), Path(note.id))
        .await
        .unwrap();
    assert_eq!(detail.note.title, "Private");

    test_db.cleanup_user(owner.user_id).await;
    test_db.cleanup_user(intruder.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_folder_tag_share_flow() {
    let (test_db, state) = test_state().await;
    let caller = register_user(&state, &unique_email(), "organize-pass").await;

    let (_, Json(folder)) = features::create_folder(
        State(state.clone()),
        caller.clone(),
        Json(features::CreateFolderRequest {
            name: "School".to_string(),
        }),
    )
    .await
    .unwrap();

    let (_, Json(note)) = notes::create_note(
        State(state.clone()),
        caller.clone(),
        Json(notes::CreateNoteRequest {
            title: "Filed note".to_string(),
            body: None,
            folder_id: Some(folder.id),
        }),
    )
    .await
    .unwrap();
    assert_eq!(note.folder_id, Some(folder.id));

    // Tag it.
    let (_, Json(tag)) = features::create_tag(
        State(state.clone()),
        caller.clone(),
        Json(features::CreateTagRequest {
            name: "exam".to_string(),
        }),
    )
    .await
    .unwrap();

    let Json(applied) = features::set_note_tags(
        State(state.clone()),
        caller.clone(),
        Path(note.id),
        Json(features::SetNoteTagsRequest {
            tag_ids: vec![tag.id],
        }),
    )
    .await
    .unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].name, "exam");

    // Folder listing carries the member note.
    let Json(folders) = features::list_folders(State(state.clone()), caller.clone())
        .await
        .unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].notes.len(), 1);

    // Share it, list the grant, revoke it.
    let (status, Json(share)) = features::share_note(
        State(state.clone()),
        caller.clone(),
        Path(note.id),
        Json(features::ShareNoteRequest {
            shared_with: "friend@example.com".to_string(),
            permission: Some("edit".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(share.permission, SharePermission::Edit);

    let Json(shares) = features::list_shares(State(state.clone()), caller.clone(), Path(note.id))
        .await
        .unwrap();
    assert_eq!(shares.len(), 1);

    let status = features::revoke_share(State(state.clone()), caller.clone(), Path(share.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(shares) = features::list_shares(State(state.clone()), caller.clone(), Path(note.id))
        .await
        .unwrap();
    assert!(shares.is_empty());

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_sharing_same_recipient_updates_permission() {
    let (test_db, state) = test_state().await;
    let caller = register_user(&state, &unique_email(), "share-pass").await;

    let (_, Json(note)) = notes::create_note(
        State(state.clone()),
        caller.clone(),
        Json(notes::CreateNoteRequest {
            title: "Shared twice".to_string(),
            body: None,
            folder_id: None,
        }),
    )
    .await
    .unwrap();

    let (_, Json(first)) = features::share_note(
        State(state.clone()),
        caller.clone(),
        Path(note.id),
        Json(features::ShareNoteRequest {
            shared_with: "friend@example.com".to_string(),
            permission: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(first.permission, SharePermission::View);

    // Re-sharing upgrades in place rather than stacking a second grant.
    let (_, Json(second)) = features::share_note(
        State(state.clone()),
        caller.clone(),
        Path(note.id),
        Json(features::ShareNoteRequest {
            shared_with: "friend@example.com".to_string(),
            permission: Some("edit".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.permission, SharePermission::Edit);

    let Json(shares) = features::list_shares(State(state.clone()), caller.clone(), Path(note.id))
        .await
        .unwrap();
    assert_eq!(shares.len(), 1);

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_export_note_content_disposition() {
    use axum::response::IntoResponse;

    let (test_db, state) = test_state().await;
    let caller = register_user(&state, &unique_email(), "export-pass").await;

    let (_, Json(note)) = notes::create_note(
        State(state.clone()),
        caller.clone(),
        Json(notes::CreateNoteRequest {
            title: "Export: me?".to_string(),
            body: Some("Body text".to_string()),
            folder_id: None,
        }),
    )
    .await
    .unwrap();

    let response = notes::export_note(
        State(state.clone()),
        caller.clone(),
        Path(note.id),
        Query(notes::ExportQuery {
            format: Some("txt".to_string()),
        }),
    )
    .await
    .unwrap()
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    let disposition = headers.get("content-disposition").unwrap().to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\""));
    assert!(
        disposition.contains("Export_ me_.txt"),
        "path and shell characters are replaced: {}",
        disposition
    );

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_change_password_then_relogin() {
    let (test_db, state) = test_state().await;
    let email = unique_email();
    let caller = register_user(&state, &email, "old-password").await;

    let status = user::change_password(
        State(state.clone()),
        caller.clone(),
        Json(user::ChangePasswordRequest {
            current_password: "old-password".to_string(),
            new_password: "new-password".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Old credentials stop working; new ones log in.
    let err = auth::login(
        State(state.clone()),
        Json(auth::LoginRequest {
            email: email.clone(),
            password: "old-password".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    auth::login(
        State(state.clone()),
        Json(auth::LoginRequest {
            email: email.clone(),
            password: "new-password".to_string(),
        }),
    )
    .await
    .expect("new password should log in");

    test_db.cleanup_user(caller.user_id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_profile_changes_names_and_role() {
    let (test_db, state) = test_state().await;
    let caller = register_user(&state, &unique_email(), "profile-pass").await;

    let Json(profile) = user::update_profile(
        State(state.clone()),
        caller.clone(),
        Json(user::UpdateProfileRequest {
            first_name: Some("Renamed".to_string()),
            last_name: None,
            role: Some("professor".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(profile.first_name, "Renamed");
    assert_eq!(profile.last_name, "Tester", "omitted field is unchanged");
    assert_eq!(profile.role, UserRole::Professor);

    test_db.cleanup_user(caller.user_id).await;
}
