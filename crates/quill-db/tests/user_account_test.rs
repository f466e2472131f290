//! User account repository integration tests.
//!
//! Requires a migrated database; see test_fixtures for configuration.

use quill_db::test_fixtures::{unique_email, TestDatabase, TEST_PASSWORD_HASH};
use quill_db::{CreateUserRequest, Error, UpdateProfileRequest, UserRepository, UserRole};

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_duplicate_email_is_conflict_regardless_of_case() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let email = unique_email();

    let user = test_db
        .db
        .users
        .insert(CreateUserRequest {
            email: email.clone(),
            password_hash: TEST_PASSWORD_HASH.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: UserRole::Engineer,
        })
        .await
        .unwrap();

    let dup = test_db
        .db
        .users
        .insert(CreateUserRequest {
            email: email.to_uppercase(),
            password_hash: TEST_PASSWORD_HASH.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Again".to_string(),
            role: UserRole::Other,
        })
        .await;
    assert!(matches!(dup, Err(Error::Conflict(_))));

    test_db.cleanup_user(user.id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_get_by_email_is_case_insensitive() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user().await;

    let found = test_db
        .db
        .users
        .get_by_email(&user.email.to_uppercase())
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let missing = test_db
        .db
        .users
        .get_by_email("nobody@example.com")
        .await
        .unwrap();
    assert!(missing.is_none());

    test_db.cleanup_user(user.id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_profile_is_partial() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user().await;

    let updated = test_db
        .db
        .users
        .update_profile(
            user.id,
            UpdateProfileRequest {
                first_name: Some("Grace".to_string()),
                last_name: None,
                role: Some(UserRole::Professor),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Grace");
    assert_eq!(updated.last_name, user.last_name, "untouched field survives");
    assert_eq!(updated.role, UserRole::Professor);
    assert!(updated.updated_at > user.updated_at);

    test_db.cleanup_user(user.id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_password_hash_replaces_stored_hash() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user().await;

    test_db
        .db
        .users
        .update_password_hash(user.id, "$argon2id$v=19$new")
        .await
        .unwrap();

    let fetched = test_db.db.users.get(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.password_hash, "$argon2id$v=19$new");

    test_db.cleanup_user(user.id).await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_profile_missing_user() {
    let test_db = TestDatabase::new().await;

    let result = test_db
        .db
        .users
        .update_profile(uuid::Uuid::new_v4(), UpdateProfileRequest::default())
        .await;
    assert!(matches!(result, Err(Error::UserNotFound(_))));
}
