/// Session flow against the file-backed store and through the app context.
mod common;

use std::time::{Duration, Instant};

use common::{file_app, temp_dir, test_config};
use gridcast::error::{AppError, AuthError};
use gridcast::session::{Role, SessionFlow};
use gridcast::storage::{FileStore, KeyValueStore, SESSION_USER_KEY};

#[test]
fn login_waits_for_the_configured_delay() {
    let dir = temp_dir("session-delay");
    let mut store = FileStore::new(&dir);
    let mut session = SessionFlow::new(Duration::from_millis(50));

    let started = Instant::now();
    let (user, warning) = session.login(&mut store, "admin", "admin123").unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(warning.is_none());
    assert_eq!(user.role, Role::Admin);

    // Failed attempts wait too.
    let started = Instant::now();
    assert_eq!(
        session.login(&mut store, "admin", "wrong").unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert!(started.elapsed() >= Duration::from_millis(50));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn persisted_session_record_shape() {
    let dir = temp_dir("session-record");
    let mut store = FileStore::new(&dir);
    let mut session = SessionFlow::new(Duration::ZERO);
    session.login(&mut store, "user", "user123").unwrap();

    let raw = store.get(SESSION_USER_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value, serde_json::json!({"username": "user", "role": "user"}));

    session.logout(&mut store).unwrap();
    assert!(!store.record_path(SESSION_USER_KEY).exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn app_login_logout_round_trip() {
    let dir = temp_dir("session-app");
    let mut app = file_app(test_config("http://127.0.0.1:1/predict"), &dir);
    assert!(app.current_user().is_none());

    let err = app.login("user", "admin123").unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    assert_eq!(
        err.to_string(),
        "Invalid credentials. Try admin/admin123 or user/user123"
    );

    let outcome = app.login("user", "user123").unwrap();
    assert_eq!(outcome.user.role, Role::User);
    assert!(file_app(test_config(""), &dir).current_user().is_some());

    assert!(app.logout().is_none());
    assert!(file_app(test_config(""), &dir).current_user().is_none());

    let _ = std::fs::remove_dir_all(dir);
}
