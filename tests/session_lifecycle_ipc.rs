
use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn session_lifecycle_login_get_logout() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "role": "Faculty", "userId": 7, "orgId": 3 }),
    );
    let session = login.get("session").expect("session");
    assert_eq!(session.get("role").and_then(|v| v.as_str()), Some("faculty"));
    assert_eq!(session.get("orgId").and_then(|v| v.as_str()), Some("3"));
    let token = session
        .get("token")
        .and_then(|v| v.as_str())
        .expect("token")
        .to_string();
    assert!(!token.is_empty());

    let got = request_ok(&mut stdin, &mut reader, "2", "session.get", json!({}));
    assert_eq!(
        got.get("session")
            .and_then(|s| s.get("token"))
            .and_then(|v| v.as_str()),
        Some(token.as_str())
    );

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert!(health.get("session").map(|s| !s.is_null()).unwrap_or(false));

    let out = request_ok(&mut stdin, &mut reader, "4", "session.logout", json!({}));
    assert!(out.get("session").map(|s| s.is_null()).unwrap_or(false));

    let code = request_err(&mut stdin, &mut reader, "5", "analytics.kpis", json!({}));
    assert_eq!(code, "unauthorized");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn expire_clears_session_like_a_401() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "role": "student", "userId": 9, "token": "tok-abc" }),
    );
    let expired = request_ok(&mut stdin, &mut reader, "2", "session.expire", json!({}));
    assert_eq!(
        expired.get("reason").and_then(|v| v.as_str()),
        Some("unauthorized")
    );

    let got = request_ok(&mut stdin, &mut reader, "3", "session.get", json!({}));
    assert!(got.get("session").map(|s| s.is_null()).unwrap_or(false));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn login_requires_role_and_user_id() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "userId": 7 }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "session.login",
        json!({ "role": "faculty" }),
    );
    assert_eq!(code, "bad_params");

    drop(stdin);
    let _ = child.wait();
}
