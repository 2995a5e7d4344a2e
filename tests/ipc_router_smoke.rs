
use serde_json::json;
use test_support::{login_faculty, request_err, request_ok, spawn_sidecar};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert!(health.get("session").map(|v| v.is_null()).unwrap_or(false));

    let _ = login_faculty(&mut stdin, &mut reader, "2");

    let kpis = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "analytics.kpis",
        json!({ "tasks": [], "submissions": [], "performances": [] }),
    );
    assert_eq!(kpis.get("totalTasks").and_then(|v| v.as_u64()), Some(0));

    let rows = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "leaderboard.rank",
        json!({ "records": [] }),
    );
    assert_eq!(
        rows.get("rows").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );

    let classify = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "grades.classify",
        json!({ "score": 85 }),
    );
    assert_eq!(classify.get("grade").and_then(|v| v.as_str()), Some("A"));

    let code = request_err(&mut stdin, &mut reader, "6", "workspace.select", json!({}));
    assert_eq!(code, "not_implemented");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn protected_methods_refuse_without_session() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    for (id, method) in [
        ("1", "analytics.kpis"),
        ("2", "analytics.taskTrend"),
        ("3", "leaderboard.rank"),
        ("4", "grades.classify"),
    ] {
        let code = request_err(&mut stdin, &mut reader, id, method, json!({}));
        assert_eq!(code, "unauthorized", "method {} must require a session", method);
    }

    drop(stdin);
    let _ = child.wait();
}
