use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::SessionContext;
use serde_json::json;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn optional_str(req: &Request, key: &str) -> Option<String> {
    match req.params.get(key) {
        // The web client stores org ids as strings but the API serves them
        // as integers; accept either.
        Some(v) if v.is_i64() => v.as_i64().map(|n| n.to_string()),
        Some(v) => v.as_str().map(|s| s.to_string()),
        None => None,
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let role = match required_str(req, "role") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let user_id = match required_i64(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let ctx = SessionContext::login(
        &role,
        user_id,
        optional_str(req, "userName"),
        optional_str(req, "orgId"),
        optional_str(req, "token"),
    );
    state.session = Some(ctx);
    ok(&req.id, json!({ "session": &state.session }))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "session": state.session.as_ref().map(|s| json!(s)) }),
    )
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = None;
    ok(&req.id, json!({ "session": null }))
}

// The 401 path: the transport layer saw an unauthorized response, so the
// context is dropped exactly as at logout.
fn handle_expire(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = None;
    ok(&req.id, json!({ "session": null, "reason": "unauthorized" }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.get" => Some(handle_get(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.expire" => Some(handle_expire(state, req)),
        _ => None,
    }
}
