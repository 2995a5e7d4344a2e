use crate::engine;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::require_session;
use crate::ipc::types::{AppState, Request};
use chrono::Utc;
use serde_json::json;

/// The evaluation form feeds the classifier raw input, so a numeric string
/// is accepted alongside numbers; anything else is the absent sentinel.
fn parse_score(value: Option<&serde_json::Value>) -> Option<f64> {
    let value = value?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().parse::<f64>().ok())
}

fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn handle_classify(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let score = parse_score(req.params.get("score"));
    let label = match req
        .params
        .get("variant")
        .and_then(|v| v.as_str())
        .unwrap_or("final")
    {
        "final" => engine::final_grade(score),
        "preview" => engine::preview_grade(score),
        other => {
            return err(
                &req.id,
                "bad_params",
                "variant must be one of: final, preview",
                Some(json!({ "variant": other })),
            )
        }
    };
    ok(&req.id, json!({ "grade": label }))
}

fn handle_blend(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    // Only faculty record evaluations.
    if !session.has_role("faculty") {
        return err(&req.id, "forbidden", "only faculty can evaluate students", None);
    }
    let system_score = match required_f64(req, "systemScore") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let score = match required_f64(req, "score") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let contribution_weight = req.params.get("contributionWeight").and_then(|v| v.as_f64());
    ok(
        &req.id,
        json!(engine::blend_final_score(system_score, score, contribution_weight)),
    )
}

fn handle_system_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let todos: Vec<engine::TodoItem> = match req.params.get("todos") {
        None => Vec::new(),
        Some(v) if v.is_null() => Vec::new(),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(list) => list,
            Err(e) => return err(&req.id, "bad_params", format!("invalid todos: {}", e), None),
        },
    };
    let now = match req.params.get("now").and_then(|v| v.as_str()) {
        Some(raw) => match engine::parse_timestamp(raw) {
            Some(dt) => dt,
            None => return err(&req.id, "bad_params", "now must be an ISO-8601 timestamp", None),
        },
        None => Utc::now().naive_utc(),
    };
    ok(&req.id, json!(engine::system_performance(&todos, now)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.classify" => Some(handle_classify(state, req)),
        "grades.blend" => Some(handle_blend(state, req)),
        "grades.systemPerformance" => Some(handle_system_performance(state, req)),
        _ => None,
    }
}
