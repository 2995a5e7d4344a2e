use crate::engine;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::require_session;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_bound(req: &Request, key: &str) -> Result<Option<f64>, serde_json::Value> {
    let Some(value) = req.params.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a number", key), None))
}

fn parse_limit(req: &Request) -> Result<Option<usize>, serde_json::Value> {
    let Some(value) = req.params.get("limit") else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    // Rejects negatives and fractions in one shot.
    value
        .as_u64()
        .map(|n| Some(n as usize))
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "limit must be a non-negative integer",
                None,
            )
        })
}

fn handle_rank(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let records: Vec<engine::PerformanceRecord> = match req.params.get("records") {
        None => Vec::new(),
        Some(v) if v.is_null() => Vec::new(),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(list) => list,
            Err(e) => return err(&req.id, "bad_params", format!("invalid records: {}", e), None),
        },
    };
    let min_score = match parse_bound(req, "minScore") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let max_score = match parse_bound(req, "maxScore") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let limit = match parse_limit(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let opts = engine::LeaderboardOptions {
        min_score,
        max_score,
        limit,
    };
    match engine::rank_leaderboard(&records, &opts) {
        Ok(rows) => ok(&req.id, json!({ "rows": rows })),
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "leaderboard.rank" => Some(handle_rank(state, req)),
        _ => None,
    }
}
