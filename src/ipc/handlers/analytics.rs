use crate::engine;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::require_session;
use crate::ipc::types::{AppState, Request};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::json;

/// A missing or null list param means "no records of that kind", matching
/// the dashboard's optional-chained fetches.
fn parse_list<T: DeserializeOwned>(req: &Request, key: &str) -> Result<Vec<T>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(Vec::new()),
        Some(v) if v.is_null() => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| err(&req.id, "bad_params", format!("invalid {}: {}", key, e), None)),
    }
}

fn parse_today(req: &Request) -> Result<NaiveDate, serde_json::Value> {
    match req.params.get("today") {
        None => Ok(Local::now().date_naive()),
        Some(v) if v.is_null() => Ok(Local::now().date_naive()),
        Some(v) => {
            let Some(raw) = v.as_str() else {
                return Err(err(
                    &req.id,
                    "bad_params",
                    "today must be a YYYY-MM-DD string",
                    None,
                ));
            };
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                err(
                    &req.id,
                    "bad_params",
                    "today must be a YYYY-MM-DD string",
                    None,
                )
            })
        }
    }
}

fn parse_window_days(req: &Request) -> Result<i64, serde_json::Value> {
    let window_days = req
        .params
        .get("windowDays")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", "missing windowDays", None))?;
    // One bucket per day is allocated up front; keep wire input to a year.
    if window_days > 366 {
        return Err(err(&req.id, "bad_params", "windowDays must be <= 366", None));
    }
    Ok(window_days)
}

fn parse_limit(req: &Request, default: usize) -> Result<usize, serde_json::Value> {
    let Some(value) = req.params.get("limit") else {
        return Ok(default);
    };
    if value.is_null() {
        return Ok(default);
    }
    let Some(limit) = value.as_u64() else {
        return Err(err(
            &req.id,
            "bad_params",
            "limit must be a non-negative integer",
            None,
        ));
    };
    if limit > 500 {
        return Err(err(&req.id, "bad_params", "limit must be <= 500", None));
    }
    Ok(limit as usize)
}

fn handle_kpis(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tasks: Vec<engine::Task> = match parse_list(req, "tasks") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let submissions: Vec<engine::Submission> = match parse_list(req, "submissions") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let performances: Vec<engine::PerformanceRecord> = match parse_list(req, "performances") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!(engine::compute_kpis(&tasks, &submissions, &performances)),
    )
}

fn handle_task_trend(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let items: Vec<engine::DatedItem> = match parse_list(req, "items") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let window_days = match parse_window_days(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let today = match parse_today(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match engine::build_daily_trend(&items, window_days, today) {
        Ok(points) => ok(&req.id, json!({ "points": points })),
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

fn handle_status_distribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tasks: Vec<engine::Task> = match parse_list(req, "tasks") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let submissions: Vec<engine::Submission> = match parse_list(req, "submissions") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!(engine::status_distribution(&tasks, &submissions)),
    )
}

fn handle_activity(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tasks: Vec<engine::Task> = match parse_list(req, "tasks") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let submissions: Vec<engine::Submission> = match parse_list(req, "submissions") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let limit = match parse_limit(req, 10) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({ "entries": engine::recent_activity(&tasks, &submissions, limit) }),
    )
}

fn handle_insights(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tasks: Vec<engine::Task> = match parse_list(req, "tasks") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let submissions: Vec<engine::Submission> = match parse_list(req, "submissions") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let performances: Vec<engine::PerformanceRecord> = match parse_list(req, "performances") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let kpis = engine::compute_kpis(&tasks, &submissions, &performances);
    ok(
        &req.id,
        json!({ "alerts": engine::insights(&kpis, performances.len()) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.kpis" => Some(handle_kpis(state, req)),
        "analytics.taskTrend" => Some(handle_task_trend(state, req)),
        "analytics.statusDistribution" => Some(handle_status_distribution(state, req)),
        "analytics.activity" => Some(handle_activity(state, req)),
        "analytics.insights" => Some(handle_insights(state, req)),
        _ => None,
    }
}
