pub mod analytics;
pub mod core;
pub mod grades;
pub mod leaderboard;
pub mod session;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::session::SessionContext;

/// Analytics and grading methods sit behind bearer auth in the platform API;
/// here they refuse to run without a live session.
pub(super) fn require_session<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a SessionContext, serde_json::Value> {
    state
        .session
        .as_ref()
        .ok_or_else(|| err(&req.id, "unauthorized", "login required", None))
}
