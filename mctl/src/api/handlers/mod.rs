//! HTTP request handlers for all API endpoints.
//!
//! Handlers read from the [`Store`] held in [`crate::AppState`], convert between API and store
//! models, and return [`crate::errors::Error`] on failure, which renders as `{"error": ...}` with
//! a matching status code.
//!
//! # Handler Modules
//!
//! - [`agents`]: Agent roster
//! - [`analytics`]: Token usage aggregation endpoints
//! - [`messages`]: Per-task chat thread
//! - [`projects`]: Projects and project token reports
//! - [`tasks`]: Kanban tasks and task token reports

pub mod agents;
pub mod analytics;
pub mod messages;
pub mod projects;
pub mod tasks;

use tracing::warn;

use crate::db::handlers::Store;
use crate::db::models::activity::ActivityCreateDBRequest;

/// Append to the activity log. A failed write is logged and does not fail the request that
/// caused it.
pub(crate) async fn record_activity(store: &dyn Store, request: ActivityCreateDBRequest) {
    if let Err(e) = store.log_activity(&request).await {
        warn!(action = ?request.action, "Failed to record activity: {}", e);
    }
}
