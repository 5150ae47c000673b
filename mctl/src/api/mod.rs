//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`extract`]**: `Json`, `Path` and `Query` extractors that reject with the API error body
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is nested under `/api`:
//!
//! - **Analytics** (`/api/analytics/*`): Token usage overview, breakdowns and rankings
//! - **Projects** (`/api/projects/*`): Project listing, creation and token reports
//! - **Tasks** (`/api/tasks/*`): Kanban task CRUD, token reports and the per-task chat thread
//! - **Agents** (`/api/agents/*`): Read-only agent roster
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`. Interactive
//! documentation is served at `/api/docs` and the raw document at `/api-docs/openapi.json`.

pub mod extract;
pub mod handlers;
pub mod models;
