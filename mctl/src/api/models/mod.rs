//! API request and response data models.
//!
//! These types define the public JSON contract. They are kept separate from the database
//! records in [`crate::db::models`] so the two can evolve independently, and are annotated with
//! `utoipa` for the generated API docs.
//!
//! # Model Categories
//!
//! ## Resource Models
//!
//! - [`projects`]: Project creation and responses
//! - [`tasks`]: Kanban tasks, list filters and partial updates
//! - [`messages`]: Per-task chat messages
//! - [`agents`]: The agent roster
//!
//! ## Analytics Models
//!
//! - [`analytics`]: Overview, groupings, rankings and token reports derived from usage records

pub mod agents;
pub mod analytics;
pub mod messages;
pub mod projects;
pub mod tasks;
