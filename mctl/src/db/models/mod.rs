//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by the [`crate::db::handlers::Store`] implementations
//! to return query results and accept insertion/update data.
//!
//! # Model Categories
//!
//! ## Board Resources
//!
//! - [`projects`]: Projects agents work on
//! - [`tasks`]: Kanban tasks within a project
//! - [`messages`]: Per-task chat thread
//! - [`agents`]: The agent roster
//! - [`activity`]: Append-only record of changes to projects and tasks
//!
//! ## Analytics
//!
//! - [`usage`]: Token usage events logged by agents (read-only to this service)

pub mod activity;
pub mod agents;
pub mod messages;
pub mod projects;
pub mod tasks;
pub mod usage;
