//! Task board backend: Kanban-style task tracking with soft delete/restore
//! and recurring tasks, persisted in SQLite and served over HTTP.

pub mod board;
pub mod cli;
pub mod db;
pub mod error;
pub mod http;
pub mod recurrence;
pub mod service;
pub mod types;
