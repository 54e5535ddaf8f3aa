//! Shared wire types for the `Taskdeck` task API.

pub mod auth;
pub mod error;
pub mod task;
