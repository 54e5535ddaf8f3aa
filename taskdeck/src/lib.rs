//! `Taskdeck`: terminal client for a remote to-do API.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod tasks;
pub mod ui;
pub mod worker;
