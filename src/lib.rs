//! KubeGraf terminal console library
//!
//! Exposes the resource cache, API client and TUI building blocks used by the
//! `kubegraf-tui` binary and its integration tests.

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod editor;
pub mod logging;
pub mod refresh;
pub mod resources;
pub mod ui;
