//! gridcast — POWERGRID material forecast dashboard.
//!
//! Submits transmission project parameters to an external prediction service,
//! keeps a bounded history of results with derived stats, and exposes both
//! through a CLI and an embedded web dashboard.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod prediction;
pub mod report;
pub mod session;
pub mod storage;
pub mod web;
