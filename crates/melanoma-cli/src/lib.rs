//! Command-line browser for the melanoma patient cohort.
//!
//! The binary loads an [`AppConfig`](config::AppConfig), opens the patient
//! database, binds the variable registry and runs one of the commands in
//! [`commands`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod filters;
pub mod logging;
pub mod summary;
