//! # encore_app
//!
//! Shared utilities for encore applications

pub mod config_loader;
pub mod tracing_setup;
