//! # md_app
//!
//! Shared utilities for market data admission applications

pub mod cli;
pub mod shutdown_handler;
pub mod tracing_setup;
