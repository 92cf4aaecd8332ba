//! Administration CLI for the commission engine.
//!
//! Runs the commission operations against a JSON data file described by a
//! TOML configuration file.

pub mod commands;
pub mod config;
pub mod errors;
pub mod file_store;
