//! Shared end-to-end test infrastructure
//!
//! Each test spawns an isolated server with its own temporary databases and
//! talks to it over HTTP.
#![allow(dead_code)] // Not every test binary uses every helper

pub mod client;
pub mod server;

pub const REQUEST_TIMEOUT_SECS: u64 = 5;
pub const SERVER_READY_TIMEOUT_MS: u64 = 2_000;

pub const TEST_USER: &str = "test-learner";
pub const TEST_PASS: &str = "placeholder";
