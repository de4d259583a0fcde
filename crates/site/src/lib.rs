//! Dabs site library.
//!
//! The public website and its Google Sheets backed JSON endpoints, exposed
//! as a library so the binary, the CLI and the integration tests share one
//! router and one set of clients.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod cookies;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod sheets;
pub mod state;
