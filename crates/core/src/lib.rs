//! Dabs Core - domain types and logic for the Dabs site.
//!
//! Shared by:
//! - `site` - the public website and its JSON endpoints
//! - `cli` - operator tooling against the same Google Sheets
//!
//! # Architecture
//!
//! The core crate does no I/O: no HTTP clients, no cookies, no clock reads
//! except where a caller asks for "now". Sheet values come in as plain
//! strings and leave as typed records.
//!
//! # Modules
//!
//! - [`types`] - store and request records, the [`Email`] newtype
//! - [`sheet`] - header-driven projection of sheet rows into records
//! - [`geo`] - coordinates and haversine distance
//! - [`locator`] - store filtering by region, ZIP and distance
//! - [`dashboard`] - request statistics, rankings and filters
//! - [`submission`] - validation and defaulting of visitor submissions
//! - [`consent`] - cookie consent and age-gate rules
//! - [`carousel`] - infinite-loop carousel state
//! - [`catalog`] - products and strains

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carousel;
pub mod catalog;
pub mod consent;
pub mod dashboard;
pub mod geo;
pub mod locator;
pub mod sheet;
pub mod submission;
pub mod types;

pub use geo::Coordinates;
pub use sheet::{FromSheetRow, Projection, SchemaMismatch, SheetTable};
pub use submission::SubmissionError;
pub use types::*;
