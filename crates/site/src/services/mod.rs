//! Services shared by the route handlers.
//!
//! - `forwarder` - posts validated submissions to their downstream target
//! - `locator` - owns the store snapshot and its periodic refresh

pub mod forwarder;
pub mod locator;

pub use forwarder::{ForwardError, Forwarder, SubmissionTarget};
pub use locator::{StoreLocator, StoreSnapshot};
