//! Record types shared by the site, the CLI and the tests.

pub mod email;
pub mod request;
pub mod store;

pub use email::{Email, EmailError};
pub use request::{DEFAULT_STATUS, NOT_PROVIDED, RequestRecord};
pub use store::StoreRecord;
