//! Thin client: HTTP calls, persisted session state and the sync driver.

pub mod api;
pub mod driver;
pub mod session;

pub use api::{ClientError, KeeperClient};
pub use driver::{DeleteOutcome, Driver, DriverError, Source};
pub use session::{Session, SessionError};
