mod kind;
mod record;
mod vault;

pub use kind::Kind;
pub use record::{Payload, Record};
pub use vault::{Snapshot, Vault};
