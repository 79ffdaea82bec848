//! Version reconciliation between a local vault and the server's snapshot.
//!
//! [`resolve`] decides a single title; [`combine`] applies it to every title
//! of every kind. Both are pure: callers decide when to persist the result.

mod merge;
mod resolve;

pub use merge::{combine, combine_with_report, MergeReport};
pub use resolve::resolve;
