//! keeper: a multi-user secrets vault with a versioned sync protocol.
//!
//! The server keeps the authoritative copy of every user's records; the
//! client keeps a local vault per profile and reconciles it with the server.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod server;
pub mod sync;
