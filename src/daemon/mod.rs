//! Password-cache daemon (`shh serve`) and its client.
//!
//! The daemon keeps the user's password in memory for a bounded window so
//! repeated commands don't prompt every time.  It binds to loopback only.

pub mod cache;
pub mod client;
pub mod server;

pub use cache::PasswordCache;
pub use client::DaemonClient;
pub use server::{router, serve, serve_listener};
