//! Snake arena workspace root.
//!
//! Re-exports the member crates so the cross-crate tests under `tests/` can
//! drive a real server and the client state together.

pub use client;
pub use server;
pub use shared;
