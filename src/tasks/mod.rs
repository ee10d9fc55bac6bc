//! Background Tasks Module
//!
//! Periodic work that runs alongside the HTTP server.
//!
//! # Tasks
//! - Expiry sweep: drops entries past their TTL
//! - Background refresh: revalidates stale entries queued by the middleware

mod cleanup;
mod refresh;

pub use cleanup::spawn_cleanup_task;
pub use refresh::{run_pending_refreshes, spawn_refresh_task};
