//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET /stats/portfolio` - Portfolio load metrics with cache statistics
//! - `GET /cache?key=` - Inspect a cached entry
//! - `DELETE /cache?key=` - Delete a cached entry
//! - `DELETE /cache/all` - Clear the cache
//! - `POST /cache/invalidate` - Invalidate keys matching a pattern
//! - `POST /cache/invalidate/repository` - Invalidate a repository
//! - `POST /cache/invalidate/user` - Invalidate a user
//! - `GET /github/*endpoint` - Cached GitHub API proxy
//! - `GET /portfolio/:owner/:repo` - Optimized, cached portfolio data

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
