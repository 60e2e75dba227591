//! API Module
//!
//! HTTP handlers and routing for the cache admin and observability surface.
//!
//! # Endpoints
//! - `GET /stats` - Stats of every region
//! - `GET /stats/:region` - Stats of one region
//! - `DELETE /cache/:region` - Clear one region
//! - `POST /evict` - Clear regions or evict a single key
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
