//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers (upload, retrieval, static assets)
//! - **[`models`]**: Response data structures

pub mod handlers;
pub mod models;
