//! HTTP API handlers for collab-ia

pub mod analytics;
pub mod health;

pub use analytics::analytics_routes;
pub use health::health_routes;
