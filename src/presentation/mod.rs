// Presentation layer - axum HTTP surface
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod router;
