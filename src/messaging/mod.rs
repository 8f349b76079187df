//! WhatsApp message delivery tracking.

pub mod queries;
pub mod routes;

pub use routes::router;
