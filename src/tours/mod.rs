//! Tour persistence.
//!
//! A tour, its days, its activities and a pricing snapshot are written in a
//! single transaction; a failure at any step leaves nothing behind.

pub mod queries;
pub mod routes;
pub mod services;

pub use routes::router;
