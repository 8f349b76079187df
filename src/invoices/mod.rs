//! Invoices and the payments recorded against them.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod routes;

pub use routes::router;
