//! Supplier catalog: suppliers, the services they sell and the rates for
//! those services.

pub mod models;
pub mod queries;
pub mod routes;
pub mod services;

pub use routes::router;
