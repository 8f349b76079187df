//! B2B partners and their negotiated markup.

pub mod models;
pub mod queries;
pub mod routes;
pub mod services;

pub use models::Partner;
pub use routes::router;
