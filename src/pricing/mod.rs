//! Pricing engine module.
//!
//! Resolves supplier rates for every service on a tour, aggregates them per
//! day and category, and turns the cost into a sell-side quote.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod resolver;
pub mod responses;
pub mod routes;
pub mod services;
pub mod validation;

// Re-export commonly used items
pub use calculators::{round_money, QuoteResult, TourPricing};
pub use resolver::{select_rate, RateBook};
pub use routes::router;
pub use services::PricingError;
pub use validation::validate_tour;
