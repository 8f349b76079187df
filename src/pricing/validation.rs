//! Structural checks for tours that are about to be saved.
//!
//! Pricing never calls this; an itinerary still being edited prices with
//! whatever it has.

use crate::models::Tour;

use super::calculators::{check_margin, check_pax};
use super::services::PricingError;

/// Collect every problem with a tour, empty when it can be saved
pub fn tour_errors(tour: &Tour) -> Vec<String> {
    let mut errors = Vec::new();

    if tour.name.trim().is_empty() {
        errors.push("name must not be empty".to_string());
    }
    if let Err(e) = check_pax(tour.pax) {
        errors.push(e.to_string());
    }
    if let Some(Err(e)) = tour.margin_percent.map(check_margin) {
        errors.push(e.to_string());
    }

    for (index, day) in tour.days.iter().enumerate() {
        let expected = index as i32 + 1;
        if day.day_number != expected {
            errors.push(format!(
                "day {} is out of sequence (expected day {})",
                day.day_number, expected
            ));
        }
        if day.city.trim().is_empty() {
            errors.push(format!("day {} has no city", day.day_number));
        }
        for (position, activity) in day.activities.iter().enumerate() {
            if activity.name.trim().is_empty()
                && activity.entrance_id.is_none()
                && activity.transport_id.is_none()
            {
                errors.push(format!(
                    "day {} activity {} is empty",
                    day.day_number,
                    position + 1
                ));
            }
        }
    }

    errors
}

/// Validate a tour for saving
pub fn validate_tour(tour: &Tour) -> Result<(), PricingError> {
    let errors = tour_errors(tour);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PricingError::ConfigurationError {
            message: format!("Tour is not valid: {}", errors.join("; ")),
            errors,
        })
    }
}
