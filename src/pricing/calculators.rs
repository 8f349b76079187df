//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access. Rates arrive
//! pre-loaded in a [`RateBook`].

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Tour, TourDay};

use super::models::{PriceBasis, RateColumn, ServiceCategory};
use super::resolver::{select_rate, RateBook, RateScope};
use super::services::PricingError;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use travel_desk::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Largest group a single tour or allocation may price
pub const MAX_PAX: i32 = 1000;

/// Largest absolute amount `allocate_per_person` accepts
pub const MAX_ALLOCATION_TOTAL: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Reject passenger counts outside `1..=MAX_PAX`
pub fn check_pax(pax: i32) -> Result<(), PricingError> {
    if (1..=MAX_PAX).contains(&pax) {
        Ok(())
    } else {
        Err(PricingError::InvalidPax { pax })
    }
}

/// Split a total evenly among travellers with remainder handling.
///
/// Uses banker's rounding, then distributes any remainder (due to rounding)
/// to the first N travellers in 0.01 increments so the shares always sum
/// back to `total`.
pub fn allocate_per_person(total: Decimal, pax: i32) -> Result<AllocationResult, PricingError> {
    check_pax(pax)?;
    if total.abs() > MAX_ALLOCATION_TOTAL {
        return Err(PricingError::InvalidAmount { amount: total });
    }

    let per_person = round_money(total / Decimal::from(pax), 2);
    let remainder = per_person
        .checked_mul(Decimal::from(pax))
        .and_then(|allocated| total.checked_sub(allocated))
        .ok_or(PricingError::InvalidAmount { amount: total })?;

    let mut amounts = vec![per_person; pax as usize];

    if remainder != Decimal::ZERO {
        let increment = if remainder > Decimal::ZERO {
            Decimal::new(1, 2)
        } else {
            Decimal::new(-1, 2)
        };

        let adjustments_needed = (remainder.abs() / Decimal::new(1, 2))
            .to_usize()
            .unwrap_or(0);

        for amount in amounts.iter_mut().take(adjustments_needed) {
            *amount += increment;
        }
    }

    Ok(AllocationResult {
        per_person,
        amounts,
    })
}

/// Result of splitting a total across travellers
#[derive(Debug, Clone)]
pub struct AllocationResult {
    pub per_person: Decimal,
    pub amounts: Vec<Decimal>,
}

/// Cost per service category
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryBreakdown {
    pub accommodation: Decimal,
    pub guides: Decimal,
    pub transport: Decimal,
    pub entrances: Decimal,
    pub meals: Decimal,
}

impl CategoryBreakdown {
    pub fn add(&mut self, category: ServiceCategory, amount: Decimal) {
        let slot = match category {
            ServiceCategory::Accommodation => &mut self.accommodation,
            ServiceCategory::Guide => &mut self.guides,
            ServiceCategory::Transport => &mut self.transport,
            ServiceCategory::Entrance => &mut self.entrances,
            ServiceCategory::Meal => &mut self.meals,
        };
        *slot += amount;
    }

    pub fn accumulate(&mut self, other: &CategoryBreakdown) {
        self.accommodation += other.accommodation;
        self.guides += other.guides;
        self.transport += other.transport;
        self.entrances += other.entrances;
        self.meals += other.meals;
    }

    pub fn total(&self) -> Decimal {
        self.accommodation + self.guides + self.transport + self.entrances + self.meals
    }
}

/// Priced day of a tour
#[derive(Debug, Clone)]
pub struct DayPricing {
    pub day_number: i32,
    pub date: NaiveDate,
    pub city: String,
    pub breakdown: CategoryBreakdown,
    pub total: Decimal,
}

/// Result of pricing a whole tour
#[derive(Debug, Clone)]
pub struct TourPricing {
    pub currency: String,
    pub pax: i32,
    pub rate_column: RateColumn,
    pub days: Vec<DayPricing>,
    pub category_totals: CategoryBreakdown,
    pub grand_total: Decimal,
    pub per_person: Decimal,
    /// Service references that priced at zero because no rate applied
    pub warnings: Vec<String>,
}

/// Service references a day asks to be priced, in slot order
fn day_slots(day: &TourDay) -> Vec<(ServiceCategory, Uuid)> {
    let mut slots = Vec::new();
    if let Some(id) = day.accommodation_id {
        slots.push((ServiceCategory::Accommodation, id));
    }
    if let Some(id) = day.guide_id {
        slots.push((ServiceCategory::Guide, id));
    }
    for activity in &day.activities {
        if let Some(id) = activity.entrance_id {
            slots.push((ServiceCategory::Entrance, id));
        }
        if let Some(id) = activity.transport_id {
            slots.push((ServiceCategory::Transport, id));
        }
    }
    slots.extend(day.meal_ids.iter().map(|id| (ServiceCategory::Meal, *id)));
    slots
}

fn price_slot(
    category: ServiceCategory,
    service_id: Uuid,
    rates: &RateBook,
    scope: &RateScope<'_>,
    column: RateColumn,
    warnings: &mut Vec<String>,
) -> Result<Decimal, PricingError> {
    let Some(rate) = select_rate(rates.candidates(service_id), scope)? else {
        warnings.push(format!(
            "No applicable {} rate for service {} on {}",
            category, service_id, scope.date
        ));
        return Ok(Decimal::ZERO);
    };

    if rate.category != category {
        warnings.push(format!(
            "Service {} is priced as {} but used as {}",
            service_id, rate.category, category
        ));
    }

    let amount = rate.amount(column);
    Ok(match rate.basis {
        PriceBasis::PerPerson => amount * Decimal::from(scope.pax),
        PriceBasis::PerGroup => amount,
    })
}

/// Price a tour.
///
/// The tour does not need to be complete: unset references cost nothing and
/// references without an applicable rate cost nothing plus a warning. Only
/// the rate column matching `is_euro_passport` is read.
///
/// # Arguments
/// * `tour` - Tour structure (its own pax/passport fields are ignored)
/// * `rates` - Candidate rates for every service the tour references
/// * `pax` - Number of travellers, `1..=MAX_PAX`
/// * `is_euro_passport` - Selects the EUR or non-EUR column
/// * `as_of` - Date used for days when the tour has no start date
/// * `currency` - Currency label for the result
pub fn calculate_tour_pricing(
    tour: &Tour,
    rates: &RateBook,
    pax: i32,
    is_euro_passport: bool,
    as_of: NaiveDate,
    currency: &str,
) -> Result<TourPricing, PricingError> {
    check_pax(pax)?;

    let column = RateColumn::for_passport(is_euro_passport);
    let mut warnings = Vec::new();
    let mut days = Vec::with_capacity(tour.days.len());
    let mut category_totals = CategoryBreakdown::default();

    for day in &tour.days {
        let date = tour.date_of(day).unwrap_or(as_of);
        let city = day.city.trim();
        let scope = RateScope {
            city: (!city.is_empty()).then_some(city),
            tier: tour.tier.as_deref().filter(|t| !t.trim().is_empty()),
            date,
            pax,
        };

        let mut breakdown = CategoryBreakdown::default();
        for (category, service_id) in day_slots(day) {
            let amount = price_slot(category, service_id, rates, &scope, column, &mut warnings)?;
            breakdown.add(category, amount);
        }

        category_totals.accumulate(&breakdown);
        days.push(DayPricing {
            day_number: day.day_number,
            date,
            city: day.city.clone(),
            total: breakdown.total(),
            breakdown,
        });
    }

    let grand_total = category_totals.total();
    let per_person = round_money(grand_total / Decimal::from(pax), 2);

    Ok(TourPricing {
        currency: currency.to_string(),
        pax,
        rate_column: column,
        days,
        category_totals,
        grand_total,
        per_person,
        warnings,
    })
}

/// Where the margin of a quote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginSource {
    Request,
    Partner,
    Default,
}

/// Explicit margin, then partner markup, then the configured default.
pub fn resolve_margin(
    requested: Option<Decimal>,
    partner_markup: Option<Decimal>,
    default_margin: Decimal,
) -> (Decimal, MarginSource) {
    match (requested, partner_markup) {
        (Some(margin), _) => (margin, MarginSource::Request),
        (None, Some(markup)) => (markup, MarginSource::Partner),
        (None, None) => (default_margin, MarginSource::Default),
    }
}

/// Margins must fall in `[0, 1000)` percent
pub fn check_margin(margin_percent: Decimal) -> Result<(), PricingError> {
    if margin_percent < Decimal::ZERO || margin_percent >= Decimal::from(1000) {
        return Err(PricingError::InvalidMargin { margin_percent });
    }
    Ok(())
}

/// Apply a margin percentage to a cost price.
///
/// `sell = cost * (1 + margin / 100)`, rounded to cents.
pub fn apply_margin(cost: Decimal, margin_percent: Decimal) -> Result<Decimal, PricingError> {
    check_margin(margin_percent)?;
    let factor = Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED;
    Ok(round_money(cost * factor, 2))
}

/// Sell-side view of a priced tour
#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub currency: String,
    pub pax: i32,
    pub margin_percent: Decimal,
    pub margin_source: MarginSource,
    pub cost_total: Decimal,
    pub cost_per_person: Decimal,
    pub sell_total: Decimal,
    pub sell_per_person: Decimal,
    pub profit: Decimal,
}

/// Build a quote from a pricing result
pub fn build_quote(
    pricing: &TourPricing,
    margin_percent: Decimal,
    margin_source: MarginSource,
) -> Result<QuoteResult, PricingError> {
    let sell_total = apply_margin(pricing.grand_total, margin_percent)?;
    let sell_per_person = round_money(sell_total / Decimal::from(pricing.pax.max(1)), 2);

    Ok(QuoteResult {
        currency: pricing.currency.clone(),
        pax: pricing.pax,
        margin_percent,
        margin_source,
        cost_total: pricing.grand_total,
        cost_per_person: pricing.per_person,
        sell_total,
        sell_per_person,
        profit: sell_total - pricing.grand_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TourActivity;
    use crate::pricing::models::fixtures::rate;
    use crate::pricing::models::Rate;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn empty_day(n: i32, city: &str) -> TourDay {
        TourDay {
            day_number: n,
            city: city.to_string(),
            accommodation_id: None,
            guide_id: None,
            meal_ids: vec![],
            activities: vec![],
            notes: None,
        }
    }

    fn tour(days: Vec<TourDay>) -> Tour {
        Tour {
            id: None,
            name: "Classic Egypt".to_string(),
            client_name: None,
            start_date: None,
            tier: None,
            pax: 1,
            is_euro_passport: true,
            margin_percent: None,
            partner_id: None,
            days,
        }
    }

    fn per_person(category: ServiceCategory, eur: Decimal, non_eur: Decimal) -> Rate {
        rate(Uuid::new_v4(), category, PriceBasis::PerPerson, eur, non_eur)
    }

    fn per_group(category: ServiceCategory, eur: Decimal, non_eur: Decimal) -> Rate {
        rate(Uuid::new_v4(), category, PriceBasis::PerGroup, eur, non_eur)
    }

    /// Day with a hotel, a meal and an entrance, all per person
    fn per_person_fixture() -> (Tour, RateBook) {
        let hotel = per_person(ServiceCategory::Accommodation, dec!(80), dec!(95));
        let lunch = per_person(ServiceCategory::Meal, dec!(15), dec!(18));
        let museum = per_person(ServiceCategory::Entrance, dec!(25), dec!(40));

        let mut day = empty_day(1, "Cairo");
        day.accommodation_id = Some(hotel.service_id);
        day.meal_ids.push(lunch.service_id);
        day.activities.push(TourActivity {
            name: "Egyptian Museum".to_string(),
            entrance_id: Some(museum.service_id),
            transport_id: None,
        });

        let book = vec![hotel, lunch, museum].into_iter().collect();
        (tour(vec![day]), book)
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(2.25), 1), dec!(2.2));
        assert_eq!(round_money(dec!(2.35), 1), dec!(2.4));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(-1.234), 2), dec!(-1.23));
        assert_eq!(round_money(dec!(999999.995), 2), dec!(1000000.00));
    }

    // ==================== allocate_per_person tests ====================

    #[test]
    fn test_allocate_even_split() {
        let result = allocate_per_person(dec!(100), 4).unwrap();
        assert_eq!(result.per_person, dec!(25));
        assert_eq!(result.amounts, vec![dec!(25); 4]);
    }

    #[test]
    fn test_allocate_with_remainder() {
        let result = allocate_per_person(dec!(100), 3).unwrap();
        assert_eq!(result.per_person, dec!(33.33));
        assert_eq!(result.amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_allocate_negative_remainder_still_sums() {
        // 100 / 7 rounds to 14.29, which over-allocates by 0.03
        let result = allocate_per_person(dec!(100), 7).unwrap();
        let total: Decimal = result.amounts.iter().sum();
        assert_eq!(total, dec!(100));
        assert_eq!(result.amounts[0], dec!(14.28));
        assert_eq!(result.amounts[6], dec!(14.29));
    }

    #[test]
    fn test_allocate_rejects_pax_out_of_range() {
        assert!(matches!(
            allocate_per_person(dec!(100), 0),
            Err(PricingError::InvalidPax { pax: 0 })
        ));
        assert!(matches!(
            allocate_per_person(dec!(100), i32::MAX),
            Err(PricingError::InvalidPax { .. })
        ));

        let at_limit = allocate_per_person(dec!(1000), MAX_PAX).unwrap();
        assert_eq!(at_limit.amounts.len(), MAX_PAX as usize);
        assert_eq!(at_limit.per_person, dec!(1));
    }

    #[test]
    fn test_allocate_rejects_huge_totals() {
        assert!(matches!(
            allocate_per_person(Decimal::MAX, 2),
            Err(PricingError::InvalidAmount { .. })
        ));
        assert!(matches!(
            allocate_per_person(Decimal::MIN, 3),
            Err(PricingError::InvalidAmount { .. })
        ));

        let at_limit = allocate_per_person(MAX_ALLOCATION_TOTAL, 3).unwrap();
        let total: Decimal = at_limit.amounts.iter().sum();
        assert_eq!(total, MAX_ALLOCATION_TOTAL);
    }

    // ==================== calculate_tour_pricing tests ====================

    #[test]
    fn test_zero_days_costs_nothing() {
        let pricing =
            calculate_tour_pricing(&tour(vec![]), &RateBook::new(), 4, true, as_of(), "EUR").unwrap();
        assert_eq!(pricing.grand_total, dec!(0));
        assert_eq!(pricing.per_person, dec!(0));
        assert!(pricing.days.is_empty());
    }

    #[test]
    fn test_non_positive_pax_is_rejected() {
        let err = calculate_tour_pricing(&tour(vec![]), &RateBook::new(), 0, true, as_of(), "EUR")
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidPax { pax: 0 }));
    }

    #[test]
    fn test_per_person_categories_scale_with_pax() {
        let (tour, book) = per_person_fixture();
        let rate_sum = dec!(80) + dec!(15) + dec!(25);

        for pax in [1, 2, 5, 13] {
            let pricing = calculate_tour_pricing(&tour, &book, pax, true, as_of(), "EUR").unwrap();
            assert_eq!(pricing.grand_total, rate_sum * Decimal::from(pax));
            assert_eq!(pricing.per_person, rate_sum);
        }
    }

    #[test]
    fn test_passport_flag_selects_one_column() {
        let (tour, book) = per_person_fixture();

        let eur = calculate_tour_pricing(&tour, &book, 2, true, as_of(), "EUR").unwrap();
        assert_eq!(eur.rate_column, RateColumn::Eur);
        assert_eq!(eur.grand_total, dec!(240)); // (80 + 15 + 25) * 2

        let non_eur = calculate_tour_pricing(&tour, &book, 2, false, as_of(), "EUR").unwrap();
        assert_eq!(non_eur.rate_column, RateColumn::NonEur);
        assert_eq!(non_eur.grand_total, dec!(306)); // (95 + 18 + 40) * 2
    }

    #[test]
    fn test_group_rates_are_flat() {
        let van = per_group(ServiceCategory::Transport, dec!(60), dec!(60));
        let guide = per_group(ServiceCategory::Guide, dec!(45), dec!(45));
        let mut day = empty_day(1, "Luxor");
        day.guide_id = Some(guide.service_id);
        day.activities.push(TourActivity {
            name: "Karnak transfer".to_string(),
            entrance_id: None,
            transport_id: Some(van.service_id),
        });
        let book = vec![van, guide].into_iter().collect();

        let pricing = calculate_tour_pricing(&tour(vec![day]), &book, 4, true, as_of(), "EUR").unwrap();
        assert_eq!(pricing.category_totals.transport, dec!(60));
        assert_eq!(pricing.category_totals.guides, dec!(45));
        assert_eq!(pricing.grand_total, dec!(105));
        assert_eq!(pricing.per_person, dec!(26.25));
    }

    #[test]
    fn test_unset_references_contribute_zero() {
        let days = vec![empty_day(1, "Cairo"), empty_day(2, "")];
        let pricing =
            calculate_tour_pricing(&tour(days), &RateBook::new(), 3, false, as_of(), "EUR").unwrap();
        assert_eq!(pricing.days.len(), 2);
        for day in &pricing.days {
            assert_eq!(day.breakdown, CategoryBreakdown::default());
            assert_eq!(day.total, dec!(0));
        }
        assert!(pricing.warnings.is_empty());
    }

    #[test]
    fn test_reference_without_rate_warns_and_costs_zero() {
        let mut day = empty_day(1, "Aswan");
        day.accommodation_id = Some(Uuid::new_v4());
        let pricing =
            calculate_tour_pricing(&tour(vec![day]), &RateBook::new(), 2, true, as_of(), "EUR").unwrap();
        assert_eq!(pricing.grand_total, dec!(0));
        assert_eq!(pricing.warnings.len(), 1);
        assert!(pricing.warnings[0].contains("accommodation"));
    }

    #[test]
    fn test_days_roll_up_into_category_totals() {
        let hotel = per_person(ServiceCategory::Accommodation, dec!(50), dec!(50));
        let dinner = per_person(ServiceCategory::Meal, dec!(20), dec!(20));
        let mut d1 = empty_day(1, "Cairo");
        d1.accommodation_id = Some(hotel.service_id);
        let mut d2 = empty_day(2, "Cairo");
        d2.accommodation_id = Some(hotel.service_id);
        d2.meal_ids = vec![dinner.service_id, dinner.service_id];
        let book = vec![hotel, dinner].into_iter().collect();

        let pricing = calculate_tour_pricing(&tour(vec![d1, d2]), &book, 2, true, as_of(), "EUR").unwrap();
        assert_eq!(pricing.days[0].total, dec!(100));
        assert_eq!(pricing.days[1].total, dec!(180));
        assert_eq!(pricing.category_totals.accommodation, dec!(200));
        assert_eq!(pricing.category_totals.meals, dec!(80));
        assert_eq!(pricing.grand_total, dec!(280));
    }

    #[test]
    fn test_day_dates_follow_start_date() {
        let service = Uuid::new_v4();
        let mut low = rate(service, ServiceCategory::Accommodation, PriceBasis::PerPerson, dec!(70), dec!(70));
        low.valid_to = NaiveDate::from_ymd_opt(2025, 6, 30);
        let mut high = rate(service, ServiceCategory::Accommodation, PriceBasis::PerPerson, dec!(110), dec!(110));
        high.valid_from = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();

        let mut d1 = empty_day(1, "Hurghada");
        d1.accommodation_id = Some(service);
        let mut d2 = d1.clone();
        d2.day_number = 2;

        let mut t = tour(vec![d1, d2]);
        t.start_date = NaiveDate::from_ymd_opt(2025, 6, 30);
        let book = vec![low, high].into_iter().collect();

        let pricing = calculate_tour_pricing(&t, &book, 1, true, as_of(), "EUR").unwrap();
        assert_eq!(pricing.days[0].total, dec!(70));
        assert_eq!(pricing.days[1].total, dec!(110));
        assert_eq!(pricing.days[1].date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn test_overlapping_rates_fail_the_calculation() {
        let service = Uuid::new_v4();
        let a = rate(service, ServiceCategory::Meal, PriceBasis::PerPerson, dec!(10), dec!(10));
        let b = rate(service, ServiceCategory::Meal, PriceBasis::PerPerson, dec!(12), dec!(12));
        let mut day = empty_day(1, "Cairo");
        day.meal_ids.push(service);
        let book = vec![a, b].into_iter().collect();

        let err = calculate_tour_pricing(&tour(vec![day]), &book, 2, true, as_of(), "EUR").unwrap_err();
        assert!(matches!(err, PricingError::OverlappingRates { .. }));
    }

    // ==================== margin and quote tests ====================

    #[test]
    fn test_apply_margin() {
        assert_eq!(apply_margin(dec!(1000), dec!(15)).unwrap(), dec!(1150));
        assert_eq!(apply_margin(dec!(99.99), dec!(0)).unwrap(), dec!(99.99));
        assert_eq!(apply_margin(dec!(10.01), dec!(12.5)).unwrap(), dec!(11.26));
        assert!(apply_margin(dec!(100), dec!(-1)).is_err());
        assert!(apply_margin(dec!(100), dec!(1000)).is_err());
    }

    #[test]
    fn test_resolve_margin_precedence() {
        assert_eq!(
            resolve_margin(Some(dec!(5)), Some(dec!(8)), dec!(15)),
            (dec!(5), MarginSource::Request)
        );
        assert_eq!(
            resolve_margin(None, Some(dec!(8)), dec!(15)),
            (dec!(8), MarginSource::Partner)
        );
        assert_eq!(
            resolve_margin(None, None, dec!(15)),
            (dec!(15), MarginSource::Default)
        );
    }

    #[test]
    fn test_build_quote() {
        let (tour, book) = per_person_fixture();
        let pricing = calculate_tour_pricing(&tour, &book, 3, true, as_of(), "EUR").unwrap();

        let quote = build_quote(&pricing, dec!(20), MarginSource::Default).unwrap();
        assert_eq!(quote.cost_total, dec!(360));
        assert_eq!(quote.sell_total, dec!(432));
        assert_eq!(quote.sell_per_person, dec!(144));
        assert_eq!(quote.cost_per_person, dec!(120));
        assert_eq!(quote.profit, dec!(72));
        assert_eq!(quote.currency, "EUR");
    }
}
