//! Balance arithmetic for invoices.
//!
//! Paid amount, balance due and status are recomputed together on every
//! payment so that `paid_amount + balance_due == total_amount` always holds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Partial,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Paid => "paid",
        }
    }
}

/// Status implied by the amounts
pub fn invoice_status(total: Decimal, paid: Decimal) -> InvoiceStatus {
    if paid <= Decimal::ZERO {
        InvoiceStatus::Unpaid
    } else if paid >= total {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::Partial
    }
}

/// Amounts after a payment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceBalance {
    pub paid_amount: Decimal,
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
}

/// Apply a payment to an invoice's current amounts.
///
/// Payments must be positive and may not exceed the balance.
pub fn apply_payment(total: Decimal, paid: Decimal, amount: Decimal) -> Result<InvoiceBalance, String> {
    let amount = round_money(amount, 2);
    if amount <= Decimal::ZERO {
        return Err("payment amount must be positive".to_string());
    }

    let balance = total - paid;
    if amount > balance {
        return Err(format!(
            "payment of {} exceeds the balance due of {}",
            amount, balance
        ));
    }

    let paid_amount = paid + amount;
    Ok(InvoiceBalance {
        paid_amount,
        balance_due: total - paid_amount,
        status: invoice_status(total, paid_amount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_follows_amounts() {
        assert_eq!(invoice_status(dec!(100), dec!(0)), InvoiceStatus::Unpaid);
        assert_eq!(invoice_status(dec!(100), dec!(0.01)), InvoiceStatus::Partial);
        assert_eq!(invoice_status(dec!(100), dec!(100)), InvoiceStatus::Paid);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let first = apply_payment(dec!(1500), dec!(0), dec!(500)).unwrap();
        assert_eq!(first.paid_amount, dec!(500));
        assert_eq!(first.balance_due, dec!(1000));
        assert_eq!(first.status, InvoiceStatus::Partial);

        let second = apply_payment(dec!(1500), first.paid_amount, dec!(1000)).unwrap();
        assert_eq!(second.balance_due, dec!(0));
        assert_eq!(second.status, InvoiceStatus::Paid);
        assert_eq!(second.paid_amount + second.balance_due, dec!(1500));
    }

    #[test]
    fn test_rejects_non_positive_and_overpayment() {
        assert!(apply_payment(dec!(100), dec!(0), dec!(0)).is_err());
        assert!(apply_payment(dec!(100), dec!(0), dec!(-5)).is_err());
        assert!(apply_payment(dec!(100), dec!(60), dec!(40.01)).is_err());
        assert!(apply_payment(dec!(100), dec!(100), dec!(1)).is_err());
    }
}
