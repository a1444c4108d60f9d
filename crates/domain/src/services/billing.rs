//! Money arithmetic for estimates, invoices and counter sales.
//!
//! Amounts are rounded to cents at every boundary: each line, the tax, and the
//! running balance.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::estimate::LineItem;
use crate::models::invoice::InvoiceStatus;

/// Upper bound on tax rates (fractional, so 0.25 is 25%).
pub fn max_tax_rate() -> Decimal {
    Decimal::new(25, 2)
}

/// Errors raised by billing rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("Tax rate must be between 0 and 0.25")]
    TaxRateOutOfRange,

    #[error("Payment must be greater than zero")]
    NonPositivePayment,

    #[error("Payment of {amount} exceeds balance due of {balance}")]
    Overpayment { amount: Decimal, balance: Decimal },

    #[error("Invoice is {0} and does not accept payments")]
    NotPayable(InvoiceStatus),
}

/// Computed totals of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Rounds to cents, midpoint away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_total(line: &LineItem) -> Decimal {
    round_money(line.quantity * line.unit_price)
}

pub fn validate_tax_rate(tax_rate: Decimal) -> Result<(), BillingError> {
    if tax_rate < Decimal::ZERO || tax_rate > max_tax_rate() {
        return Err(BillingError::TaxRateOutOfRange);
    }
    Ok(())
}

/// Rejects non-positive quantities and negative prices on any line.
pub fn validate_lines(lines: &[LineItem]) -> Result<(), BillingError> {
    for line in lines {
        if line.quantity <= Decimal::ZERO {
            return Err(BillingError::NonPositive("quantity"));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(BillingError::Negative("unit_price"));
        }
    }
    Ok(())
}

/// Rejects any negative named amount.
pub fn validate_non_negative(fields: &[(&'static str, Decimal)]) -> Result<(), BillingError> {
    match fields.iter().find(|(_, value)| *value < Decimal::ZERO) {
        Some((name, _)) => Err(BillingError::Negative(*name)),
        None => Ok(()),
    }
}

/// Totals for a set of lines taxed at `tax_rate`.
pub fn compute_totals(lines: &[LineItem], tax_rate: Decimal) -> Totals {
    let subtotal: Decimal = lines.iter().map(line_total).sum();
    let tax_amount = round_money(subtotal * tax_rate);
    Totals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount,
    }
}

/// New paid amount and status after applying `amount` to an invoice.
pub fn apply_payment(
    status: InvoiceStatus,
    total: Decimal,
    amount_paid: Decimal,
    amount: Decimal,
) -> Result<(Decimal, InvoiceStatus), BillingError> {
    if !status.accepts_payment() {
        return Err(BillingError::NotPayable(status));
    }
    let amount = round_money(amount);
    if amount <= Decimal::ZERO {
        return Err(BillingError::NonPositivePayment);
    }
    let balance = (total - amount_paid).max(Decimal::ZERO);
    if amount > balance {
        return Err(BillingError::Overpayment { amount, balance });
    }

    let paid = amount_paid + amount;
    let next = if paid >= total {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };
    Ok((paid, next))
}
