//! Client-side cart totals.
//!
//! The backend owns cart contents but the storefront derives the displayed
//! totals itself: `subtotal = Σ price × qty`, `tax = round(subtotal × 8%, 2)`
//! and `total = subtotal + tax`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::Money;

/// Sales tax applied to every cart, in percent.
pub const TAX_RATE_PERCENT: u32 = 8;

/// A line that contributes to cart totals.
pub trait PricedLine {
    /// Price of a single unit.
    fn unit_price(&self) -> Money;

    /// Number of units.
    fn quantity(&self) -> u32;

    /// `unit_price × quantity`, unrounded.
    fn line_total(&self) -> Money {
        self.unit_price() * self.quantity()
    }
}

/// Derived totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of every line total.
    pub subtotal: Money,
    /// Tax on the subtotal, rounded to cents.
    pub tax: Money,
    /// `subtotal + tax`.
    pub total: Money,
}

impl CartTotals {
    /// Compute totals over a set of lines.
    ///
    /// # Example
    ///
    /// ```
    /// use dewdrop_core::{CartTotals, Money, PricedLine};
    ///
    /// struct Line(Money, u32);
    /// impl PricedLine for Line {
    ///     fn unit_price(&self) -> Money { self.0 }
    ///     fn quantity(&self) -> u32 { self.1 }
    /// }
    ///
    /// let totals = CartTotals::from_lines(&[Line(Money::from_cents(1999), 2)]);
    /// assert_eq!(totals.subtotal, Money::from_cents(3998));
    /// assert_eq!(totals.tax, Money::from_cents(320));
    /// assert_eq!(totals.total, Money::from_cents(4318));
    /// ```
    #[must_use]
    pub fn from_lines<'a, L, I>(lines: I) -> Self
    where
        L: PricedLine + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        let subtotal: Money = lines.into_iter().map(PricedLine::line_total).sum();
        let tax = Money::new(subtotal.amount() * Decimal::new(i64::from(TAX_RATE_PERCENT), 2))
            .round_cents();
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// True when the cart is empty or every line is free.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total == Money::ZERO
    }
}
