//! # Money Module
//!
//! Integer money and the derived amounts of an invoice.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INVOICE TOTALS MUST ADD UP EXACTLY                                     │
//! │                                                                         │
//! │  With floating point:                                                   │
//! │    subtotal 0.1 + 0.2 = 0.30000000000000004                             │
//! │    tax = 10% of that, total = subtotal + tax  → off by a fraction      │
//! │                                                                         │
//! │  With integer minor units (cents):                                      │
//! │    subtotal = Σ quantity × unit_price   (exact)                         │
//! │    tax      = round(subtotal × bps / 10000)                             │
//! │    total    = subtotal + tax            (exact, checked by the DB)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::money::Money;
//!
//! let unit_price = Money::from_cents(5_000); // 50.00
//! let line = unit_price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 15_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// LineItemInput.unit_price_cents ──► InvoiceItem.total_price_cents
///                                              │
///                                              ▼ Σ
///                        Invoice.subtotal ──► tax ──► Invoice.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Computes tax at `rate`, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`, widened to i128 so that
    /// large subtotals cannot overflow the intermediate product. Fails when
    /// the result does not fit back into an `i64` (rates above 100%).
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::money::Money;
    /// use invoicer_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(1_005); // 10.05
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)).unwrap();
    /// // 10.05 × 10% = 1.005 → 1.01
    /// assert_eq!(tax.cents(), 101);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> CoreResult<Money> {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        i64::try_from(tax_cents)
            .map(Money)
            .map_err(|_| CoreError::AmountOverflow {
                context: format!("tax on {} at {} bps", self.0, rate.bps()),
            })
    }

    /// Multiplies by a line quantity, failing on overflow.
    pub fn checked_mul_quantity(&self, quantity: i64) -> CoreResult<Money> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("line total ({} × {})", self.0, quantity),
            })
    }

    /// Adds two amounts, failing on overflow. `context` names the sum in
    /// the error.
    pub fn checked_add(&self, other: Money, context: &str) -> CoreResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: context.to_string(),
            })
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display, e.g. `250.00`. Currency symbols are a UI concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// The three derived amounts stored on every invoice header.
///
/// Always built through [`InvoiceTotals::from_subtotal`], so
/// `total == subtotal + tax` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// Derives tax and total from a subtotal.
    ///
    /// ## Errors
    /// `AmountOverflow` when the tax or the total does not fit in an `i64`.
    pub fn from_subtotal(subtotal: Money, rate: TaxRate) -> CoreResult<Self> {
        let tax = subtotal.calculate_tax(rate)?;
        Ok(InvoiceTotals {
            subtotal,
            tax,
            total: subtotal.checked_add(tax, "invoice total")?,
        })
    }

    /// Sums `(quantity, unit_price)` pairs and derives the totals.
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::money::{InvoiceTotals, Money};
    /// use invoicer_core::types::TaxRate;
    ///
    /// let lines = [(2, Money::from_cents(10_000)), (1, Money::from_cents(5_000))];
    /// let totals = InvoiceTotals::from_lines(lines, TaxRate::from_bps(1000)).unwrap();
    /// assert_eq!(totals.subtotal.cents(), 25_000);
    /// assert_eq!(totals.total.cents(), 27_500);
    /// ```
    pub fn from_lines<I>(lines: I, rate: TaxRate) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (i64, Money)>,
    {
        let mut subtotal = Money::zero();
        for (quantity, unit_price) in lines {
            subtotal =
                subtotal.checked_add(unit_price.checked_mul_quantity(quantity)?, "invoice subtotal")?;
        }
        Self::from_subtotal(subtotal, rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
