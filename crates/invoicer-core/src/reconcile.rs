//! # Line-Item Reconciliation
//!
//! Computes how to turn an invoice's current line items into the desired
//! set. The result is an explicit [`ReconcilePlan`]; the database crate
//! applies it inside the update transaction.
//!
//! ## Matching Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A line is identified by its catalog item (item_id).                    │
//! │                                                                         │
//! │  current                 desired                 plan                   │
//! │  ───────                 ───────                 ────                   │
//! │  A: 1 × 10.00            A: 3 × 10.00            update A               │
//! │  B: 2 × 5.00             C: 1 × 7.00             insert C               │
//! │                                                  delete B               │
//! │                                                  subtotal 37.00         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Duplicate catalog references in the desired set collapse to one line:
//! the last occurrence wins, at the position of the first.

use std::collections::HashMap;

use crate::error::CoreResult;
use crate::money::{InvoiceTotals, Money};
use crate::types::{InvoiceItem, LineItemInput, TaxRate};

// =============================================================================
// Plan Types
// =============================================================================

/// An existing line whose quantity or price changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineUpdate {
    /// Id of the existing invoice item row.
    pub line_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// A new line for a catalog item not yet on the invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInsert {
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// An existing line whose catalog item is absent from the desired set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDelete {
    pub line_id: String,
    pub item_id: String,
}

/// Everything the update transaction must do to the item rows, plus the
/// header amounts that result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcilePlan {
    pub updates: Vec<LineUpdate>,
    pub inserts: Vec<LineInsert>,
    pub deletes: Vec<LineDelete>,
    /// Ids of existing lines that already match the desired values.
    pub unchanged: Vec<String>,
    pub totals: InvoiceTotals,
    /// Number of distinct lines after reconciliation.
    pub line_count: i64,
}

impl ReconcilePlan {
    /// True when applying the plan would not touch any item row.
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Collapses duplicate catalog references: last write wins, first
/// occurrence keeps its position.
pub fn normalize_lines(desired: &[LineItemInput]) -> Vec<&LineItemInput> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(desired.len());
    let mut lines: Vec<&LineItemInput> = Vec::with_capacity(desired.len());

    for line in desired {
        match position.get(line.item_id.as_str()) {
            Some(&idx) => lines[idx] = line,
            None => {
                position.insert(line.item_id.as_str(), lines.len());
                lines.push(line);
            }
        }
    }

    lines
}

/// Diffs `current` against `desired` and derives the resulting totals.
///
/// Pure and deterministic: applying the plan and re-planning with the same
/// desired set yields a plan with no updates, inserts or deletes.
///
/// ## Example
/// ```rust
/// use invoicer_core::reconcile::plan_reconciliation;
/// use invoicer_core::types::{LineItemInput, TaxRate};
///
/// let desired = vec![LineItemInput::new("1", 2, 10_000), LineItemInput::new("2", 1, 5_000)];
/// let plan = plan_reconciliation(&[], &desired, TaxRate::default()).unwrap();
///
/// assert_eq!(plan.inserts.len(), 2);
/// assert_eq!(plan.totals.total.cents(), 27_500);
/// ```
pub fn plan_reconciliation(
    current: &[InvoiceItem],
    desired: &[LineItemInput],
    rate: TaxRate,
) -> CoreResult<ReconcilePlan> {
    let mut existing: HashMap<&str, &InvoiceItem> = current
        .iter()
        .map(|item| (item.item_id.as_str(), item))
        .collect();

    let mut plan = ReconcilePlan::default();
    let mut subtotal = Money::zero();

    for line in normalize_lines(desired) {
        let total_price = line.unit_price().checked_mul_quantity(line.quantity)?;
        subtotal = subtotal.checked_add(total_price, "invoice subtotal")?;

        match existing.remove(line.item_id.as_str()) {
            Some(item)
                if item.quantity == line.quantity
                    && item.unit_price_cents == line.unit_price_cents
                    && item.total_price_cents == total_price.cents() =>
            {
                plan.unchanged.push(item.id.clone());
            }
            Some(item) => plan.updates.push(LineUpdate {
                line_id: item.id.clone(),
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                total_price_cents: total_price.cents(),
            }),
            None => plan.inserts.push(LineInsert {
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                total_price_cents: total_price.cents(),
            }),
        }

        plan.line_count += 1;
    }

    // Whatever is left in the map was not requested; keep the current order.
    plan.deletes = current
        .iter()
        .filter(|item| existing.contains_key(item.item_id.as_str()))
        .map(|item| LineDelete {
            line_id: item.id.clone(),
            item_id: item.item_id.clone(),
        })
        .collect();

    plan.totals = InvoiceTotals::from_subtotal(subtotal, rate)?;
    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================
