//! # Invoice Number Sequence
//!
//! Pure parsing and formatting of display invoice numbers. The database
//! crate owns the locking; this module only answers "given the greatest
//! stored number, what comes next?".
//!
//! ## Number Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored (greatest)      trailing digits      next                       │
//! │  ────────────────       ───────────────      ────                       │
//! │  (none)                 -                    "001"                      │
//! │  "001"                  1                    "002"                      │
//! │  "099"                  99                   "100"                      │
//! │  "999"                  999                  "1000"  (never truncated)  │
//! │  "INV-041"              41                   "042"                      │
//! │  "INV-A"                (none)               policy decides             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Minimum width of a formatted invoice number.
pub const NUMBER_WIDTH: usize = 3;

// =============================================================================
// Malformed Number Policy
// =============================================================================

/// What to do when the greatest stored invoice number has no numeric tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedNumberPolicy {
    /// Start the sequence over at 1. The unique index on `invoice_number`
    /// turns a resulting collision into a conflict error.
    #[default]
    Restart,
    /// Fail the create with [`CoreError::MalformedInvoiceNumber`].
    Reject,
}

impl MalformedNumberPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MalformedNumberPolicy::Restart => "restart",
            MalformedNumberPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for MalformedNumberPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MalformedNumberPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(MalformedNumberPolicy::Restart),
            "reject" => Ok(MalformedNumberPolicy::Reject),
            _ => Err(ValidationError::NotAllowed {
                field: "malformed_numbers".to_string(),
                allowed: vec!["restart".to_string(), "reject".to_string()],
            }),
        }
    }
}

// =============================================================================
// Next Number
// =============================================================================

/// Outcome of deriving the next number, so callers can log a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextNumber {
    /// Derived normally from the previous number (or the first ever).
    Sequential(String),
    /// The previous number was malformed and the sequence restarted.
    Restarted { next: String, malformed: String },
}

impl NextNumber {
    pub fn into_string(self) -> String {
        match self {
            NextNumber::Sequential(next) | NextNumber::Restarted { next, .. } => next,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NextNumber::Sequential(next) | NextNumber::Restarted { next, .. } => next,
        }
    }
}

/// Extracts the value of the trailing run of ASCII digits.
///
/// Returns `None` when the string does not end in a digit or the run does
/// not fit in a `u64`.
pub fn parse_sequence(number: &str) -> Option<u64> {
    let digits_start = number
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    number[digits_start..].parse().ok()
}

/// Formats a sequence value, zero-padded to [`NUMBER_WIDTH`] and never truncated.
///
/// ## Example
/// ```rust
/// use invoicer_core::sequence::format_sequence;
///
/// assert_eq!(format_sequence(1), "001");
/// assert_eq!(format_sequence(1000), "1000");
/// ```
pub fn format_sequence(value: u64) -> String {
    format!("{:0width$}", value, width = NUMBER_WIDTH)
}

/// Derives the number following `last`, the greatest stored invoice number.
///
/// ## Example
/// ```rust
/// use invoicer_core::sequence::{next_invoice_number, MalformedNumberPolicy};
///
/// let next = next_invoice_number(Some("099"), MalformedNumberPolicy::Restart).unwrap();
/// assert_eq!(next.as_str(), "100");
///
/// let first = next_invoice_number(None, MalformedNumberPolicy::Restart).unwrap();
/// assert_eq!(first.as_str(), "001");
/// ```
pub fn next_invoice_number(
    last: Option<&str>,
    policy: MalformedNumberPolicy,
) -> CoreResult<NextNumber> {
    let last = match last.map(str::trim).filter(|s| !s.is_empty()) {
        None => return Ok(NextNumber::Sequential(format_sequence(1))),
        Some(last) => last,
    };

    match parse_sequence(last) {
        Some(value) => {
            let next = value
                .checked_add(1)
                .ok_or_else(|| CoreError::SequenceExhausted(last.to_string()))?;
            Ok(NextNumber::Sequential(format_sequence(next)))
        }
        None => match policy {
            MalformedNumberPolicy::Restart => Ok(NextNumber::Restarted {
                next: format_sequence(1),
                malformed: last.to_string(),
            }),
            MalformedNumberPolicy::Reject => {
                Err(CoreError::MalformedInvoiceNumber(last.to_string()))
            }
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
