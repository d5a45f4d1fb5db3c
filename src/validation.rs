// ✅ Field Validation - Patron record rules
// Pure predicates, one per field. No shared state.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ID_LENGTH: usize = 7;
pub const DEFAULT_FINE_MIN: f64 = 0.0;
pub const DEFAULT_FINE_MAX: f64 = 250.0;

// ============================================================================
// FINE CHECK
// ============================================================================

/// Outcome of the two-stage fine check: parse first, then range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FineCheck {
    Valid(f64),
    /// Text is not a number (NaN included)
    Unparsable,
    /// Parsed, but outside the inclusive bounds
    OutOfRange(f64),
}

// ============================================================================
// FIELD RULES
// ============================================================================

/// Domain constants for patron fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    /// Exact number of ASCII digits in an id
    pub id_length: usize,

    /// Inclusive lower fine bound
    pub fine_min: f64,

    /// Inclusive upper fine bound
    pub fine_max: f64,
}

impl Default for FieldRules {
    fn default() -> Self {
        FieldRules {
            id_length: DEFAULT_ID_LENGTH,
            fine_min: DEFAULT_FINE_MIN,
            fine_max: DEFAULT_FINE_MAX,
        }
    }
}

impl FieldRules {
    /// True iff `id` is exactly `id_length` ASCII digits, nothing else.
    pub fn valid_id(&self, id: &str) -> bool {
        id.len() == self.id_length && id.bytes().all(|b| b.is_ascii_digit())
    }

    /// Parse then range-check a fine. The two failures are exclusive.
    ///
    /// Of the non-finite spellings only a signed or bare `Infinity` counts as
    /// a number; `inf`, `infinity` and `NaN` are unparsable.
    pub fn check_fine(&self, text: &str) -> FineCheck {
        let text = text.trim();
        match text.parse::<f64>() {
            Ok(v) if v.is_nan() => FineCheck::Unparsable,
            Ok(v) if v.is_infinite() && text.trim_start_matches(&['+', '-'][..]) != "Infinity" => {
                FineCheck::Unparsable
            }
            Ok(v) if v < self.fine_min || v > self.fine_max => FineCheck::OutOfRange(v),
            Ok(v) => FineCheck::Valid(v),
            Err(_) => FineCheck::Unparsable,
        }
    }

    pub fn fine_in_range(&self, fine: f64) -> bool {
        fine >= self.fine_min && fine <= self.fine_max
    }
}

pub fn valid_name(name: &str) -> bool {
    !name.trim().is_empty()
}

pub fn valid_address(address: &str) -> bool {
    !address.trim().is_empty()
}
