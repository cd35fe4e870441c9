//! Coupon evaluation.

use serde::{Deserialize, Serialize};

/// The result of evaluating a coupon code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// The code as supplied, if any.
    pub code: Option<String>,
    /// Discount as a ratio of the subtotal (0.10 = 10% off).
    pub percent: f64,
    /// Human-readable outcome for display next to the coupon input.
    pub message: String,
}

impl Coupon {
    /// No coupon supplied.
    pub fn none() -> Self {
        Self {
            code: None,
            percent: 0.0,
            message: String::new(),
        }
    }

    /// Whether any discount applies.
    pub fn applies(&self) -> bool {
        self.percent > 0.0
    }
}

/// A static code -> percent lookup table.
///
/// Evaluation is pure, deterministic, and case-sensitive, and never
/// fails: unknown codes evaluate to a zero discount with an
/// "invalid coupon" message.
#[derive(Debug, Clone)]
pub struct DiscountTable {
    codes: Vec<(String, f64)>,
}

impl DiscountTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self { codes: Vec::new() }
    }

    /// The standard table: `SAVE10` for 10% off.
    pub fn standard() -> Self {
        Self::empty().with_code("SAVE10", 0.10)
    }

    /// Add a code to the table.
    pub fn with_code(mut self, code: impl Into<String>, percent: f64) -> Self {
        self.codes.push((code.into(), percent));
        self
    }

    /// Evaluate an optional coupon code.
    pub fn evaluate(&self, code: Option<&str>) -> Coupon {
        let Some(code) = code.filter(|c| !c.is_empty()) else {
            return Coupon::none();
        };

        match self.codes.iter().find(|(c, _)| c == code) {
            Some((_, percent)) => Coupon {
                code: Some(code.to_string()),
                percent: *percent,
                message: format!("Coupon {code} applied!"),
            },
            None => Coupon {
                code: Some(code.to_string()),
                percent: 0.0,
                message: "Invalid coupon code.".to_string(),
            },
        }
    }
}

impl Default for DiscountTable {
    fn default() -> Self {
        Self::standard()
    }
}
