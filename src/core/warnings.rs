use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Data quality warnings raised while building or checking a draft.
/// They never block a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Parser reported low confidence for a field.
    LowConfidence {
        field: String,
        /// Score scaled to basis points (0..=10000)
        score_bp: u32,
    },
    /// Parser's tax figure disagrees with the computed breakdown by more than a paisa.
    TaxAmountMismatch {
        #[schemars(with = "f64")]
        extracted: Decimal,
        #[schemars(with = "f64")]
        computed: Decimal,
    },
    /// Tax type other than GST; slabs may not apply.
    UnknownTaxType { tax_type: String },
    /// Entered total differs from the sum of line items.
    TotalMismatch {
        #[schemars(with = "f64")]
        amount: Decimal,
        #[schemars(with = "f64")]
        line_item_total: Decimal,
    },
}

impl Warning {
    pub fn message(&self) -> String {
        match self {
            Warning::LowConfidence { field, score_bp } => format!(
                "low confidence for '{}' ({:.0}%) - check the extracted value",
                field,
                *score_bp as f64 / 100.0
            ),
            Warning::TaxAmountMismatch {
                extracted,
                computed,
            } => format!(
                "receipt shows tax of {:.2} but line items add up to {:.2}",
                extracted, computed
            ),
            Warning::UnknownTaxType { tax_type } => {
                format!("tax type '{}' is not GST", tax_type)
            }
            Warning::TotalMismatch {
                amount,
                line_item_total,
            } => format!(
                "total {:.2} does not match line items {:.2}",
                amount, line_item_total
            ),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
