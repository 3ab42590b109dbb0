use super::error::TaxError;
use super::money::format_rate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One permitted GST rate, e.g. `{ label: "18%", rate: 18 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxSlab {
    pub label: String,
    /// Percentage, not a fraction
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn new(rate: Decimal) -> Self {
        TaxSlab {
            label: format_rate(rate),
            rate,
        }
    }
}

/// Ordered set of allowed slabs plus the category -> default rate lookup used
/// to pre-select a rate. The engine only consults the slabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabTable {
    slabs: Vec<TaxSlab>,
    category_defaults: BTreeMap<String, Decimal>,
}

impl SlabTable {
    pub fn new(slabs: Vec<TaxSlab>) -> Self {
        SlabTable {
            slabs,
            category_defaults: BTreeMap::new(),
        }
    }

    pub fn with_category_defaults(mut self, defaults: BTreeMap<String, Decimal>) -> Self {
        self.category_defaults = defaults;
        self
    }

    pub fn slabs(&self) -> &[TaxSlab] {
        &self.slabs
    }

    pub fn category_defaults(&self) -> &BTreeMap<String, Decimal> {
        &self.category_defaults
    }

    pub fn contains(&self, rate: Decimal) -> bool {
        self.slabs.iter().any(|s| s.rate == rate)
    }

    /// Returns the rate unchanged if it is a configured slab.
    pub fn check(&self, rate: Decimal) -> Result<Decimal, TaxError> {
        if self.contains(rate) {
            Ok(rate)
        } else {
            Err(TaxError::InvalidRate(rate))
        }
    }

    /// Suggested starting rate for a category. Category names match case-insensitively.
    pub fn suggested_rate(&self, category: &str) -> Option<Decimal> {
        self.category_defaults
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(category))
            .map(|(_, rate)| *rate)
    }

    pub fn label(&self, rate: Decimal) -> Option<&str> {
        self.slabs
            .iter()
            .find(|s| s.rate == rate)
            .map(|s| s.label.as_str())
    }
}
