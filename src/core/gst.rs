use super::error::TaxError;
use super::money::MAX_AMOUNT;
use super::slabs::SlabTable;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Decimal places kept for back-solved base prices. Rounding here keeps
/// `cgst + sgst == total_tax` exact; presentation rounding is separate.
pub const INTERNAL_DP: u32 = 10;

/// Whether a quoted price already contains GST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaxMode {
    /// Price includes tax; base is back-solved
    #[default]
    Inclusive,
    /// Price is the pre-tax base; tax is added on top
    Exclusive,
}

/// Intra-state supplies split tax evenly into CGST and SGST, inter-state
/// supplies carry it all as IGST. Always chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Supply {
    #[default]
    IntraState,
    InterState,
}

/// A single GST component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaxKind {
    Cgst,
    Sgst,
    Igst,
}

impl TaxKind {
    pub fn display(&self) -> &'static str {
        match self {
            TaxKind::Cgst => "CGST",
            TaxKind::Sgst => "SGST",
            TaxKind::Igst => "IGST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tax kind '{0}', expected cgst, sgst or igst")]
pub struct ParseTaxKindError(String);

impl FromStr for TaxKind {
    type Err = ParseTaxKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cgst" => Ok(TaxKind::Cgst),
            "sgst" => Ok(TaxKind::Sgst),
            "igst" => Ok(TaxKind::Igst),
            _ => Err(ParseTaxKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Document level GST totals. Always rebuilt from its parts, so
/// `total_gst == cgst + sgst + igst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct GstBreakdown {
    #[schemars(with = "f64")]
    pub cgst: Decimal,
    #[schemars(with = "f64")]
    pub sgst: Decimal,
    #[schemars(with = "f64")]
    pub igst: Decimal,
    #[schemars(with = "f64")]
    pub total_gst: Decimal,
}

impl GstBreakdown {
    pub fn new(cgst: Decimal, sgst: Decimal, igst: Decimal) -> Self {
        GstBreakdown {
            cgst,
            sgst,
            igst,
            total_gst: cgst + sgst + igst,
        }
    }

    pub fn of_kind(kind: TaxKind, amount: Decimal) -> Self {
        match kind {
            TaxKind::Cgst => GstBreakdown::new(amount, Decimal::ZERO, Decimal::ZERO),
            TaxKind::Sgst => GstBreakdown::new(Decimal::ZERO, amount, Decimal::ZERO),
            TaxKind::Igst => GstBreakdown::new(Decimal::ZERO, Decimal::ZERO, amount),
        }
    }

    pub fn get(&self, kind: TaxKind) -> Decimal {
        match kind {
            TaxKind::Cgst => self.cgst,
            TaxKind::Sgst => self.sgst,
            TaxKind::Igst => self.igst,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.cgst.is_zero() && self.sgst.is_zero() && self.igst.is_zero()
    }

    /// Checks `total_gst == cgst + sgst + igst`.
    pub fn verify(&self) -> Result<(), TaxError> {
        let sum = self.cgst + self.sgst + self.igst;
        if sum == self.total_gst {
            Ok(())
        } else {
            Err(TaxError::InconsistentBreakdown(format!(
                "total {} != cgst {} + sgst {} + igst {}",
                self.total_gst, self.cgst, self.sgst, self.igst
            )))
        }
    }
}

impl Add for GstBreakdown {
    type Output = GstBreakdown;

    fn add(self, rhs: GstBreakdown) -> GstBreakdown {
        GstBreakdown::new(self.cgst + rhs.cgst, self.sgst + rhs.sgst, self.igst + rhs.igst)
    }
}

impl Sum for GstBreakdown {
    fn sum<I: Iterator<Item = GstBreakdown>>(iter: I) -> Self {
        iter.fold(GstBreakdown::default(), Add::add)
    }
}

/// Tax computed for one line item, ready to be applied to a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItemTax {
    #[schemars(with = "f64")]
    pub rate: Decimal,
    pub mode: TaxMode,
    pub supply: Supply,
    #[schemars(with = "f64")]
    pub base_price: Decimal,
    #[schemars(with = "f64")]
    pub total_tax: Decimal,
    #[schemars(with = "f64")]
    pub cgst: Decimal,
    #[schemars(with = "f64")]
    pub sgst: Decimal,
    #[schemars(with = "f64")]
    pub igst: Decimal,
    /// Tax-inclusive price to store on the line item
    #[schemars(with = "f64")]
    pub price: Decimal,
}

impl ItemTax {
    pub fn breakdown(&self) -> GstBreakdown {
        GstBreakdown::new(self.cgst, self.sgst, self.igst)
    }
}

/// Tax computed over a whole document when there is no itemisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentTax {
    #[schemars(with = "f64")]
    pub rate: Decimal,
    pub mode: TaxMode,
    pub supply: Supply,
    #[schemars(with = "f64")]
    pub base_amount: Decimal,
    pub breakdown: GstBreakdown,
    /// Tax-inclusive document total
    #[schemars(with = "f64")]
    pub total_amount: Decimal,
}

/// Stateless GST calculator over a configured slab table.
#[derive(Debug, Clone)]
pub struct TaxEngine {
    slabs: SlabTable,
}

impl TaxEngine {
    pub fn new(slabs: SlabTable) -> Self {
        TaxEngine { slabs }
    }

    pub fn slabs(&self) -> &SlabTable {
        &self.slabs
    }

    /// Compute GST for a single line item priced at `price`.
    ///
    /// - Inclusive: `base = price / (1 + rate/100)`, `tax = price - base`
    /// - Exclusive: `tax = price * rate/100`, stored price becomes `price + tax`
    pub fn compute_item_tax(
        &self,
        price: Decimal,
        rate: Decimal,
        mode: TaxMode,
        supply: Supply,
    ) -> Result<ItemTax, TaxError> {
        let split = self.split(price, rate, mode, supply)?;
        log::debug!(
            "item tax: price {} @ {}% {:?}/{:?} -> base {}, tax {}",
            price,
            rate,
            mode,
            supply,
            split.base,
            split.breakdown.total_gst
        );
        Ok(ItemTax {
            rate,
            mode,
            supply,
            base_price: split.base,
            total_tax: split.breakdown.total_gst,
            cgst: split.breakdown.cgst,
            sgst: split.breakdown.sgst,
            igst: split.breakdown.igst,
            price: split.inclusive,
        })
    }

    /// Same arithmetic as [`TaxEngine::compute_item_tax`], applied to a document total.
    pub fn compute_document_tax(
        &self,
        total_amount: Decimal,
        rate: Decimal,
        mode: TaxMode,
        supply: Supply,
    ) -> Result<DocumentTax, TaxError> {
        let split = self.split(total_amount, rate, mode, supply)?;
        log::debug!(
            "document tax: total {} @ {}% {:?}/{:?} -> {:?}",
            total_amount,
            rate,
            mode,
            supply,
            split.breakdown
        );
        Ok(DocumentTax {
            rate,
            mode,
            supply,
            base_amount: split.base,
            breakdown: split.breakdown,
            total_amount: split.inclusive,
        })
    }

    fn split(
        &self,
        amount: Decimal,
        rate: Decimal,
        mode: TaxMode,
        supply: Supply,
    ) -> Result<Split, TaxError> {
        if amount <= Decimal::ZERO {
            return Err(TaxError::InvalidPrice(amount));
        }
        if amount > MAX_AMOUNT {
            return Err(TaxError::AmountTooLarge(amount));
        }
        let rate = self.slabs.check(rate)?;
        let fraction = rate / dec!(100);
        let too_large = || TaxError::AmountTooLarge(amount);

        let (base, total_tax) = match mode {
            TaxMode::Inclusive => {
                let base = amount
                    .checked_div(Decimal::ONE + fraction)
                    .ok_or_else(too_large)?
                    .round_dp(INTERNAL_DP);
                (base, amount - base)
            }
            TaxMode::Exclusive => (amount, amount.checked_mul(fraction).ok_or_else(too_large)?),
        };

        let breakdown = match supply {
            Supply::IntraState => {
                let half = total_tax / dec!(2);
                GstBreakdown::new(half, half, Decimal::ZERO)
            }
            Supply::InterState => GstBreakdown::new(Decimal::ZERO, Decimal::ZERO, total_tax),
        };

        Ok(Split {
            base,
            inclusive: base.checked_add(total_tax).ok_or_else(too_large)?,
            breakdown,
        })
    }
}

struct Split {
    base: Decimal,
    inclusive: Decimal,
    breakdown: GstBreakdown,
}
