use super::error::TaxError;
use super::gst::{DocumentTax, GstBreakdown, ItemTax, Supply, TaxEngine, TaxKind, TaxMode};
use super::money::round_money;
use super::warnings::Warning;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where an expense was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseSource {
    #[default]
    Manual,
    Sms,
    Receipt,
    Pdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Upi,
    Card,
    Cash,
    #[default]
    #[serde(other)]
    Manual,
}

/// How the draft's total amount was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TotalSource {
    /// Typed in or extracted as a single figure; left alone by item edits
    #[default]
    Entered,
    /// Sum of line item prices plus document tax lines; follows item edits
    LineItems,
}

/// A priced entry on the expense. Once tax is applied `price` is tax-inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineItem {
    pub name: String,
    #[schemars(with = "f64")]
    pub price: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub cgst: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub sgst: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub igst: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub gst_rate: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        LineItem {
            name: name.into(),
            price,
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst: Decimal::ZERO,
            gst_rate: Decimal::ZERO,
        }
    }

    pub fn breakdown(&self) -> GstBreakdown {
        GstBreakdown::new(self.cgst, self.sgst, self.igst)
    }
}

/// A document level tax figure not attached to any goods line, e.g. a
/// "CGST @9%" row that was extracted as an item and then reclassified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxLine {
    pub name: String,
    pub kind: TaxKind,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

/// The expense being composed. Tax related fields are only changed through
/// the operations below, each of which returns a new draft and leaves `self`
/// untouched on error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseDraft {
    #[schemars(with = "f64")]
    amount: Decimal,
    #[serde(default)]
    total_source: TotalSource,
    pub category: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub source: ExpenseSource,
    /// Free text item descriptions as extracted
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    line_items: Vec<LineItem>,
    #[serde(default)]
    tax_lines: Vec<TaxLine>,
    #[serde(default)]
    document_tax: Option<DocumentTax>,
    /// Tax figure reported by the parser, kept for comparison
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_type: Option<String>,
}

fn default_currency() -> String {
    "INR".to_string()
}

impl ExpenseDraft {
    /// Draft with an entered total and no line items.
    pub fn new(category: impl Into<String>, amount: Decimal) -> Self {
        ExpenseDraft {
            amount,
            total_source: TotalSource::Entered,
            category: category.into(),
            vendor: None,
            description: None,
            date: None,
            payment_mode: PaymentMode::default(),
            currency: default_currency(),
            source: ExpenseSource::default(),
            items: Vec::new(),
            line_items: Vec::new(),
            tax_lines: Vec::new(),
            document_tax: None,
            tax_amount: None,
            tax_type: None,
        }
    }

    /// Draft whose total is the sum of `line_items`.
    pub fn from_line_items(category: impl Into<String>, line_items: Vec<LineItem>) -> Self {
        let mut draft = ExpenseDraft::new(category, Decimal::ZERO);
        draft.line_items = line_items;
        draft.total_source = TotalSource::LineItems;
        draft.sync_total();
        draft
    }

    /// Attach line items while keeping an entered total.
    pub fn with_line_items(mut self, line_items: Vec<LineItem>) -> Self {
        self.line_items = line_items;
        self.sync_total();
        self
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn total_source(&self) -> TotalSource {
        self.total_source
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn tax_lines(&self) -> &[TaxLine] {
        &self.tax_lines
    }

    pub fn document_tax(&self) -> Option<&DocumentTax> {
        self.document_tax.as_ref()
    }

    /// The part of the total that whole-document tax is charged on: the
    /// total less reclassified tax lines, and less document tax that was
    /// added on top of it.
    pub fn taxable_amount(&self) -> Decimal {
        let amount = self.amount - self.tax_line_total();
        match &self.document_tax {
            Some(tax) if tax.mode == TaxMode::Exclusive => amount - tax.breakdown.total_gst,
            _ => amount,
        }
    }

    pub fn line_item_total(&self) -> Decimal {
        self.line_items.iter().map(|i| i.price).sum()
    }

    fn tax_line_total(&self) -> Decimal {
        self.tax_lines.iter().map(|t| t.amount).sum()
    }

    /// Document GST, recomputed from scratch on every call: line items, then
    /// document tax lines, then any whole-document tax.
    pub fn breakdown(&self) -> GstBreakdown {
        let items: GstBreakdown = self.line_items.iter().map(LineItem::breakdown).sum();
        let lines: GstBreakdown = self
            .tax_lines
            .iter()
            .map(|t| GstBreakdown::of_kind(t.kind, t.amount))
            .sum();
        let document = self.document_tax.map(|d| d.breakdown).unwrap_or_default();
        items + lines + document
    }

    /// Set a line item's tax fields and tax-inclusive price.
    ///
    /// Applying the same `tax` twice gives the same draft: fields are
    /// overwritten, never accumulated.
    pub fn apply_item_tax(&self, index: usize, tax: &ItemTax) -> Result<ExpenseDraft, TaxError> {
        let mut draft = self.clone();
        let item = draft.item_mut(index)?;
        item.cgst = tax.cgst;
        item.sgst = tax.sgst;
        item.igst = tax.igst;
        item.gst_rate = tax.rate;
        item.price = tax.price;
        log::debug!("applied {}% GST to line {} ({})", tax.rate, index, item.name);

        if tax.mode == TaxMode::Exclusive {
            draft.total_source = TotalSource::LineItems;
        }
        draft.sync_total();
        draft.verify()?;
        Ok(draft)
    }

    /// Compute and apply tax to every line item from its current price.
    pub fn apply_rate_to_all(
        &self,
        engine: &TaxEngine,
        rate: Decimal,
        mode: TaxMode,
        supply: Supply,
    ) -> Result<ExpenseDraft, TaxError> {
        let mut draft = self.clone();
        for index in 0..self.line_items.len() {
            let price = self.line_items[index].price;
            let tax = engine.compute_item_tax(price, rate, mode, supply)?;
            draft = draft.apply_item_tax(index, &tax)?;
        }
        Ok(draft)
    }

    /// Move a mis-extracted item into the tax bucket as `kind`. The item's
    /// full price becomes tax and the document total does not change.
    pub fn reclassify_as_tax_line(
        &self,
        index: usize,
        kind: TaxKind,
    ) -> Result<ExpenseDraft, TaxError> {
        let mut draft = self.clone();
        draft.item_mut(index)?;
        let item = draft.line_items.remove(index);
        log::debug!("reclassified line {} ({}) as {} {}", index, item.name, kind, item.price);
        draft.tax_lines.push(TaxLine {
            name: item.name,
            kind,
            amount: item.price,
        });
        draft.sync_total();
        draft.verify()?;
        Ok(draft)
    }

    /// Drop a line item together with its tax.
    pub fn remove_line_item(&self, index: usize) -> Result<ExpenseDraft, TaxError> {
        let mut draft = self.clone();
        draft.item_mut(index)?;
        draft.line_items.remove(index);
        draft.sync_total();
        draft.verify()?;
        Ok(draft)
    }

    /// Record whole-document tax on a draft without line items. `tax` must
    /// have been computed on [`ExpenseDraft::taxable_amount`]; tax lines stay
    /// on top of it. Exclusive mode raises the total to include the tax.
    pub fn apply_document_tax(&self, tax: &DocumentTax) -> Result<ExpenseDraft, TaxError> {
        if !self.line_items.is_empty() {
            return Err(TaxError::ItemizedDraft(self.line_items.len()));
        }
        let taxable = self.taxable_amount();
        let charged_on = match tax.mode {
            TaxMode::Inclusive => tax.total_amount,
            TaxMode::Exclusive => tax.base_amount,
        };
        if charged_on != taxable {
            return Err(TaxError::InconsistentBreakdown(format!(
                "document tax charged on {} but taxable amount is {}",
                charged_on, taxable
            )));
        }
        let mut draft = self.clone();
        draft.document_tax = Some(*tax);
        draft.amount = tax.total_amount + self.tax_line_total();
        draft.total_source = TotalSource::Entered;
        draft.verify()?;
        Ok(draft)
    }

    /// Compute and apply whole-document tax on the taxable amount.
    pub fn apply_document_rate(
        &self,
        engine: &TaxEngine,
        rate: Decimal,
        mode: TaxMode,
        supply: Supply,
    ) -> Result<ExpenseDraft, TaxError> {
        if !self.line_items.is_empty() {
            return Err(TaxError::ItemizedDraft(self.line_items.len()));
        }
        let tax = engine.compute_document_tax(self.taxable_amount(), rate, mode, supply)?;
        self.apply_document_tax(&tax)
    }

    /// Check the invariants that every operation preserves.
    pub fn verify(&self) -> Result<(), TaxError> {
        let breakdown = self.breakdown();
        breakdown.verify()?;

        let parts = self.line_items.iter().map(|i| i.cgst + i.sgst + i.igst).sum::<Decimal>()
            + self.tax_line_total()
            + self.document_tax.map_or(Decimal::ZERO, |d| d.breakdown.total_gst);
        if parts != breakdown.total_gst {
            return Err(TaxError::InconsistentBreakdown(format!(
                "component sum {} != total {}",
                parts, breakdown.total_gst
            )));
        }

        if self.total_source == TotalSource::LineItems {
            let expected = self.line_item_total() + self.tax_line_total();
            if expected != self.amount {
                return Err(TaxError::InconsistentBreakdown(format!(
                    "amount {} != line item total {}",
                    self.amount, expected
                )));
            }
        }
        Ok(())
    }

    /// Non-blocking data quality checks.
    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let breakdown = self.breakdown();

        if self.total_source == TotalSource::Entered && !self.line_items.is_empty() {
            let items = self.line_item_total() + self.tax_line_total();
            if round_money(items) != round_money(self.amount) {
                warnings.push(Warning::TotalMismatch {
                    amount: self.amount,
                    line_item_total: items,
                });
            }
        }

        if let Some(extracted) = self.tax_amount {
            if !extracted.is_zero()
                && !breakdown.is_zero()
                && (extracted - breakdown.total_gst).abs() > dec!(0.01)
            {
                warnings.push(Warning::TaxAmountMismatch {
                    extracted,
                    computed: breakdown.total_gst,
                });
            }
        }
        warnings
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut LineItem, TaxError> {
        let len = self.line_items.len();
        self.line_items
            .get_mut(index)
            .ok_or(TaxError::ItemOutOfRange { index, len })
    }

    fn sync_total(&mut self) {
        if self.total_source == TotalSource::LineItems {
            self.amount = self.line_item_total() + self.tax_line_total();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gst::tests::engine;

    fn groceries() -> ExpenseDraft {
        ExpenseDraft::from_line_items(
            "Groceries",
            vec![
                LineItem::new("Rice", dec!(118)),
                LineItem::new("Dal", dec!(236)),
                LineItem::new("CGST @9%", dec!(45)),
            ],
        )
    }

    fn item_tax(price: Decimal, mode: TaxMode) -> ItemTax {
        engine()
            .compute_item_tax(price, dec!(18), mode, Supply::IntraState)
            .unwrap()
    }

    fn assert_aggregates(draft: &ExpenseDraft) {
        let b = draft.breakdown();
        assert_eq!(b.total_gst, b.cgst + b.sgst + b.igst);
        let items: Decimal = draft
            .line_items()
            .iter()
            .map(|i| i.cgst + i.sgst + i.igst)
            .sum();
        let lines: Decimal = draft.tax_lines().iter().map(|t| t.amount).sum();
        assert_eq!(b.total_gst, items + lines);
        assert!(draft.verify().is_ok());
    }

    #[test]
    fn total_follows_line_items() {
        let draft = groceries();
        assert_eq!(draft.amount(), dec!(399));
        assert_eq!(draft.total_source(), TotalSource::LineItems);
        assert!(draft.breakdown().is_zero());
    }

    #[test]
    fn inclusive_apply_keeps_price() {
        let draft = groceries()
            .apply_item_tax(0, &item_tax(dec!(118), TaxMode::Inclusive))
            .unwrap();
        let rice = &draft.line_items()[0];
        assert_eq!(rice.price, dec!(118));
        assert_eq!(rice.cgst, dec!(9));
        assert_eq!(rice.gst_rate, dec!(18));
        assert_eq!(draft.breakdown(), GstBreakdown::new(dec!(9), dec!(9), dec!(0)));
        assert_eq!(draft.amount(), dec!(399));
        assert_aggregates(&draft);
    }

    #[test]
    fn exclusive_apply_raises_price_and_total() {
        let draft = ExpenseDraft::new("Shopping", dec!(100))
            .with_line_items(vec![LineItem::new("Shirt", dec!(100))]);
        assert_eq!(draft.total_source(), TotalSource::Entered);

        let draft = draft
            .apply_item_tax(0, &item_tax(dec!(100), TaxMode::Exclusive))
            .unwrap();
        assert_eq!(draft.line_items()[0].price, dec!(118));
        assert_eq!(draft.total_source(), TotalSource::LineItems);
        assert_eq!(draft.amount(), dec!(118));
        assert_eq!(draft.breakdown().total_gst, dec!(18));
        assert_aggregates(&draft);
    }

    #[test]
    fn apply_is_idempotent() {
        let tax = item_tax(dec!(236), TaxMode::Exclusive);
        let once = groceries().apply_item_tax(1, &tax).unwrap();
        let twice = once.apply_item_tax(1, &tax).unwrap();
        assert_eq!(once.breakdown(), twice.breakdown());
        assert_eq!(once, twice);
    }

    #[test]
    fn reclassify_moves_price_into_tax() {
        let draft = groceries()
            .apply_item_tax(0, &item_tax(dec!(118), TaxMode::Inclusive))
            .unwrap();
        let before = draft.breakdown();

        let after = draft.reclassify_as_tax_line(2, TaxKind::Cgst).unwrap();
        assert_eq!(after.line_items().len(), 2);
        assert_eq!(after.breakdown().cgst, before.cgst + dec!(45));
        assert_eq!(after.breakdown().total_gst, before.total_gst + dec!(45));
        assert_eq!(after.amount(), draft.amount());
        assert_eq!(after.tax_lines()[0].name, "CGST @9%");
        assert_aggregates(&after);
    }

    #[test]
    fn reclassify_conserves_entered_total() {
        let draft = ExpenseDraft::new("Food Delivery", dec!(545)).with_line_items(vec![
            LineItem::new("Thali", dec!(500)),
            LineItem::new("IGST", dec!(45)),
        ]);
        let after = draft.reclassify_as_tax_line(1, TaxKind::Igst).unwrap();
        assert_eq!(after.amount(), dec!(545));
        assert_eq!(after.breakdown().igst, dec!(45));
        assert!(after.warnings().is_empty());
    }

    #[test]
    fn tax_lines_survive_later_recompute() {
        let draft = groceries().reclassify_as_tax_line(2, TaxKind::Cgst).unwrap();
        let draft = draft
            .apply_rate_to_all(&engine(), dec!(18), TaxMode::Inclusive, Supply::IntraState)
            .unwrap();
        // 118 -> 18, 236 -> 36, plus the reclassified 45
        assert_eq!(draft.breakdown().total_gst, dec!(99));
        assert_eq!(draft.breakdown().cgst, dec!(72));
        assert_eq!(draft.amount(), dec!(399));
        assert_aggregates(&draft);
    }

    #[test]
    fn apply_rate_to_all_exclusive() {
        let draft = ExpenseDraft::from_line_items(
            "Transport",
            vec![LineItem::new("Cab", dec!(100)), LineItem::new("Toll", dec!(50))],
        );
        let draft = draft
            .apply_rate_to_all(&engine(), dec!(5), TaxMode::Exclusive, Supply::InterState)
            .unwrap();
        assert_eq!(draft.amount(), dec!(157.5));
        assert_eq!(draft.breakdown().igst, dec!(7.5));
        assert_aggregates(&draft);
    }

    #[test]
    fn failed_operation_leaves_draft_untouched() {
        let draft = groceries();
        let err = draft
            .apply_rate_to_all(&engine(), dec!(12), TaxMode::Inclusive, Supply::IntraState)
            .unwrap_err();
        assert_eq!(err, TaxError::InvalidRate(dec!(12)));
        assert_eq!(draft, groceries());
    }

    #[test]
    fn out_of_range_index() {
        let draft = groceries();
        assert_eq!(
            draft.reclassify_as_tax_line(3, TaxKind::Sgst).unwrap_err(),
            TaxError::ItemOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(
            draft
                .apply_item_tax(7, &item_tax(dec!(1), TaxMode::Inclusive))
                .unwrap_err(),
            TaxError::ItemOutOfRange { index: 7, len: 3 }
        );
    }

    #[test]
    fn remove_line_item_drops_its_tax() {
        let draft = groceries()
            .apply_item_tax(0, &item_tax(dec!(118), TaxMode::Inclusive))
            .unwrap()
            .remove_line_item(0)
            .unwrap();
        assert!(draft.breakdown().is_zero());
        assert_eq!(draft.amount(), dec!(281));
    }

    #[test]
    fn document_tax_on_unitemised_draft() {
        let draft = ExpenseDraft::new("Bills & Utilities", dec!(1000));
        let tax = engine()
            .compute_document_tax(draft.amount(), dec!(18), TaxMode::Exclusive, Supply::IntraState)
            .unwrap();
        let draft = draft.apply_document_tax(&tax).unwrap();
        assert_eq!(draft.amount(), dec!(1180));
        assert_eq!(draft.breakdown(), GstBreakdown::new(dec!(90), dec!(90), dec!(0)));
    }

    #[test]
    fn document_tax_excludes_reclassified_tax_lines() {
        let draft = ExpenseDraft::new("Food Delivery", dec!(545))
            .with_line_items(vec![
                LineItem::new("Thali", dec!(500)),
                LineItem::new("CGST", dec!(45)),
            ])
            .reclassify_as_tax_line(1, TaxKind::Cgst)
            .unwrap()
            .remove_line_item(0)
            .unwrap();
        assert_eq!(draft.taxable_amount(), dec!(500));

        let taxed = draft
            .apply_document_rate(&engine(), dec!(18), TaxMode::Inclusive, Supply::IntraState)
            .unwrap();
        let document = taxed.document_tax().unwrap();
        assert_eq!(document.total_amount, dec!(500));
        assert_eq!(round_money(document.breakdown.total_gst), dec!(76.27));
        assert_eq!(
            taxed.breakdown().total_gst,
            dec!(45) + document.breakdown.total_gst
        );
        assert_eq!(round_money(taxed.breakdown().total_gst), dec!(121.27));
        assert_eq!(taxed.amount(), dec!(545));
        assert_aggregates(&taxed);

        // Tax charged on the gross total would count the CGST line twice
        let gross = engine()
            .compute_document_tax(dec!(545), dec!(18), TaxMode::Inclusive, Supply::IntraState)
            .unwrap();
        assert!(matches!(
            draft.apply_document_tax(&gross),
            Err(TaxError::InconsistentBreakdown(_))
        ));
    }

    #[test]
    fn exclusive_document_tax_keeps_tax_lines_on_top() {
        let draft = ExpenseDraft::new("Transport", dec!(110))
            .with_line_items(vec![LineItem::new("Cab", dec!(100)), LineItem::new("IGST", dec!(10))])
            .reclassify_as_tax_line(1, TaxKind::Igst)
            .unwrap()
            .remove_line_item(0)
            .unwrap();

        let once = draft
            .apply_document_rate(&engine(), dec!(5), TaxMode::Exclusive, Supply::InterState)
            .unwrap();
        assert_eq!(once.amount(), dec!(115));
        assert_eq!(once.breakdown().igst, dec!(15));
        assert_eq!(once.taxable_amount(), dec!(100));
        assert_aggregates(&once);

        let twice = once
            .apply_document_rate(&engine(), dec!(5), TaxMode::Exclusive, Supply::InterState)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn document_rate_is_idempotent() {
        let draft = ExpenseDraft::new("Bills & Utilities", dec!(1000));
        let once = draft
            .apply_document_rate(&engine(), dec!(18), TaxMode::Exclusive, Supply::IntraState)
            .unwrap();
        let twice = once
            .apply_document_rate(&engine(), dec!(18), TaxMode::Exclusive, Supply::IntraState)
            .unwrap();
        assert_eq!(once.amount(), dec!(1180));
        assert_eq!(once, twice);
    }

    #[test]
    fn document_tax_rejected_when_itemised() {
        let tax = engine()
            .compute_document_tax(dec!(399), dec!(18), TaxMode::Inclusive, Supply::IntraState)
            .unwrap();
        assert_eq!(
            groceries().apply_document_tax(&tax).unwrap_err(),
            TaxError::ItemizedDraft(3)
        );
    }

    #[test]
    fn warns_on_mismatched_totals() {
        let mut draft = ExpenseDraft::new("Shopping", dec!(500))
            .with_line_items(vec![LineItem::new("Shoes", dec!(472))]);
        draft.tax_amount = Some(dec!(50));
        let draft = draft
            .apply_item_tax(0, &item_tax(dec!(472), TaxMode::Inclusive))
            .unwrap();

        let warnings = draft.warnings();
        assert!(warnings.contains(&Warning::TotalMismatch {
            amount: dec!(500),
            line_item_total: dec!(472),
        }));
        assert!(warnings.contains(&Warning::TaxAmountMismatch {
            extracted: dec!(50),
            computed: dec!(72),
        }));
    }
}
