//! Expense document in the shape accepted by the persistence API.

use super::draft::{ExpenseDraft, ExpenseSource, LineItem, PaymentMode};
use super::gst::GstBreakdown;
use super::money::round_money;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct GstDetails {
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub cgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub sgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub igst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub total_gst: Decimal,
}

impl From<GstBreakdown> for GstDetails {
    fn from(b: GstBreakdown) -> Self {
        // Components are rounded independently; the total is their sum so
        // the persisted figures stay self-consistent.
        let cgst = round_money(b.cgst);
        let sgst = round_money(b.sgst);
        let igst = round_money(b.igst);
        GstDetails {
            cgst,
            sgst,
            igst,
            total_gst: cgst + sgst + igst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentLineItem {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub cgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub sgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub igst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub gst_rate: Decimal,
}

impl From<&LineItem> for DocumentLineItem {
    fn from(item: &LineItem) -> Self {
        DocumentLineItem {
            name: item.name.clone(),
            price: round_money(item.price),
            cgst: round_money(item.cgst),
            sgst: round_money(item.sgst),
            igst: round_money(item.igst),
            gst_rate: item.gst_rate.normalize(),
        }
    }
}

/// Immutable snapshot of a draft, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseDocument {
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub payment_mode: PaymentMode,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schemars(with = "Option<f64>")]
    pub tax_amount: Option<Decimal>,
    pub tax_type: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub items: Vec<String>,
    pub line_items: Vec<DocumentLineItem>,
    pub gst_details: Option<GstDetails>,
    pub source: ExpenseSource,
    pub currency: String,
}

impl ExpenseDocument {
    pub fn from_draft(draft: &ExpenseDraft) -> Self {
        let breakdown = draft.breakdown();
        let gst_details = (!breakdown.is_zero()).then(|| GstDetails::from(breakdown));

        // A computed breakdown supersedes the parser's tax figure.
        let (tax_amount, tax_type) = match &gst_details {
            Some(details) => (Some(details.total_gst), Some("GST".to_string())),
            None => (draft.tax_amount.map(round_money), draft.tax_type.clone()),
        };

        ExpenseDocument {
            amount: round_money(draft.amount()),
            date: draft.date,
            category: draft.category.clone(),
            payment_mode: draft.payment_mode,
            tax_amount,
            tax_type,
            description: draft.description.clone(),
            vendor: draft.vendor.clone(),
            items: draft.items.clone(),
            line_items: draft.line_items().iter().map(DocumentLineItem::from).collect(),
            gst_details,
            source: draft.source,
            currency: draft.currency.clone(),
        }
    }
}
