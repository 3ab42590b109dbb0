//! Structured fields returned by the receipt/SMS/PDF parsing service, and
//! their validation into an [`ExpenseDraft`].

use super::document::GstDetails;
use super::draft::{ExpenseDraft, ExpenseSource, LineItem, PaymentMode};
use super::gst::TaxKind;
use super::money::MAX_AMOUNT;
use super::warnings::Warning;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gstc_derive::CsvColumns;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("line item {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },
    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),
    #[error("{field} {amount} exceeds the supported maximum of {max}", max = MAX_AMOUNT)]
    AmountTooLarge { field: &'static str, amount: Decimal },
    #[error("receipt has neither an amount nor line items")]
    MissingAmount,
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("unknown tax kind '{kind}' on line item {index}")]
    InvalidTaxKind { index: usize, kind: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One column of a CSV input format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedLineItem {
    pub name: String,
    #[schemars(with = "f64")]
    pub price: Decimal,
}

/// Parser output. Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedReceipt {
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub line_items: Vec<ParsedLineItem>,
    #[serde(default)]
    pub payment_mode: Option<String>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_type: Option<String>,
    /// `YYYY-MM-DD` or an RFC3339 timestamp
    #[serde(default)]
    pub date: Option<String>,
    /// GST breakdown as printed, when the parser found one
    #[serde(default)]
    pub gst_details: Option<GstDetails>,
    #[serde(default)]
    pub source: Option<ExpenseSource>,
    /// Per-field confidence in 0.0..=1.0
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, f64>,
}

impl ParsedReceipt {
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<ParsedReceipt> {
        let receipt = serde_json::from_reader(reader)?;
        Ok(receipt)
    }

    /// Validate the payload and seed a draft from it.
    ///
    /// Without an `amount` the total is derived from line items and will
    /// follow later tax edits.
    pub fn into_draft(self, category: &str) -> Result<ExpenseDraft, PayloadError> {
        let line_items = self
            .line_items
            .iter()
            .enumerate()
            .map(|(index, item)| validate_line_item(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        let mut draft = match self.amount {
            Some(amount) if amount <= Decimal::ZERO => {
                return Err(PayloadError::InvalidAmount(amount))
            }
            Some(amount) if amount > MAX_AMOUNT => {
                return Err(PayloadError::AmountTooLarge {
                    field: "amount",
                    amount,
                })
            }
            Some(amount) => ExpenseDraft::new(category, amount).with_line_items(line_items),
            None if line_items.is_empty() => return Err(PayloadError::MissingAmount),
            None => ExpenseDraft::from_line_items(category, line_items),
        };

        if let Some(tax_amount) = self.tax_amount.filter(|t| t.abs() > MAX_AMOUNT) {
            return Err(PayloadError::AmountTooLarge {
                field: "tax_amount",
                amount: tax_amount,
            });
        }

        draft.date = self.date.as_deref().map(parse_date).transpose()?;
        draft.vendor = self.vendor;
        draft.description = self.description;
        draft.items = self.items;
        draft.payment_mode = self
            .payment_mode
            .as_deref()
            .map(parse_payment_mode)
            .unwrap_or_default();
        draft.source = self.source.unwrap_or(ExpenseSource::Receipt);
        draft.tax_amount = self.tax_amount;
        draft.tax_type = self.tax_type;

        log::debug!(
            "seeded draft: amount {}, {} line items",
            draft.amount(),
            draft.line_items().len()
        );
        Ok(draft)
    }

    /// Warnings about the payload itself, independent of any draft built from it.
    pub fn warnings(&self, confidence_threshold: f64) -> Vec<Warning> {
        let mut warnings: Vec<Warning> = self
            .confidence_scores
            .iter()
            .filter(|(_, score)| **score < confidence_threshold)
            .map(|(field, score)| Warning::LowConfidence {
                field: field.clone(),
                score_bp: (score.clamp(0.0, 1.0) * 10_000.0).round() as u32,
            })
            .collect();

        if let Some(tax_type) = &self.tax_type {
            if !tax_type.eq_ignore_ascii_case("GST") {
                warnings.push(Warning::UnknownTaxType {
                    tax_type: tax_type.clone(),
                });
            }
        }
        warnings
    }
}

fn validate_line_item(index: usize, item: &ParsedLineItem) -> Result<LineItem, PayloadError> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(PayloadError::InvalidLineItem {
            index,
            reason: "name is empty".to_string(),
        });
    }
    if item.price <= Decimal::ZERO {
        return Err(PayloadError::InvalidLineItem {
            index,
            reason: format!("price must be greater than zero, got {}", item.price),
        });
    }
    if item.price > MAX_AMOUNT {
        return Err(PayloadError::InvalidLineItem {
            index,
            reason: format!("price {} exceeds the supported maximum of {}", item.price, MAX_AMOUNT),
        });
    }
    Ok(LineItem::new(name, item.price))
}

fn parse_date(s: &str) -> Result<NaiveDate, PayloadError> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    Err(PayloadError::InvalidDate(s.to_string()))
}

fn parse_payment_mode(s: &str) -> PaymentMode {
    match s.to_lowercase().as_str() {
        "upi" => PaymentMode::Upi,
        "card" => PaymentMode::Card,
        "cash" => PaymentMode::Cash,
        _ => PaymentMode::Manual,
    }
}

/// Line item row for CSV input
#[derive(Debug, Clone, Serialize, Deserialize, CsvColumns)]
pub struct LineItemRecord {
    /// Item name as printed on the receipt
    pub name: String,
    /// Price in rupees
    pub price: Decimal,
    /// CGST, SGST or IGST if the row is a tax figure rather than goods
    #[serde(default)]
    pub tax_kind: Option<String>,
}

/// A CSV row after validation
#[derive(Debug, Clone, PartialEq)]
pub struct CsvLine {
    pub item: ParsedLineItem,
    pub tax_kind: Option<TaxKind>,
}

/// Read line items from CSV with a `name,price[,tax_kind]` header.
pub fn read_line_items_csv<R: Read>(reader: R) -> Result<Vec<CsvLine>, PayloadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut lines = Vec::new();
    for (index, record) in rdr.deserialize::<LineItemRecord>().enumerate() {
        let record = record?;
        let tax_kind = match record.tax_kind.as_deref().filter(|k| !k.is_empty()) {
            Some(kind) => Some(kind.parse::<TaxKind>().map_err(|_| {
                PayloadError::InvalidTaxKind {
                    index,
                    kind: kind.to_string(),
                }
            })?),
            None => None,
        };
        lines.push(CsvLine {
            item: ParsedLineItem {
                name: record.name,
                price: record.price,
            },
            tax_kind,
        });
    }
    log::info!("Read {} csv line items", lines.len());
    Ok(lines)
}
