//! Corrections a user made to parser output, recorded per vendor so the
//! parser can learn from them.

use super::document::ExpenseDocument;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Correction {
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub original: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub corrected: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Discrepancies {
    /// Upper-cased vendor name
    pub vendor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Correction>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub gst_details: BTreeMap<String, Correction>,
}

/// Compare the document as first seeded from the parser with the one the
/// user is submitting. Returns `None` when nothing changed or the vendor is
/// unknown, since corrections are keyed by vendor.
///
/// GST fields are only compared when the parser reported `gst_details`; a
/// corrected document without them counts as zero tax.
pub fn discrepancies(original: &ExpenseDocument, corrected: &ExpenseDocument) -> Option<Discrepancies> {
    let vendor = corrected
        .vendor
        .as_deref()
        .or(original.vendor.as_deref())?
        .trim()
        .to_uppercase();
    if vendor.is_empty() {
        return None;
    }

    let amount = (original.amount != corrected.amount).then_some(Correction {
        original: original.amount,
        corrected: corrected.amount,
    });

    let mut gst_details = BTreeMap::new();
    if let Some(before) = original.gst_details {
        let after = corrected.gst_details.unwrap_or_default();
        for (name, before, after) in [
            ("cgst", before.cgst, after.cgst),
            ("sgst", before.sgst, after.sgst),
            ("igst", before.igst, after.igst),
            ("total_gst", before.total_gst, after.total_gst),
        ] {
            if before != after {
                gst_details.insert(
                    name.to_string(),
                    Correction {
                        original: before,
                        corrected: after,
                    },
                );
            }
        }
    }

    if amount.is_none() && gst_details.is_empty() {
        return None;
    }
    log::info!(
        "recorded {} correction(s) for {}",
        gst_details.len() + usize::from(amount.is_some()),
        vendor
    );
    Some(Discrepancies {
        vendor,
        amount,
        gst_details,
    })
}
