//! Document command - GST over a whole bill when there is no itemisation

use super::{print_table, supply, FigureRow, ModeArg};
use crate::config::Settings;
use crate::core::money::{format_inr, format_rate, round_money};
use crate::core::{DocumentTax, GstDetails, Supply, TaxMode};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct DocumentCommand {
    /// Document total in rupees
    #[arg(short, long, allow_negative_numbers = true)]
    amount: Decimal,

    /// GST rate in percent (must be a configured slab)
    #[arg(short, long)]
    rate: Decimal,

    /// Whether the total already includes GST
    #[arg(short, long, value_enum, default_value_t = ModeArg::Inclusive)]
    mode: ModeArg,

    /// Inter-state supply: all tax is IGST
    #[arg(long)]
    inter_state: bool,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DocumentOutput {
    rate: String,
    mode: TaxMode,
    supply: Supply,
    base_amount: String,
    total_amount: String,
    gst_details: GstDetails,
}

impl DocumentCommand {
    pub fn exec(&self, settings: &Settings) -> anyhow::Result<()> {
        let tax = settings.engine().compute_document_tax(
            self.amount,
            self.rate,
            self.mode.into(),
            supply(self.inter_state),
        )?;
        log::info!(
            "Document total {} -> {} ({} GST)",
            self.amount,
            tax.total_amount,
            tax.breakdown.total_gst
        );

        if self.json {
            let output = DocumentOutput {
                rate: tax.rate.normalize().to_string(),
                mode: tax.mode,
                supply: tax.supply,
                base_amount: format!("{:.2}", round_money(tax.base_amount)),
                total_amount: format!("{:.2}", round_money(tax.total_amount)),
                gst_details: tax.breakdown.into(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_table(&document_rows(&tax));
        }
        Ok(())
    }
}

fn document_rows(tax: &DocumentTax) -> Vec<FigureRow> {
    let b = &tax.breakdown;
    let mut rows = vec![FigureRow::new("Taxable value", format_inr(tax.base_amount))];
    if tax.supply == Supply::InterState {
        rows.push(FigureRow::new(
            format!("IGST @ {}", format_rate(tax.rate)),
            format_inr(b.igst),
        ));
    } else {
        let half = format_rate(tax.rate / Decimal::TWO);
        rows.push(FigureRow::new(format!("CGST @ {half}"), format_inr(b.cgst)));
        rows.push(FigureRow::new(format!("SGST @ {half}"), format_inr(b.sgst)));
    }
    rows.push(FigureRow::new("Total GST", format_inr(b.total_gst)));
    rows.push(FigureRow::new("Document total", format_inr(tax.total_amount)));
    rows
}
