//! Item command - GST for a single line item

use super::{print_table, supply, FigureRow, ModeArg};
use crate::config::Settings;
use crate::core::money::{format_inr, format_rate, round_money};
use crate::core::{ItemTax, Supply, TaxMode};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ItemCommand {
    /// Item price in rupees
    #[arg(short, long, allow_negative_numbers = true)]
    price: Decimal,

    /// GST rate in percent (must be a configured slab)
    #[arg(short, long)]
    rate: Decimal,

    /// Whether the price already includes GST
    #[arg(short, long, value_enum, default_value_t = ModeArg::Inclusive)]
    mode: ModeArg,

    /// Inter-state supply: all tax is IGST
    #[arg(long)]
    inter_state: bool,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Item tax for JSON output, rounded to paise
#[derive(Debug, Serialize)]
struct ItemOutput {
    rate: String,
    mode: TaxMode,
    supply: Supply,
    base_price: String,
    cgst: String,
    sgst: String,
    igst: String,
    total_gst: String,
    price: String,
}

impl From<&ItemTax> for ItemOutput {
    fn from(tax: &ItemTax) -> Self {
        ItemOutput {
            rate: tax.rate.normalize().to_string(),
            mode: tax.mode,
            supply: tax.supply,
            base_price: format!("{:.2}", round_money(tax.base_price)),
            cgst: format!("{:.2}", round_money(tax.cgst)),
            sgst: format!("{:.2}", round_money(tax.sgst)),
            igst: format!("{:.2}", round_money(tax.igst)),
            total_gst: format!("{:.2}", round_money(tax.total_tax)),
            price: format!("{:.2}", round_money(tax.price)),
        }
    }
}

impl ItemCommand {
    pub fn exec(&self, settings: &Settings) -> anyhow::Result<()> {
        let engine = settings.engine();
        let tax = engine.compute_item_tax(
            self.price,
            self.rate,
            self.mode.into(),
            supply(self.inter_state),
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ItemOutput::from(&tax))?);
        } else {
            print_table(&item_rows(&tax));
        }
        Ok(())
    }
}

pub(crate) fn item_rows(tax: &ItemTax) -> Vec<FigureRow> {
    let mut rows = vec![FigureRow::new("Base price", format_inr(tax.base_price))];
    match tax.supply {
        Supply::IntraState => {
            let half = format_rate(tax.rate / Decimal::TWO);
            rows.push(FigureRow::new(format!("CGST @ {half}"), format_inr(tax.cgst)));
            rows.push(FigureRow::new(format!("SGST @ {half}"), format_inr(tax.sgst)));
        }
        Supply::InterState => {
            rows.push(FigureRow::new(
                format!("IGST @ {}", format_rate(tax.rate)),
                format_inr(tax.igst),
            ));
        }
    }
    rows.push(FigureRow::new("Total GST", format_inr(tax.total_tax)));
    rows.push(FigureRow::new("Price incl. GST", format_inr(tax.price)));
    rows
}
