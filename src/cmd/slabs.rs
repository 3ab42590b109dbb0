//! Slabs command - configured GST slabs and category defaults

use super::print_table;
use crate::config::Settings;
use crate::core::money::format_rate;
use clap::Args;
use rust_decimal::Decimal;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct SlabsCommand {
    /// Output the effective settings as JSON (usable as a `--config` file)
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Tabled)]
struct SlabRow {
    #[tabled(rename = "Slab")]
    label: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "CGST / SGST")]
    half: String,
}

#[derive(Debug, Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Default rate")]
    rate: String,
}

impl SlabsCommand {
    pub fn exec(&self, settings: &Settings) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(settings)?);
            return Ok(());
        }

        println!();
        println!("GST SLABS");
        println!();
        let table = settings.slab_table();
        let rows: Vec<SlabRow> = table
            .slabs()
            .iter()
            .map(|slab| SlabRow {
                label: slab.label.clone(),
                rate: format_rate(slab.rate),
                half: format_rate(slab.rate / Decimal::TWO),
            })
            .collect();
        print_table(&rows);

        if !table.category_defaults().is_empty() {
            println!();
            println!("CATEGORY DEFAULTS");
            println!();
            let rows: Vec<CategoryRow> = table
                .category_defaults()
                .iter()
                .map(|(category, rate)| CategoryRow {
                    category: category.clone(),
                    rate: format_rate(*rate),
                })
                .collect();
            print_table(&rows);
        }

        println!();
        println!("Bills split between at most {} people", settings.max_participants);
        Ok(())
    }
}
