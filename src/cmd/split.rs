//! Split command - divide a bill evenly between participants

use super::print_table;
use crate::config::Settings;
use crate::core::money::{format_inr, round_money};
use crate::core::{split_evenly, SplitResult};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct SplitCommand {
    /// Bill total in rupees
    #[arg(short, long, allow_negative_numbers = true)]
    amount: Decimal,

    /// Number of people sharing the bill
    #[arg(short, long)]
    people: u32,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct SplitOutput {
    total_amount: String,
    participant_count: u32,
    /// Full precision share
    per_person_share: String,
    rounded_share: String,
    allocations: Vec<String>,
}

#[derive(Debug, Tabled)]
struct AllocationRow {
    #[tabled(rename = "Person")]
    person: usize,
    #[tabled(rename = "Pays")]
    pays: String,
}

impl SplitCommand {
    pub fn exec(&self, settings: &Settings) -> anyhow::Result<()> {
        let split = split_evenly(self.amount, self.people, settings.max_participants)?;
        if self.json {
            self.print_json(&split)
        } else {
            self.print_text(&split);
            Ok(())
        }
    }

    fn print_text(&self, split: &SplitResult) {
        println!();
        println!(
            "SPLIT {} between {} people",
            format_inr(split.total_amount),
            split.participant_count
        );
        println!("  Each person pays: {}", format_inr(split.rounded_share()));
        println!();

        let rows: Vec<AllocationRow> = split
            .allocations()
            .into_iter()
            .enumerate()
            .map(|(i, pays)| AllocationRow {
                person: i + 1,
                pays: format_inr(pays),
            })
            .collect();
        print_table(&rows);
    }

    fn print_json(&self, split: &SplitResult) -> anyhow::Result<()> {
        let output = SplitOutput {
            total_amount: format!("{:.2}", round_money(split.total_amount)),
            participant_count: split.participant_count,
            per_person_share: split.per_person_share.normalize().to_string(),
            rounded_share: format!("{:.2}", split.rounded_share()),
            allocations: split
                .allocations()
                .iter()
                .map(|a: &Decimal| format!("{:.2}", a))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
