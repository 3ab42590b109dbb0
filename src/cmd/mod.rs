pub mod document;
pub mod draft;
pub mod item;
pub mod schema;
pub mod slabs;
pub mod split;

use crate::core::{ParsedReceipt, Supply, TaxMode};
use clap::ValueEnum;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Read a parsed receipt (JSON) from a file, or stdin with "-"
pub fn read_receipt(path: &Path) -> anyhow::Result<ParsedReceipt> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path)?;
        ParsedReceipt::from_reader(BufReader::new(file))
    }
}

fn read_from_stdin() -> anyhow::Result<ParsedReceipt> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    ParsedReceipt::from_reader(io::Cursor::new(buffer))
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ModeArg {
    /// Price already includes GST
    #[default]
    Inclusive,
    /// GST is added on top of the price
    Exclusive,
}

impl From<ModeArg> for TaxMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Inclusive => TaxMode::Inclusive,
            ModeArg::Exclusive => TaxMode::Exclusive,
        }
    }
}

pub fn supply(inter_state: bool) -> Supply {
    if inter_state {
        Supply::InterState
    } else {
        Supply::IntraState
    }
}

/// Two column label/amount row
#[derive(Debug, Clone, Tabled)]
pub struct FigureRow {
    #[tabled(rename = "")]
    pub label: String,
    #[tabled(rename = "Amount")]
    pub value: String,
}

impl FigureRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        FigureRow {
            label: label.into(),
            value: value.into(),
        }
    }
}

pub fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}
