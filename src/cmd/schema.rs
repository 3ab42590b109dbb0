//! Schema command - print expected input and output formats

use crate::config::Settings;
use crate::core::{ExpenseDocument, LineItemRecord, ParsedReceipt};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which format to describe
    #[arg(value_enum, default_value = "receipt")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for parsed receipt input
    Receipt,
    /// JSON Schema for the expense document produced by `draft --json`
    Document,
    /// JSON Schema for the `--config` file
    Config,
    /// CSV header row for `--items-csv`
    CsvHeader,
    /// CSV column descriptions for `--items-csv`
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.format {
            SchemaFormat::Receipt => schema_for!(ParsedReceipt),
            SchemaFormat::Document => schema_for!(ExpenseDocument),
            SchemaFormat::Config => schema_for!(Settings),
            SchemaFormat::CsvHeader => {
                println!("{}", LineItemRecord::csv_header());
                return Ok(());
            }
            SchemaFormat::CsvFields => {
                self.print_csv_fields();
                return Ok(());
            }
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_fields(&self) {
        println!("Line Item CSV Format");
        println!("====================");
        println!();
        for column in LineItemRecord::csv_columns() {
            let req = if column.required { "required" } else { "optional" };
            println!("{:12} ({:8})  {}", column.name, req, column.description);
        }
        println!();
        println!("Prices are in rupees; rows with a tax_kind are moved into the GST breakdown");
    }
}
