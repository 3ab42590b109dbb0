mod cmd;
mod config;
mod core;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gstc", version, about = "GST reconciliation and bill splitting for expenses")]
struct Cli {
    /// JSON file with GST slabs and category defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GST for a single line item
    Item(cmd::item::ItemCommand),
    /// GST for a whole document total
    Document(cmd::document::DocumentCommand),
    /// Split a bill evenly
    Split(cmd::split::SplitCommand),
    /// Reconcile a parsed receipt into an expense document
    Draft(cmd::draft::DraftCommand),
    /// Show configured GST slabs and category defaults
    Slabs(cmd::slabs::SlabsCommand),
    /// Print expected input and output formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let settings = config::Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Item(item) => item.exec(&settings),
        Command::Document(document) => document.exec(&settings),
        Command::Split(split) => split.exec(&settings),
        Command::Draft(draft) => draft.exec(&settings),
        Command::Slabs(slabs) => slabs.exec(&settings),
        Command::Schema(schema) => schema.exec(),
    }
}
