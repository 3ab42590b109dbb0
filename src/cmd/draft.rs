//! Draft command - reconcile a parsed receipt into an expense document

use super::{print_table, read_receipt, supply, FigureRow, ModeArg};
use crate::config::Settings;
use crate::core::money::{format_inr, format_rate};
use crate::core::{
    discrepancies, read_line_items_csv, Discrepancies, ExpenseDocument, ExpenseDraft, SlabTable,
    TaxEngine, TaxKind, TotalSource, Warning,
};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct DraftCommand {
    /// Parsed receipt JSON (use "-" for stdin)
    #[arg(short = 'i', long)]
    receipt: PathBuf,

    /// CSV of line items (name,price[,tax_kind]) replacing the receipt's line items
    #[arg(long)]
    items_csv: Option<PathBuf>,

    /// Expense category
    #[arg(short = 'k', long, default_value = "Others")]
    category: String,

    /// GST rate in percent; defaults to the category's suggested rate
    #[arg(short, long)]
    rate: Option<Decimal>,

    /// Whether line item prices already include GST
    #[arg(short, long, value_enum, default_value_t = ModeArg::Inclusive)]
    mode: ModeArg,

    /// Inter-state supply: all tax is IGST
    #[arg(long)]
    inter_state: bool,

    /// Move a line item into the tax breakdown, e.g. `2:cgst`. Indices are
    /// positions in the parsed line items, starting at 0.
    #[arg(long, value_parser = parse_reclassify)]
    reclassify: Vec<(usize, TaxKind)>,

    /// Drop a line item that is not part of the expense (e.g. a subtotal row)
    #[arg(long)]
    remove: Vec<usize>,

    /// Tax the document total instead of the line items (requires no line items)
    #[arg(long)]
    document_tax: bool,

    /// Only reclassify; leave line item tax untouched
    #[arg(long, conflicts_with_all = ["rate", "document_tax"])]
    skip_tax: bool,

    /// Include corrections relative to the parsed receipt
    #[arg(long)]
    feedback: bool,

    /// Output the persistence document as JSON
    #[arg(long)]
    json: bool,
}

fn parse_reclassify(s: &str) -> Result<(usize, TaxKind), String> {
    let (index, kind) = s
        .split_once(':')
        .ok_or_else(|| format!("expected INDEX:KIND, got '{s}'"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid index '{index}': {e}"))?;
    let kind = kind.parse::<TaxKind>().map_err(|e| e.to_string())?;
    Ok((index, kind))
}

/// Correction to a parsed line item, addressed by its parsed position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEdit {
    Reclassify(TaxKind),
    Remove,
}

/// Merge line edits from the items CSV and the command line. Command line
/// edits override a CSV tax kind; two different command line edits of the
/// same line are an error.
fn collect_edits(
    csv_kinds: &[(usize, TaxKind)],
    reclassify: &[(usize, TaxKind)],
    remove: &[usize],
) -> anyhow::Result<BTreeMap<usize, LineEdit>> {
    let mut edits: BTreeMap<usize, LineEdit> = csv_kinds
        .iter()
        .map(|(index, kind)| (*index, LineEdit::Reclassify(*kind)))
        .collect();

    let mut explicit: BTreeMap<usize, LineEdit> = BTreeMap::new();
    let requested = reclassify
        .iter()
        .map(|(index, kind)| (*index, LineEdit::Reclassify(*kind)))
        .chain(remove.iter().map(|index| (*index, LineEdit::Remove)));
    for (index, edit) in requested {
        if let Some(previous) = explicit.insert(index, edit) {
            if previous != edit {
                anyhow::bail!(
                    "line item {} is given conflicting edits: {} and {}",
                    index,
                    previous,
                    edit
                );
            }
        }
    }
    edits.extend(explicit);
    Ok(edits)
}

impl std::fmt::Display for LineEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineEdit::Reclassify(kind) => write!(f, "--reclassify as {}", kind),
            LineEdit::Remove => write!(f, "--remove"),
        }
    }
}

#[derive(Debug, Serialize)]
struct DraftOutput {
    document: ExpenseDocument,
    warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    corrections: Option<Discrepancies>,
}

#[derive(Debug, Tabled)]
struct LineItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Item")]
    name: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "CGST")]
    cgst: String,
    #[tabled(rename = "SGST")]
    sgst: String,
    #[tabled(rename = "IGST")]
    igst: String,
    #[tabled(rename = "Price")]
    price: String,
}

impl DraftCommand {
    pub fn exec(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut receipt = read_receipt(&self.receipt)?;

        let mut csv_kinds = Vec::new();
        if let Some(path) = &self.items_csv {
            let lines = read_line_items_csv(File::open(path)?)?;
            receipt.line_items = lines.iter().map(|l| l.item.clone()).collect();
            csv_kinds = lines
                .iter()
                .enumerate()
                .filter_map(|(index, line)| line.tax_kind.map(|kind| (index, kind)))
                .collect();
        }
        let edits = collect_edits(&csv_kinds, &self.reclassify, &self.remove)?;

        let mut warnings = receipt.warnings(settings.low_confidence_threshold);
        let reported_gst = receipt.gst_details;
        let seeded = receipt.into_draft(&self.category)?;
        let mut original = ExpenseDocument::from_draft(&seeded);
        original.gst_details = reported_gst;

        let engine = settings.engine();
        let draft = self.reconcile(seeded, &edits, &engine)?;
        warnings.extend(draft.warnings());

        let document = ExpenseDocument::from_draft(&draft);
        let corrections = if self.feedback {
            discrepancies(&original, &document)
        } else {
            None
        };
        log::info!(
            "Draft total {} with {} GST, {} warning(s)",
            document.amount,
            draft.breakdown().total_gst,
            warnings.len()
        );

        if self.json {
            let output = DraftOutput {
                document,
                warnings,
                corrections,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_text(&draft, engine.slabs(), &warnings, corrections.as_ref());
        }
        Ok(())
    }

    fn reconcile(
        &self,
        seeded: ExpenseDraft,
        edits: &BTreeMap<usize, LineEdit>,
        engine: &TaxEngine,
    ) -> anyhow::Result<ExpenseDraft> {
        // Highest index first so earlier positions stay valid
        let mut draft = seeded;
        for (index, edit) in edits.iter().rev() {
            draft = match edit {
                LineEdit::Reclassify(kind) => draft.reclassify_as_tax_line(*index, *kind)?,
                LineEdit::Remove => draft.remove_line_item(*index)?,
            };
        }

        if self.skip_tax {
            return Ok(draft);
        }

        let rate = match self.rate {
            Some(rate) => rate,
            None => engine
                .slabs()
                .suggested_rate(&self.category)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "no --rate given and no default rate for category '{}'",
                        self.category
                    )
                })?,
        };
        let mode = self.mode.into();
        let supply = supply(self.inter_state);

        if self.document_tax || draft.line_items().is_empty() {
            Ok(draft.apply_document_rate(engine, rate, mode, supply)?)
        } else {
            Ok(draft.apply_rate_to_all(engine, rate, mode, supply)?)
        }
    }

    fn print_text(
        &self,
        draft: &ExpenseDraft,
        slabs: &SlabTable,
        warnings: &[Warning],
        corrections: Option<&Discrepancies>,
    ) {
        println!();
        match &draft.vendor {
            Some(vendor) => println!("EXPENSE DRAFT ({}, {})", vendor, draft.category),
            None => println!("EXPENSE DRAFT ({})", draft.category),
        }
        println!();

        if !draft.line_items().is_empty() {
            let rows: Vec<LineItemRow> = draft
                .line_items()
                .iter()
                .enumerate()
                .map(|(index, item)| LineItemRow {
                    index,
                    name: item.name.clone(),
                    rate: slabs
                        .label(item.gst_rate)
                        .map_or_else(|| format_rate(item.gst_rate), str::to_string),
                    cgst: format_inr(item.cgst),
                    sgst: format_inr(item.sgst),
                    igst: format_inr(item.igst),
                    price: format_inr(item.price),
                })
                .collect();
            print_table(&rows);
            println!();
        }

        let breakdown = draft.breakdown();
        let mut figures = Vec::new();
        for line in draft.tax_lines() {
            figures.push(FigureRow::new(
                format!("{} ({})", line.kind, line.name),
                format_inr(line.amount),
            ));
        }
        if let Some(document_tax) = draft.document_tax() {
            figures.push(FigureRow::new(
                "Document GST",
                format_inr(document_tax.breakdown.total_gst),
            ));
        }
        for kind in [TaxKind::Cgst, TaxKind::Sgst, TaxKind::Igst] {
            figures.push(FigureRow::new(kind.display(), format_inr(breakdown.get(kind))));
        }
        figures.push(FigureRow::new("Total GST", format_inr(breakdown.total_gst)));
        let total_label = match draft.total_source() {
            TotalSource::Entered => "Total",
            TotalSource::LineItems => "Total (from line items)",
        };
        figures.push(FigureRow::new(total_label, format_inr(draft.amount())));
        print_table(&figures);

        if !warnings.is_empty() {
            println!();
            println!("\u{26A0} {} warning(s):", warnings.len());
            for (i, warning) in warnings.iter().enumerate() {
                println!("  {}. {}", i + 1, warning);
            }
        }

        if let Some(found) = corrections {
            println!();
            println!("CORRECTIONS ({})", found.vendor);
            if let Some(amount) = &found.amount {
                println!(
                    "  amount: {} -> {}",
                    format_inr(amount.original),
                    format_inr(amount.corrected)
                );
            }
            for (field, correction) in &found.gst_details {
                println!(
                    "  {}: {} -> {}",
                    field,
                    format_inr(correction.original),
                    format_inr(correction.corrected)
                );
            }
        }
    }
}
