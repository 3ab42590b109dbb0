//! E2E tests for the gstc command line

use serde_json::Value;
use std::process::{Command, Output};

fn gstc(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn json_stdout(output: &Output) -> Value {
    assert!(output.status.success(), "Command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

/// Inclusive price is split back into base and tax
#[test]
fn item_inclusive_back_solves_base() {
    let output = gstc(&["item", "-p", "118", "-r", "18", "--json"]);
    let json = json_stdout(&output);

    assert_eq!(json["base_price"], "100.00");
    assert_eq!(json["cgst"], "9.00");
    assert_eq!(json["sgst"], "9.00");
    assert_eq!(json["igst"], "0.00");
    assert_eq!(json["total_gst"], "18.00");
    assert_eq!(json["price"], "118.00");
}

/// Exclusive price has tax added on top
#[test]
fn item_exclusive_adds_tax() {
    let output = gstc(&["item", "-p", "100", "-r", "18", "--mode", "exclusive", "--json"]);
    let json = json_stdout(&output);

    assert_eq!(json["base_price"], "100.00");
    assert_eq!(json["total_gst"], "18.00");
    assert_eq!(json["price"], "118.00");
}

/// Inter-state supply puts all tax in IGST
#[test]
fn item_inter_state_is_igst() {
    let output = gstc(&[
        "item",
        "-p",
        "100",
        "-r",
        "18",
        "--mode",
        "exclusive",
        "--inter-state",
        "--json",
    ]);
    let json = json_stdout(&output);

    assert_eq!(json["cgst"], "0.00");
    assert_eq!(json["sgst"], "0.00");
    assert_eq!(json["igst"], "18.00");
}

/// Table output shows the per-component rate
#[test]
fn item_table_output() {
    let output = gstc(&["item", "-p", "118", "-r", "18"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("CGST @ 9%"));
    assert!(stdout.contains("₹100.00"));
    assert!(stdout.contains("₹118.00"));
}

/// Rates outside the configured slabs are rejected
#[test]
fn item_rejects_unknown_slab() {
    let output = gstc(&["item", "-p", "100", "-r", "12"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("not a configured GST slab"));
}

/// Non-positive prices are rejected
#[test]
fn item_rejects_zero_price() {
    let output = gstc(&["item", "-p", "0", "-r", "18"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("greater than zero"));
}

/// Amounts near the numeric limit are an error, not a crash
#[test]
fn item_rejects_amount_beyond_maximum() {
    let output = gstc(&[
        "item",
        "-p",
        "79228162514264337593543950335",
        "-r",
        "40",
        "--mode",
        "exclusive",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("exceeds the supported maximum"));
    assert!(!stderr.contains("panicked"));
}

/// A config file can add slabs
#[test]
fn config_adds_slab() {
    let output = gstc(&[
        "--config",
        "tests/data/config.json",
        "item",
        "-p",
        "100",
        "-r",
        "12",
        "--mode",
        "exclusive",
        "--json",
    ]);
    let json = json_stdout(&output);

    assert_eq!(json["total_gst"], "12.00");
    assert_eq!(json["cgst"], "6.00");
}

/// Document tax on an inclusive total
#[test]
fn document_inclusive_total() {
    let output = gstc(&["document", "-a", "1180", "-r", "18", "--json"]);
    let json = json_stdout(&output);

    assert_eq!(json["base_amount"], "1000.00");
    assert_eq!(json["total_amount"], "1180.00");
    assert!(approx(&json["gst_details"]["cgst"], 90.0));
    assert!(approx(&json["gst_details"]["sgst"], 90.0));
    assert!(approx(&json["gst_details"]["total_gst"], 180.0));
}

/// Remainder paise go to the first participants
#[test]
fn split_three_ways() {
    let output = gstc(&["split", "-a", "100", "-p", "3", "--json"]);
    let json = json_stdout(&output);

    assert_eq!(json["rounded_share"], "33.33");
    assert_eq!(
        json["allocations"],
        serde_json::json!(["33.34", "33.33", "33.33"])
    );
}

/// Text output lists every participant
#[test]
fn split_table_output() {
    let output = gstc(&["split", "-a", "1000", "-p", "4"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("Each person pays: ₹250.00"));
    assert!(stdout.contains("Person"));
}

/// Participant limits come from config
#[test]
fn split_respects_configured_limit() {
    let output = gstc(&["split", "-a", "100", "-p", "21"]);
    assert!(!output.status.success());

    let output = gstc(&["--config", "tests/data/config.json", "split", "-a", "100", "-p", "5"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("between 1 and 4"));
}

/// Tax lines printed on the receipt move into the breakdown without
/// changing the total
#[test]
fn draft_reclassifies_tax_lines() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/receipt.json",
        "--reclassify",
        "2:cgst",
        "--reclassify",
        "3:sgst",
        "--skip-tax",
        "--json",
    ]);
    let json = json_stdout(&output);
    let document = &json["document"];

    assert!(approx(&document["amount"], 525.0));
    assert_eq!(document["line_items"].as_array().map(Vec::len), Some(2));
    assert!(approx(&document["gst_details"]["cgst"], 12.5));
    assert!(approx(&document["gst_details"]["sgst"], 12.5));
    assert!(approx(&document["gst_details"]["total_gst"], 25.0));
    assert_eq!(document["tax_type"], "GST");
    assert_eq!(document["payment_mode"], "upi");
    assert_eq!(document["date"], "2026-03-14");

    // Only the low confidence vendor is flagged
    let warnings = json["warnings"].as_array().expect("warnings");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["type"], "LowConfidence");
    assert_eq!(warnings[0]["field"], "vendor");
}

/// Feedback records what changed relative to the parsed receipt
#[test]
fn draft_records_corrections() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/receipt.json",
        "--reclassify",
        "2:cgst",
        "--reclassify",
        "3:sgst",
        "--skip-tax",
        "--feedback",
        "--json",
    ]);
    let json = json_stdout(&output);
    let corrections = &json["corrections"];

    assert_eq!(corrections["vendor"], "SPICE ROUTE");
    assert!(corrections.get("amount").is_none());
    assert!(approx(&corrections["gst_details"]["cgst"]["original"], 25.0));
    assert!(approx(&corrections["gst_details"]["cgst"]["corrected"], 12.5));
    assert!(approx(&corrections["gst_details"]["sgst"]["original"], 0.0));
    assert!(approx(&corrections["gst_details"]["sgst"]["corrected"], 12.5));
    assert!(corrections["gst_details"].get("total_gst").is_none());
}

/// Without a parsed GST breakdown there is nothing to correct
#[test]
fn draft_skips_gst_corrections_without_parsed_breakdown() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/thali.json",
        "--reclassify",
        "1:cgst",
        "--skip-tax",
        "--feedback",
        "--json",
    ]);
    let json = json_stdout(&output);

    assert!(json.get("corrections").is_none());
}

/// CSV line items with a tax_kind are reclassified; the total follows items
#[test]
fn draft_from_items_csv() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/cafe.json",
        "--items-csv",
        "tests/data/items.csv",
        "--skip-tax",
        "--json",
    ]);
    let json = json_stdout(&output);
    let document = &json["document"];

    assert!(approx(&document["amount"], 168.0));
    assert_eq!(document["line_items"][0]["name"], "Masala Dosa");
    assert!(approx(&document["gst_details"]["cgst"], 4.0));
    assert!(approx(&document["gst_details"]["total_gst"], 8.0));
    assert_eq!(document["source"], "pdf");
    assert_eq!(document["date"], "2026-03-15");
}

/// A receipt without line items is taxed as a whole, using the category rate
#[test]
fn draft_document_tax_from_category() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/sms.json",
        "-k",
        "Bills & Utilities",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("EXPENSE DRAFT (Airtel, Bills & Utilities)"));
    assert!(stdout.contains("₹90.00"));
    assert!(stdout.contains("₹180.00"));
    assert!(stdout.contains("₹1,180.00"));
}

/// Removing an item from an entered total flags the mismatch
#[test]
fn draft_remove_flags_total_mismatch() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/receipt.json",
        "--remove",
        "1",
        "--reclassify",
        "2:cgst",
        "--reclassify",
        "3:sgst",
        "--skip-tax",
        "--json",
    ]);
    let json = json_stdout(&output);

    assert!(approx(&json["document"]["amount"], 525.0));
    assert_eq!(json["document"]["line_items"].as_array().map(Vec::len), Some(1));
    let warnings = json["warnings"].as_array().expect("warnings");
    assert!(warnings.iter().any(|w| w["type"] == "TotalMismatch"));
}

/// Document tax is charged on the total less tax already on the receipt
#[test]
fn draft_document_tax_after_reclassifying() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/thali.json",
        "--reclassify",
        "1:cgst",
        "--remove",
        "0",
        "-r",
        "18",
        "--json",
    ]);
    let json = json_stdout(&output);
    let document = &json["document"];

    assert!(approx(&document["amount"], 545.0));
    assert!(document["line_items"].as_array().is_some_and(Vec::is_empty));
    // 45 printed CGST plus 76.27 on the remaining 500
    assert!(approx(&document["gst_details"]["cgst"], 83.14));
    assert!(approx(&document["gst_details"]["sgst"], 38.14));
    assert!(approx(&document["gst_details"]["total_gst"], 121.28));
}

/// One line item cannot be both removed and reclassified
#[test]
fn draft_rejects_conflicting_edits() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/receipt.json",
        "--reclassify",
        "1:cgst",
        "--remove",
        "1",
        "--skip-tax",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("conflicting edits"));
}

/// Out of range reclassification fails without output
#[test]
fn draft_rejects_bad_index() {
    let output = gstc(&[
        "draft",
        "-i",
        "tests/data/receipt.json",
        "--reclassify",
        "9:cgst",
        "--skip-tax",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("does not exist"));
}

/// Slab listing includes the built-in rates
#[test]
fn slabs_lists_defaults() {
    let output = gstc(&["slabs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("GST SLABS"));
    assert!(stdout.contains("18%"));
    assert!(stdout.contains("40%"));
    assert!(stdout.contains("Groceries"));
}

/// Schema output for the CSV line item format
#[test]
fn schema_csv_header() {
    let output = gstc(&["schema", "csv-header"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_eq!(stdout.trim(), "name,price,tax_kind");
}

/// JSON schema for parsed receipts
#[test]
fn schema_receipt_json() {
    let output = gstc(&["schema", "receipt"]);
    let json = json_stdout(&output);

    assert_eq!(json["title"], "ParsedReceipt");
    assert!(json["properties"]["line_items"].is_object());
}
