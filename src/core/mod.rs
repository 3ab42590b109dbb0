pub mod document;
pub mod draft;
pub mod error;
pub mod feedback;
pub mod gst;
pub mod money;
pub mod receipt;
pub mod slabs;
pub mod split;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use document::{ExpenseDocument, GstDetails};
pub use draft::{ExpenseDraft, ExpenseSource, LineItem, PaymentMode, TaxLine, TotalSource};
pub use error::TaxError;
pub use feedback::{discrepancies, Discrepancies};
pub use gst::{DocumentTax, GstBreakdown, ItemTax, Supply, TaxEngine, TaxKind, TaxMode};
pub use receipt::{read_line_items_csv, CsvColumn, LineItemRecord, ParsedReceipt, PayloadError};
pub use slabs::{SlabTable, TaxSlab};
pub use split::{split_evenly, SplitResult, MAX_PARTICIPANTS};
pub use warnings::Warning;
