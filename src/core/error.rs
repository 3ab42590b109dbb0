use rust_decimal::Decimal;

/// Validation failures raised by the tax engine and draft operations.
///
/// None of these are partial: when an operation fails the draft it was
/// called on is left untouched.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaxError {
    #[error("rate {0}% is not a configured GST slab")]
    InvalidRate(Decimal),
    #[error("price must be greater than zero, got {0}")]
    InvalidPrice(Decimal),
    #[error("amount {0} exceeds the supported maximum of {max}", max = super::money::MAX_AMOUNT)]
    AmountTooLarge(Decimal),
    #[error("participant count must be between 1 and {max}, got {count}")]
    InvalidParticipantCount { count: u32, max: u32 },
    #[error("line item {index} does not exist (draft has {len} items)")]
    ItemOutOfRange { index: usize, len: usize },
    #[error("document level tax cannot be applied to a draft with {0} line items")]
    ItemizedDraft(usize),
    #[error("inconsistent GST breakdown: {0}")]
    InconsistentBreakdown(String),
}
