use super::error::TaxError;
use super::money::{round_money, truncate_money, MAX_AMOUNT, PAISA};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default upper bound on participants for [`split_evenly`].
pub const MAX_PARTICIPANTS: u32 = 20;

/// Even split of a bill. `per_person_share` keeps full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SplitResult {
    #[schemars(with = "f64")]
    pub total_amount: Decimal,
    pub participant_count: u32,
    #[schemars(with = "f64")]
    pub per_person_share: Decimal,
}

impl SplitResult {
    /// Share rounded half-up to paise, for display.
    pub fn rounded_share(&self) -> Decimal {
        round_money(self.per_person_share)
    }

    /// What each participant actually pays, in order.
    ///
    /// Everyone pays the share truncated to paise; leftover paise go one each
    /// to the first participants, so the allocations always add up to the
    /// total rounded to paise.
    pub fn allocations(&self) -> Vec<Decimal> {
        let base = truncate_money(self.per_person_share);
        let shared = base * Decimal::from(self.participant_count);
        let mut leftover = round_money(self.total_amount) - shared;
        (0..self.participant_count)
            .map(|_| {
                if leftover >= PAISA {
                    leftover -= PAISA;
                    base + PAISA
                } else {
                    base
                }
            })
            .collect()
    }
}

/// Split `total_amount` evenly between `participant_count` people, at most
/// `max_participants` of them.
pub fn split_evenly(
    total_amount: Decimal,
    participant_count: u32,
    max_participants: u32,
) -> Result<SplitResult, TaxError> {
    if !(1..=max_participants).contains(&participant_count) {
        return Err(TaxError::InvalidParticipantCount {
            count: participant_count,
            max: max_participants,
        });
    }
    if total_amount <= Decimal::ZERO {
        return Err(TaxError::InvalidPrice(total_amount));
    }
    if total_amount > MAX_AMOUNT {
        return Err(TaxError::AmountTooLarge(total_amount));
    }
    let per_person_share = total_amount / Decimal::from(participant_count);
    log::debug!(
        "split {} between {} -> {}",
        total_amount,
        participant_count,
        per_person_share
    );
    Ok(SplitResult {
        total_amount,
        participant_count,
        per_person_share,
    })
}
