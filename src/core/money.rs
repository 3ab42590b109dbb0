use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Round to 2 dp, half-up. Only applied at presentation and persistence
/// boundaries; calculations keep full precision.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate towards zero at 2 dp.
pub fn truncate_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Largest amount accepted as a price, total or tax figure (₹1,000 lakh
/// crore). Sums and tax products of such amounts stay inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Smallest unit of currency
pub const PAISA: Decimal = dec!(0.01);

/// Render as rupees with Indian digit grouping, e.g. `₹1,23,456.50`.
pub fn format_inr(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((&text, "00"));
    format!("{sign}₹{}.{frac}", group_indian(whole))
}

/// Render a rate as a percentage without trailing zeros, e.g. `18%`, `2.5%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), last_three)
}
