//! Processing-fee breakdown for a candidate refund amount.
//!
//! The platform keeps 2% of every refunded amount. The fee is rounded first
//! and the net derived by subtraction, so the fee is always the clean
//! 2%-rounded figure and the net absorbs any rounding remainder. Reversing
//! that order produces off-by-one-cent mismatches; do not.

use crate::refund::error::{RefundError, RefundResult};
use crate::refund::types::RefundBreakdown;
use rust_decimal::{Decimal, RoundingStrategy};

/// Platform processing-fee rate: 2% of the refunded amount, charged to the
/// merchant. A platform constant, not configurable per request.
pub const PROCESSING_FEE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Compute the fee split for `requested` against the transaction's gross
/// amount. Pure; safe to call on every keystroke of an amount field.
pub fn compute_breakdown(requested: Decimal, gross: Decimal) -> RefundResult<RefundBreakdown> {
    if requested <= Decimal::ZERO {
        return Err(RefundError::AmountNotPositive);
    }
    if requested > gross {
        return Err(RefundError::AmountExceedsGross);
    }

    let processing_fee = round2(requested * PROCESSING_FEE_RATE);
    let net_amount = round2(requested - processing_fee);

    Ok(RefundBreakdown {
        processing_fee,
        net_amount,
    })
}

/// Parse a caller-supplied amount string. Anything that does not parse as a
/// finite decimal is reported the same way as a non-positive amount.
pub fn parse_amount(raw: &str) -> RefundResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| RefundError::AmountNotPositive)
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
