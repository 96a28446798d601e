//! Basis-point arithmetic

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

pub const BPS_SCALE: Decimal = dec!(10000);

/// `numerator / denominator` in basis points; zero when the denominator is zero.
pub fn ratio_bps(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator
        .checked_div(denominator)
        .map(|r| r * BPS_SCALE)
        .unwrap_or(Decimal::ZERO)
}

pub fn bps_fraction(bps: u32) -> Decimal {
    Decimal::from(bps) / BPS_SCALE
}

/// Minimum acceptable output after a slippage tolerance.
pub fn apply_slippage(amount: Decimal, slippage_bps: u32) -> Decimal {
    (amount * (dec!(1) - bps_fraction(slippage_bps))).max(Decimal::ZERO)
}

/// Fee tiers are expressed in hundredths of a basis point (3000 = 0.3%).
pub fn fee_tier_rate(fee_tier: u32) -> Decimal {
    Decimal::from(fee_tier) / dec!(1_000_000)
}
