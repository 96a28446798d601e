//! Valuation and exit rules

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use crate::{
    types::{CloseReason, Position, Valuation},
    utils::ratio_bps,
};

/// Loss beyond which a pair is excluded from new entries (-0.5%).
pub const LOSING_THRESHOLD_BPS: Decimal = dec!(-50);

/// Share of the invested amount assumed recoverable when the position cannot be quoted.
pub const FALLBACK_RECOVERY: Decimal = dec!(0.99);

pub fn quoted_valuation(invested: Decimal, current_value: Decimal) -> Valuation {
    let profit = current_value - invested;
    Valuation {
        current_value,
        profit,
        profit_bps: ratio_bps(profit, invested),
        quoted: true,
    }
}

/// Pessimistic valuation used when the exit quote fails: a 1% loss.
pub fn fallback_valuation(invested: Decimal) -> Valuation {
    let current_value = invested * FALLBACK_RECOVERY;
    Valuation {
        quoted: false,
        ..quoted_valuation(invested, current_value)
    }
}

pub fn is_losing(valuation: &Valuation) -> bool {
    !valuation.quoted || valuation.profit_bps < LOSING_THRESHOLD_BPS
}

/// First matching exit condition. Profit target wins over stop loss, which wins over the
/// hold-time limit.
pub fn evaluate_exit(
    position: &Position,
    valuation: &Valuation,
    now: DateTime<Utc>,
    max_hold: Duration,
) -> Option<CloseReason> {
    if valuation.profit_bps >= Decimal::from(position.target_profit_bps) {
        Some(CloseReason::ProfitTarget)
    } else if valuation.profit_bps <= -Decimal::from(position.stop_loss_bps) {
        Some(CloseReason::StopLoss)
    } else if now - position.opened_at > max_hold {
        Some(CloseReason::MaxHoldTime)
    } else {
        None
    }
}
