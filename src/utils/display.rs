//! Display and printing utilities

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info, warn};
use crate::{
    config::Config,
    errors::CircuitBreaker,
    types::TradeResult,
};

/// Running totals for one strategy across the session.
#[derive(Debug, Clone, Default)]
pub struct StrategyStats {
    pub cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub skipped_cycles: u64,
    pub realized_profit: Decimal,
    /// Unrealized PnL reported by the latest successful cycle.
    pub unrealized_profit: Decimal,
    pub total_volume: Decimal,
    pub last_error: Option<String>,
}

impl StrategyStats {
    pub fn record(&mut self, result: &TradeResult) {
        self.cycles += 1;
        self.total_volume += result.volume;
        if result.success {
            self.successful_cycles += 1;
            self.realized_profit += result.realized_profit();
            self.unrealized_profit = result.unrealized_profit;
        } else {
            self.failed_cycles += 1;
            self.last_error = result.error_message.clone();
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.cycles > 0 {
            self.successful_cycles as f64 / self.cycles as f64 * 100.0
        } else {
            0.0
        }
    }
}

pub fn print_configuration(config: &Config) {
    info!("📋 Configuration:");
    info!("   Mode: {}", if config.dry_run { "DRY RUN (simulated fills)" } else { "LIVE" });
    info!("   Pools: {}", config.pools.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", "));
    info!("   Position Size: {} | Max Positions: {}", config.position_size, config.max_positions);
    info!(
        "   Target: {} bps | Stop Loss: {} bps | Max Hold: {}s",
        config.target_profit_bps, config.stop_loss_bps, config.max_hold_secs
    );
    info!(
        "   Slippage: entry {} bps, exit {} bps, path {} bps",
        config.entry_slippage_bps, config.exit_slippage_bps, config.path_slippage_bps
    );
    info!("   Scan Interval: {}s | Cycle Interval: {}s", config.scan_interval_secs, config.cycle_interval_secs);
    info!(
        "   Triangular: {} cycles, size {}, floor {} bps, tiers {:?}",
        config.triangular_cycles.len(),
        config.triangular_trade_size,
        config.min_profit_bps,
        config.fee_tiers
    );
    if let Some(label) = &config.guidance_label {
        info!("   Static Guidance: {}", label);
    }
}

pub fn print_trade_result(result: &TradeResult) {
    if result.success {
        if result.volume.is_zero() {
            info!("💤 {} | idle cycle", result.strategy);
        } else {
            warn!(
                "✅ {} | profit {:.4} | volume {:.4}",
                result.strategy, result.profit, result.volume
            );
        }
    } else {
        error!(
            "❌ {} | cycle failed: {}",
            result.strategy,
            result.error_message.as_deref().unwrap_or("Unknown")
        );
    }
}

pub fn print_session_stats(
    start_time: Instant,
    stats: &BTreeMap<String, StrategyStats>,
    breakers: &BTreeMap<String, CircuitBreaker>,
) {
    let runtime = start_time.elapsed().as_secs() / 60;

    info!("\n📊 Session Statistics ({} minutes)", runtime);
    for (name, s) in stats {
        info!("   📈 {}:", name.to_uppercase());
        info!("     Cycles: {} ({} skipped)", s.cycles, s.skipped_cycles);
        info!("     Success rate: {:.1}%", s.success_rate());
        info!("     Realized profit: {:.4}", s.realized_profit);
        info!("     Unrealized PnL: {:.4}", s.unrealized_profit);
        info!("     Volume: {:.4}", s.total_volume);
        if let Some(err) = &s.last_error {
            info!("     Last error: {}", err);
        }
        if let Some(breaker) = breakers.get(name) {
            info!(
                "     Circuit breaker: {}",
                if breaker.is_open { "OPEN" } else { "CLOSED" }
            );
        }
    }
    info!("");
}
