//! Pool Arbitrage Engine - Main Entry Point
//!
//! Runs the pool-imbalance and triangular strategies against the simulated venue

use anyhow::Result;
use pool_arb_engine::*;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;
use tracing::{debug, error, info, warn};
use pool_arb_engine::{
    advisory::StaticGuidance,
    errors::CircuitBreaker,
    execution::TradeExecutor,
    gateway::{SimulatedGateway, SwapGateway},
    risk::{LimitsRiskOverlay, RiskNotifier, RiskOverlay},
    strategy::{AdvisoryPoller, PoolImbalanceStrategy, Strategy, TriangularStrategy},
    utils::StrategyStats,
};

/// Statistics are printed every this many ticks.
const STATS_EVERY_TICKS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    utils::setup_logging()?;

    // Load configuration
    let config = Arc::new(Config::load());
    config.validate()?;

    info!("🔺 Pool Arbitrage Engine v{}", env!("CARGO_PKG_VERSION"));
    utils::print_configuration(&config);

    if !config.dry_run {
        warn!("⚠️  DRY_RUN=false: swaps mutate the simulated venue's reserves");
    }

    // Initialize components
    let simulated = SimulatedGateway::new(&config.simulated_reserves);
    info!("✅ Simulated venue seeded with {} pools", simulated.pool_count().await);
    let gateway: Arc<dyn SwapGateway> = Arc::new(simulated);
    let executor = Arc::new(TradeExecutor::new(gateway, config.dry_run, config.recipient.clone()));

    let risk: Arc<dyn RiskOverlay> = Arc::new(LimitsRiskOverlay::new(
        config.position_size.max(config.triangular_trade_size),
        config.exit_slippage_bps.max(config.path_slippage_bps),
        config.position_size * dec!(2),
    ));
    let (notifier, notifier_handle) = RiskNotifier::spawn(risk.clone());

    let advisory = || {
        let poller = AdvisoryPoller::new(&config);
        match config.guidance_label.as_deref().map(str::parse::<RegimeLabel>) {
            Some(Ok(label)) => poller.with_guidance(Arc::new(StaticGuidance::new(label))),
            _ => poller,
        }
    };

    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(PoolImbalanceStrategy::new(
            config.clone(),
            executor.clone(),
            risk.clone(),
            notifier.clone(),
            advisory(),
        )),
        Box::new(TriangularStrategy::new(config.clone(), executor.clone(), risk.clone(), advisory())),
    ];
    drop(notifier);

    let mut stats: BTreeMap<String, StrategyStats> = BTreeMap::new();
    let mut breakers: BTreeMap<String, CircuitBreaker> = strategies
        .iter()
        .map(|s| {
            (
                s.name().to_string(),
                CircuitBreaker::new(config.max_consecutive_failures, config.circuit_breaker_cooldown_secs),
            )
        })
        .collect();

    let start_time = Instant::now();
    let conditions = config.market_conditions();
    let mut interval = time::interval(Duration::from_secs(config.cycle_interval_secs));
    let mut ticks = 0u64;

    info!("\n🚀 Starting strategy loop...\n");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                ticks += 1;
                for strategy in strategies.iter_mut() {
                    let name = strategy.name().to_string();
                    let entry = stats.entry(name.clone()).or_default();

                    if !strategy.should_activate(&conditions) {
                        debug!("{} inactive under current market conditions", name);
                        entry.skipped_cycles += 1;
                        continue;
                    }

                    if let Some(breaker) = breakers.get_mut(&name) {
                        if !breaker.can_proceed() {
                            debug!("⚡ {} circuit breaker OPEN, skipping cycle", name);
                            entry.skipped_cycles += 1;
                            continue;
                        }
                    }

                    let result = strategy.run_cycle().await;
                    utils::print_trade_result(&result);
                    debug!(strategy = %name, descriptor = %result.descriptor, "Cycle descriptor");
                    entry.record(&result);

                    if let Some(breaker) = breakers.get_mut(&name) {
                        if result.success {
                            breaker.record_success();
                        } else if breaker.record_error() {
                            error!("Circuit breaker activated for {}", name);
                        }
                    }
                }

                if ticks % STATS_EVERY_TICKS == 0 {
                    utils::print_session_stats(start_time, &stats, &breakers);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("\n📛 Received shutdown signal (Ctrl+C)...");
                break;
            }
        }
    }

    info!("\n🛑 Shutting down gracefully...");
    drop(strategies);
    if let Err(e) = notifier_handle.await {
        warn!("Risk notifier task ended abnormally: {}", e);
    }
    utils::print_session_stats(start_time, &stats, &breakers);

    Ok(())
}
