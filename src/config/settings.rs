//! Engine configuration settings and environment variable handling

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;
use tracing::warn;
use crate::{
    errors::{EngineError, EngineResult},
    types::{ActivationThresholds, MarketConditions, PoolPair},
};

// Position sizing
pub const DEFAULT_POSITION_SIZE: Decimal = dec!(5);
pub const MIN_POSITION_SIZE: Decimal = dec!(0.0001);
pub const DEFAULT_MAX_POSITIONS: usize = 3;
pub const MAX_POSITIONS_LIMIT: usize = 50;

// Exit thresholds
pub const DEFAULT_TARGET_PROFIT_BPS: u32 = 200;
pub const DEFAULT_STOP_LOSS_BPS: u32 = 100;
pub const DEFAULT_MAX_HOLD_SECS: u64 = 3600; // 1 hour
pub const MAX_SLIPPAGE_BPS: u32 = 1000; // 10%
pub const DEFAULT_ENTRY_SLIPPAGE_BPS: u32 = 50;
pub const DEFAULT_EXIT_SLIPPAGE_BPS: u32 = 150;

// Scanner
pub const DEFAULT_PROBE_AMOUNT: Decimal = dec!(5);
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;

// Collaborator polling
pub const DEFAULT_GUIDANCE_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_CROSS_VENUE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_CROSS_VENUE_MIN_PROFIT_BPS: u32 = 20;
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 10;

// Triangular paths
pub const DEFAULT_TRIANGULAR_TRADE_SIZE: Decimal = dec!(15);
pub const DEFAULT_MIN_PROFIT_BPS: u32 = 30;
pub const DEFAULT_PATH_SLIPPAGE_BPS: u32 = 50;
pub const DEFAULT_FEE_TIERS: &[u32] = &[500, 3000, 10000];

pub const DEFAULT_POOLS: &str =
    "WETH/USDC:3000,WETH/DAI:3000,WBTC/WETH:3000,USDC/DAI:500,LINK/WETH:3000,WBTC/USDC:3000";
pub const DEFAULT_TRIANGULAR_CYCLES: &str =
    "USDC>WETH>DAI>USDC;USDC>WETH>WBTC>USDC;WETH>USDC>DAI>WETH";
pub const DEFAULT_BRIDGE_TOKENS: &str = "WETH,USDC";
pub const DEFAULT_SIM_RESERVES: &str = "WETH/USDC:3000=400:1400000,WETH/DAI:3000=300:1052000,\
    WBTC/WETH:3000=40:720,USDC/DAI:500=2000000:2001000,LINK/WETH:3000=90000:450,\
    WBTC/USDC:3000=30:1890000,WETH/USDC:500=250:876000,WETH/DAI:500=200:699000";

// Runner
pub const DEFAULT_MAX_CLOSE_RETRIES: u32 = 3;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;
pub const DEFAULT_CIRCUIT_BREAKER_COOLDOWN_SECS: u64 = 300;
pub const DEFAULT_RECIPIENT: &str = "0x0000000000000000000000000000000000000000";

/// Initial reserves for one pool of the in-memory venue used in dry runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveSeed {
    pub pool: PoolPair,
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Position lifecycle
    pub position_size: Decimal,
    pub max_positions: usize,
    pub target_profit_bps: u32,
    pub stop_loss_bps: u32,
    pub max_hold_secs: u64,
    pub entry_slippage_bps: u32,
    pub exit_slippage_bps: u32,
    pub max_close_retries: u32,
    // Scanner
    pub probe_amount: Decimal,
    pub scan_interval_secs: u64,
    pub pools: Vec<PoolPair>,
    pub bridge_tokens: Vec<String>,
    // Collaborators
    pub guidance_interval_secs: u64,
    pub guidance_label: Option<String>,
    pub cross_venue_interval_secs: u64,
    pub cross_venue_min_profit_bps: u32,
    // Triangular paths
    pub triangular_cycles: Vec<Vec<String>>,
    pub fee_tiers: Vec<u32>,
    pub triangular_trade_size: Decimal,
    pub min_profit_bps: u32,
    pub path_slippage_bps: u32,
    // Execution
    pub dry_run: bool,
    pub recipient: String,
    // Runner
    pub cycle_interval_secs: u64,
    pub max_consecutive_failures: u32,
    pub circuit_breaker_cooldown_secs: u64,
    pub market_volume: Decimal,
    pub market_volatility: Decimal,
    pub pool_activation: ActivationThresholds,
    pub triangular_activation: ActivationThresholds,
    pub simulated_reserves: Vec<ReserveSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; missing or unparsable values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let decimal = |key: &str, default: Decimal| {
            lookup(key)
                .and_then(|s| Decimal::from_str(s.trim()).ok())
                .unwrap_or(default)
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let bps = |key: &str, default: u32| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(default)
                .min(MAX_SLIPPAGE_BPS * 10)
        };

        let entry_slippage_bps = bps("ENTRY_SLIPPAGE_BPS", DEFAULT_ENTRY_SLIPPAGE_BPS).min(MAX_SLIPPAGE_BPS);
        let fee_tiers = lookup("FEE_TIERS")
            .map(|s| parse_fee_tiers(&s))
            .filter(|tiers| !tiers.is_empty())
            .unwrap_or_else(|| DEFAULT_FEE_TIERS.to_vec());

        Self {
            position_size: decimal("POSITION_SIZE", DEFAULT_POSITION_SIZE).max(MIN_POSITION_SIZE),
            max_positions: (number("MAX_POSITIONS", DEFAULT_MAX_POSITIONS as u64) as usize)
                .min(MAX_POSITIONS_LIMIT),
            target_profit_bps: bps("TARGET_PROFIT_BPS", DEFAULT_TARGET_PROFIT_BPS),
            stop_loss_bps: bps("STOP_LOSS_BPS", DEFAULT_STOP_LOSS_BPS),
            max_hold_secs: number("MAX_HOLD_SECS", DEFAULT_MAX_HOLD_SECS),
            entry_slippage_bps,
            exit_slippage_bps: bps("EXIT_SLIPPAGE_BPS", DEFAULT_EXIT_SLIPPAGE_BPS)
                .min(MAX_SLIPPAGE_BPS)
                .max(entry_slippage_bps),
            max_close_retries: number("MAX_CLOSE_RETRIES", DEFAULT_MAX_CLOSE_RETRIES as u64) as u32,
            probe_amount: decimal("PROBE_AMOUNT", DEFAULT_PROBE_AMOUNT),
            scan_interval_secs: number("SCAN_INTERVAL_SECS", DEFAULT_SCAN_INTERVAL_SECS),
            pools: parse_pools(&lookup("POOLS").unwrap_or_else(|| DEFAULT_POOLS.to_string())),
            bridge_tokens: parse_list(
                &lookup("BRIDGE_TOKENS").unwrap_or_else(|| DEFAULT_BRIDGE_TOKENS.to_string()),
            ),
            guidance_interval_secs: number("GUIDANCE_INTERVAL_SECS", DEFAULT_GUIDANCE_INTERVAL_SECS),
            guidance_label: lookup("GUIDANCE_LABEL").filter(|s| !s.trim().is_empty()),
            cross_venue_interval_secs: number(
                "CROSS_VENUE_INTERVAL_SECS",
                DEFAULT_CROSS_VENUE_INTERVAL_SECS,
            ),
            cross_venue_min_profit_bps: bps(
                "CROSS_VENUE_MIN_PROFIT_BPS",
                DEFAULT_CROSS_VENUE_MIN_PROFIT_BPS,
            ),
            triangular_cycles: parse_cycles(
                &lookup("TRIANGULAR_CYCLES").unwrap_or_else(|| DEFAULT_TRIANGULAR_CYCLES.to_string()),
            ),
            fee_tiers,
            triangular_trade_size: decimal("TRIANGULAR_TRADE_SIZE", DEFAULT_TRIANGULAR_TRADE_SIZE)
                .max(MIN_POSITION_SIZE),
            min_profit_bps: bps("MIN_PROFIT_BPS", DEFAULT_MIN_PROFIT_BPS),
            path_slippage_bps: bps("PATH_SLIPPAGE_BPS", DEFAULT_PATH_SLIPPAGE_BPS).min(MAX_SLIPPAGE_BPS),
            dry_run: lookup("DRY_RUN")
                .unwrap_or_else(|| "true".to_string())
                .trim()
                .parse()
                .unwrap_or(true),
            recipient: lookup("RECIPIENT").unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
            cycle_interval_secs: number("CYCLE_INTERVAL_SECS", DEFAULT_CYCLE_INTERVAL_SECS).max(1),
            max_consecutive_failures: number(
                "MAX_CONSECUTIVE_FAILURES",
                DEFAULT_MAX_CONSECUTIVE_FAILURES as u64,
            ) as u32,
            circuit_breaker_cooldown_secs: number(
                "CIRCUIT_BREAKER_COOLDOWN_SECS",
                DEFAULT_CIRCUIT_BREAKER_COOLDOWN_SECS,
            ),
            market_volume: decimal("MARKET_VOLUME", dec!(250000)),
            market_volatility: decimal("MARKET_VOLATILITY", dec!(1.5)),
            pool_activation: ActivationThresholds {
                min_volume: decimal("POOL_MIN_VOLUME", dec!(100000)),
                min_volatility: decimal("POOL_MIN_VOLATILITY", dec!(0.5)),
            },
            triangular_activation: ActivationThresholds {
                min_volume: decimal("TRIANGULAR_MIN_VOLUME", dec!(200000)),
                min_volatility: decimal("TRIANGULAR_MIN_VOLATILITY", dec!(1.0)),
            },
            simulated_reserves: parse_reserves(
                &lookup("SIM_RESERVES").unwrap_or_else(|| DEFAULT_SIM_RESERVES.to_string()),
            ),
        }
    }

    pub fn market_conditions(&self) -> MarketConditions {
        MarketConditions {
            volume: self.market_volume,
            volatility: self.market_volatility,
        }
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.pools.is_empty() {
            return Err(EngineError::config("POOLS", "pool universe is empty"));
        }
        if self.position_size <= Decimal::ZERO || self.probe_amount <= Decimal::ZERO {
            return Err(EngineError::config(
                "POSITION_SIZE",
                "position size and probe amount must be positive",
            ));
        }
        if self.max_positions == 0 {
            return Err(EngineError::config("MAX_POSITIONS", "capacity must be at least 1"));
        }
        if self.target_profit_bps == 0 || self.stop_loss_bps == 0 {
            return Err(EngineError::config(
                "TARGET_PROFIT_BPS",
                "profit target and stop loss must both be non-zero",
            ));
        }
        if self.exit_slippage_bps < self.entry_slippage_bps {
            return Err(EngineError::config(
                "EXIT_SLIPPAGE_BPS",
                "exit slippage must be at least the entry slippage",
            ));
        }
        for cycle in &self.triangular_cycles {
            validate_cycle(cycle)?;
        }
        Ok(())
    }
}

/// A cycle must return to its start and take at least three hops.
pub fn validate_cycle(cycle: &[String]) -> EngineResult<()> {
    let route = cycle.join(">");
    if cycle.len() < 4 {
        return Err(EngineError::InvalidPath {
            route,
            reason: "a cycle needs at least three hops".to_string(),
        });
    }
    if cycle.first() != cycle.last() {
        return Err(EngineError::InvalidPath {
            route,
            reason: "a cycle must start and end on the same token".to_string(),
        });
    }
    if cycle.windows(2).any(|w| w[0] == w[1]) {
        return Err(EngineError::InvalidPath {
            route,
            reason: "consecutive hops repeat a token".to_string(),
        });
    }
    Ok(())
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_fee_tiers(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|s| {
            let s = s.trim();
            match s.parse::<u32>() {
                Ok(tier) if tier > 0 => Some(tier),
                _ => {
                    if !s.is_empty() {
                        warn!("Skipping malformed fee tier: {}", s);
                    }
                    None
                }
            }
        })
        .collect()
}

/// Parses `A/B:fee,...`; the fee defaults to 3000 when omitted.
pub fn parse_pools(raw: &str) -> Vec<PoolPair> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| match parse_pool(entry) {
            Some(pool) => Some(pool),
            None => {
                warn!("Skipping malformed pool entry: {}", entry);
                None
            }
        })
        .collect()
}

fn parse_pool(entry: &str) -> Option<PoolPair> {
    let (pair, fee) = match entry.split_once(':') {
        Some((pair, fee)) => (pair, fee.trim().parse::<u32>().ok()?),
        None => (entry, 3000),
    };
    let (a, b) = pair.split_once('/')?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() || a == b || fee == 0 {
        return None;
    }
    Some(PoolPair::new(a, b, fee))
}

/// Parses `A>B>C>A;...`.
pub fn parse_cycles(raw: &str) -> Vec<Vec<String>> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| {
            let cycle: Vec<String> = entry.split('>').map(|t| t.trim().to_string()).collect();
            match validate_cycle(&cycle) {
                Ok(()) => Some(cycle),
                Err(e) => {
                    warn!("Skipping triangular cycle: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Parses `A/B:fee=reserveA:reserveB,...`.
pub fn parse_reserves(raw: &str) -> Vec<ReserveSeed> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| {
            let seed = entry.split_once('=').and_then(|(pool, reserves)| {
                let pool = parse_pool(pool.trim())?;
                let (ra, rb) = reserves.split_once(':')?;
                let reserve_a = Decimal::from_str(ra.trim()).ok()?;
                let reserve_b = Decimal::from_str(rb.trim()).ok()?;
                (reserve_a > Decimal::ZERO && reserve_b > Decimal::ZERO).then_some(ReserveSeed {
                    pool,
                    reserve_a,
                    reserve_b,
                })
            });
            if seed.is_none() {
                warn!("Skipping malformed reserve entry: {}", entry);
            }
            seed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_documented_values() {
        let config = Config::default();
        assert_eq!(config.position_size, dec!(5));
        assert_eq!(config.max_positions, 3);
        assert_eq!(config.target_profit_bps, 200);
        assert_eq!(config.stop_loss_bps, 100);
        assert_eq!(config.max_hold_secs, 3600);
        assert_eq!(config.scan_interval_secs, 30);
        assert_eq!(config.fee_tiers, vec![500, 3000, 10000]);
        assert!(config.dry_run);
        assert_eq!(config.triangular_cycles.len(), 3);
        assert!(config.exit_slippage_bps > config.entry_slippage_bps);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_and_clamps_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("POSITION_SIZE", "12.5"),
            ("MAX_POSITIONS", "500"),
            ("ENTRY_SLIPPAGE_BPS", "80"),
            ("EXIT_SLIPPAGE_BPS", "20"),
            ("DRY_RUN", "false"),
            ("POOLS", "ARB/WETH:500, bogus, USDC/USDC:3000, OP/USDC"),
        ]));
        assert_eq!(config.position_size, dec!(12.5));
        assert_eq!(config.max_positions, MAX_POSITIONS_LIMIT);
        assert_eq!(config.exit_slippage_bps, 80);
        assert!(!config.dry_run);
        assert_eq!(
            config.pools,
            vec![PoolPair::new("ARB", "WETH", 500), PoolPair::new("OP", "USDC", 3000)]
        );
    }

    #[test]
    fn cycles_must_close_with_three_hops() {
        let cycles = parse_cycles("USDC>WETH>DAI>USDC; USDC>WETH>USDC; USDC>WETH>DAI>WBTC");
        assert_eq!(cycles, vec![vec!["USDC", "WETH", "DAI", "USDC"]]);

        let open = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        assert!(matches!(validate_cycle(&open), Err(EngineError::InvalidPath { .. })));
    }

    #[test]
    fn empty_pool_universe_fails_validation() {
        let config = Config::from_lookup(lookup_from(&[("POOLS", "nonsense")]));
        assert!(matches!(config.validate(), Err(EngineError::Config { .. })));
    }

    #[test]
    fn parses_reserve_seeds() {
        let seeds = parse_reserves("WETH/USDC:500=10:35000, WETH/DAI=oops");
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].pool, PoolPair::new("WETH", "USDC", 500));
        assert_eq!(seeds[0].reserve_b, dec!(35000));
    }
}
