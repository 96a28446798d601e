//! Deterministic venue driven by a fixed quote table, for replays and tests

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use super::{Quote, QuoteRequest, SwapGateway, SwapOutcome, SwapRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuoteRule {
    /// Same output whatever the input.
    Fixed(Decimal),
    /// Output = input × rate.
    Rate(Decimal),
}

impl QuoteRule {
    fn apply(&self, amount_in: Decimal) -> Decimal {
        match self {
            QuoteRule::Fixed(out) => *out,
            QuoteRule::Rate(rate) => amount_in * rate,
        }
    }
}

type RouteKey = (String, String, u32);

#[derive(Default)]
struct ScriptState {
    rules: HashMap<RouteKey, QuoteRule>,
    failing_swaps: HashSet<(String, String)>,
    quotes: Vec<QuoteRequest>,
    swaps: Vec<SwapRequest>,
    next_tx: u64,
}

/// Routes without a rule have no liquidity. Swaps fill at the quoted output unless the
/// direction was marked failing or the output is under `min_amount_out`.
#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptState>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed(self, token_in: &str, token_out: &str, fee_tier: u32, amount_out: Decimal) -> Self {
        self.set_rule(token_in, token_out, fee_tier, QuoteRule::Fixed(amount_out));
        self
    }

    pub fn with_rate(self, token_in: &str, token_out: &str, fee_tier: u32, rate: Decimal) -> Self {
        self.set_rule(token_in, token_out, fee_tier, QuoteRule::Rate(rate));
        self
    }

    pub fn set_rule(&self, token_in: &str, token_out: &str, fee_tier: u32, rule: QuoteRule) {
        self.lock()
            .rules
            .insert((token_in.to_string(), token_out.to_string(), fee_tier), rule);
    }

    pub fn remove_rule(&self, token_in: &str, token_out: &str, fee_tier: u32) {
        self.lock()
            .rules
            .remove(&(token_in.to_string(), token_out.to_string(), fee_tier));
    }

    pub fn fail_swaps(&self, token_in: &str, token_out: &str) {
        self.lock()
            .failing_swaps
            .insert((token_in.to_string(), token_out.to_string()));
    }

    pub fn restore_swaps(&self, token_in: &str, token_out: &str) {
        self.lock()
            .failing_swaps
            .remove(&(token_in.to_string(), token_out.to_string()));
    }

    pub fn quote_log(&self) -> Vec<QuoteRequest> {
        self.lock().quotes.clone()
    }

    pub fn swap_log(&self) -> Vec<SwapRequest> {
        self.lock().swaps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        // A poisoned script only means a test panicked mid-call; the table is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SwapGateway for ScriptedGateway {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        let mut state = self.lock();
        state.quotes.push(request.clone());
        let rule = state
            .rules
            .get(&(request.token_in.clone(), request.token_out.clone(), request.fee_tier))
            .copied()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no liquidity for {} → {} @ {}",
                    request.token_in,
                    request.token_out,
                    request.fee_tier
                )
            })?;

        Ok(Quote {
            amount_out: rule.apply(request.amount_in),
            fee_tier: request.fee_tier,
        })
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapOutcome> {
        let mut state = self.lock();
        state.swaps.push(request.clone());

        if state
            .failing_swaps
            .contains(&(request.token_in.clone(), request.token_out.clone()))
        {
            return Ok(SwapOutcome::rejected("execution reverted"));
        }

        let Some(rule) = state
            .rules
            .get(&(request.token_in.clone(), request.token_out.clone(), request.fee_tier))
            .copied()
        else {
            return Ok(SwapOutcome::rejected("no liquidity"));
        };

        let amount_out = rule.apply(request.amount_in);
        if amount_out < request.min_amount_out {
            return Ok(SwapOutcome::rejected(format!(
                "output {} below minimum {}",
                amount_out, request.min_amount_out
            )));
        }

        state.next_tx += 1;
        Ok(SwapOutcome {
            success: true,
            transaction_id: Some(format!("0xscripted{:04}", state.next_tx)),
            actual_amount_out: Some(amount_out),
            error: None,
        })
    }
}
