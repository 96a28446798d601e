//! Pool universe types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pool in the scanned universe: two tokens and the fee tier the pool trades at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolPair {
    pub token_a: String,
    pub token_b: String,
    pub fee_tier: u32,
}

impl PoolPair {
    pub fn new(token_a: impl Into<String>, token_b: impl Into<String>, fee_tier: u32) -> Self {
        Self {
            token_a: token_a.into(),
            token_b: token_b.into(),
            fee_tier,
        }
    }

    pub fn key(&self) -> PoolKey {
        PoolKey::new(&self.token_a, &self.token_b)
    }

    /// True when the pool connects `x` and `y`, in either direction.
    pub fn connects(&self, x: &str, y: &str) -> bool {
        (self.token_a == x && self.token_b == y) || (self.token_a == y && self.token_b == x)
    }
}

impl fmt::Display for PoolPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.token_a, self.token_b, self.fee_tier)
    }
}

/// Canonical (sorted) token pair. Both orderings of a pair map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    first: String,
    second: String,
}

impl PoolKey {
    pub fn new(x: &str, y: &str) -> Self {
        let (first, second) = if x <= y { (x, y) } else { (y, x) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn tokens(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }

    pub fn matches(&self, x: &str, y: &str) -> bool {
        *self == PoolKey::new(x, y)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_key_is_order_independent() {
        assert_eq!(PoolKey::new("WETH", "USDC"), PoolKey::new("USDC", "WETH"));
        assert!(PoolKey::new("WETH", "USDC").matches("USDC", "WETH"));
        assert!(!PoolKey::new("WETH", "USDC").matches("WETH", "DAI"));
    }

    #[test]
    fn pool_pair_connects_both_directions() {
        let pool = PoolPair::new("WETH", "DAI", 3000);
        assert!(pool.connects("DAI", "WETH"));
        assert!(pool.connects("WETH", "DAI"));
        assert!(!pool.connects("WETH", "USDC"));
        assert_eq!(pool.to_string(), "WETH/DAI@3000");
    }
}
