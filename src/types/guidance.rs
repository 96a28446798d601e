//! Market guidance and cross-venue types

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Coarse market-regime label supplied by the guidance source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegimeLabel {
    ArbitrageFavorable,
    TrendFavorable,
    TriangularFavorable,
    Avoid,
    Hold,
    /// Any label the engine has no rule for; passes through without re-scoring.
    Other(String),
}

impl RegimeLabel {
    /// No new entries are allowed under this regime.
    pub fn blocks_entries(&self) -> bool {
        matches!(self, RegimeLabel::Avoid | RegimeLabel::Hold)
    }
}

impl FromStr for RegimeLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Ok(match normalized.as_str() {
            "arbitrage-favorable" | "arbitrage" => RegimeLabel::ArbitrageFavorable,
            "trend-favorable" | "trend" | "trending" => RegimeLabel::TrendFavorable,
            "triangular-favorable" | "triangular" | "triangular-potential" => {
                RegimeLabel::TriangularFavorable
            }
            "avoid" => RegimeLabel::Avoid,
            "hold" => RegimeLabel::Hold,
            _ => RegimeLabel::Other(normalized),
        })
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimeLabel::ArbitrageFavorable => f.write_str("arbitrage-favorable"),
            RegimeLabel::TrendFavorable => f.write_str("trend-favorable"),
            RegimeLabel::TriangularFavorable => f.write_str("triangular-favorable"),
            RegimeLabel::Avoid => f.write_str("avoid"),
            RegimeLabel::Hold => f.write_str("hold"),
            RegimeLabel::Other(label) => f.write_str(label),
        }
    }
}

/// Externally sourced candidate, surfaced for information only.
#[derive(Debug, Clone, Serialize)]
pub struct CrossVenueCandidate {
    pub pair: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub profit_bps: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_labels() {
        assert_eq!("avoid".parse::<RegimeLabel>().unwrap(), RegimeLabel::Avoid);
        assert_eq!(" HOLD ".parse::<RegimeLabel>().unwrap(), RegimeLabel::Hold);
        assert_eq!(
            "arbitrage_favorable".parse::<RegimeLabel>().unwrap(),
            RegimeLabel::ArbitrageFavorable
        );
        assert_eq!(
            "triangular-potential".parse::<RegimeLabel>().unwrap(),
            RegimeLabel::TriangularFavorable
        );
    }

    #[test]
    fn unknown_labels_pass_through() {
        let label: RegimeLabel = "sideways".parse().unwrap();
        assert_eq!(label, RegimeLabel::Other("sideways".to_string()));
        assert!(!label.blocks_entries());
        assert!(RegimeLabel::Avoid.blocks_entries());
    }
}
