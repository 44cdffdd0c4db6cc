//! Partitioning trades into groups by contract or by ticker and expiry.

use crate::domain::trade::Trade;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Group key -> member trades in encounter order. Keys iterate sorted.
pub type TradeGroups = BTreeMap<String, Vec<Trade>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// `TICKER $STRIKE{c|p} MM/DD`
    Contract,
    /// `TICKER MM/DD{c|p}`
    #[default]
    TickerExpiry,
}

impl GroupBy {
    pub fn key(self, trade: &Trade) -> String {
        match self {
            GroupBy::Contract => trade.contract_label(),
            GroupBy::TickerExpiry => trade.ticker_expiry_label(),
        }
    }

    pub fn group<'a, I>(self, trades: I) -> TradeGroups
    where
        I: IntoIterator<Item = &'a Trade>,
    {
        let mut groups = TradeGroups::new();
        for trade in trades {
            groups
                .entry(self.key(trade))
                .or_default()
                .push(trade.clone());
        }
        groups
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contract" => Ok(GroupBy::Contract),
            "ticker_expiry" | "ticker-expiry" => Ok(GroupBy::TickerExpiry),
            other => Err(format!(
                "unknown grouping {other:?} (expected contract or ticker_expiry)"
            )),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Contract => write!(f, "contract"),
            GroupBy::TickerExpiry => write!(f, "ticker_expiry"),
        }
    }
}

pub fn group_by_contract<'a, I>(trades: I) -> TradeGroups
where
    I: IntoIterator<Item = &'a Trade>,
{
    GroupBy::Contract.group(trades)
}

pub fn group_by_ticker_expiry<'a, I>(trades: I) -> TradeGroups
where
    I: IntoIterator<Item = &'a Trade>,
{
    GroupBy::TickerExpiry.group(trades)
}

/// Trades from an unordered set in canonical order, so grouping and
/// tie-breaks come out the same on every run.
pub fn canonical_order(trades: &HashSet<Trade>) -> Vec<&Trade> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by(|a, b| a.canonical_cmp(b));
    ordered
}
