//! Per-group feature vectors and the auxiliary metadata table.
//!
//! Volume-weighted averages divide by the group's total volume; plain
//! averages divide by the trade count. Integer features use truncating
//! division. "Largest" members are picked stably: the first maximum in group
//! order wins a tie.

use crate::domain::error::FlowError;
use crate::domain::grouping::TradeGroups;
use crate::domain::trade::{format_strike, Trade};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Column names of [`FeatureVector`], in [`FeatureVector::values`] order.
pub const FEATURE_COLUMNS: [&str; 18] = [
    "dte",
    "total_vol",
    "av_vol",
    "max_vol",
    "total_prem",
    "av_prem",
    "max_prem",
    "oi",
    "spot",
    "price",
    "sector",
    "unusual",
    "num_trades",
    "dom",
    "dow",
    "mod",
    "moy",
    "av_percent_otm",
];

pub const META_COLUMNS: [&str; 2] = ["max_prem_strike", "max_prem_exp"];

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub dte: i64,
    pub total_vol: i64,
    pub av_vol: i64,
    pub max_vol: i64,
    pub total_prem: i64,
    pub av_prem: i64,
    pub max_prem: i64,
    pub oi: i64,
    pub spot: f64,
    pub price: f64,
    pub sector: String,
    pub unusual: usize,
    pub num_trades: usize,
    pub dom: i64,
    pub dow: String,
    /// Weighted minute of day (`mod` column).
    pub minute_of_day: i64,
    pub moy: u32,
    pub av_percent_otm: f64,
}

impl FeatureVector {
    pub fn compute(key: &str, trades: &[Trade]) -> Result<Self, FlowError> {
        let first = trades.first().ok_or_else(|| FlowError::EmptyGroup {
            key: key.to_string(),
        })?;
        let overflow = |quantity: &'static str| FlowError::AggregateOverflow {
            key: key.to_string(),
            quantity,
        };
        let checked_sum = |quantity: &'static str, value: fn(&Trade) -> i64| {
            trades
                .iter()
                .try_fold(0i64, |acc, t| acc.checked_add(value(t)))
                .ok_or_else(|| overflow(quantity))
        };

        let total_vol = checked_sum("total_vol", |t| t.volume)?;
        if total_vol == 0 {
            return Err(FlowError::ZeroWeight {
                key: key.to_string(),
            });
        }
        let count = trades.len() as i64;

        // An i64 * i64 product always fits in i128.
        let weighted_int = |quantity: &'static str, value: fn(&Trade) -> i64| {
            trades
                .iter()
                .try_fold(0i128, |acc, t| {
                    acc.checked_add(i128::from(value(t)) * i128::from(t.volume))
                })
                .and_then(|sum| i64::try_from(sum / i128::from(total_vol)).ok())
                .ok_or_else(|| overflow(quantity))
        };
        let weight = Decimal::from(total_vol);
        let weighted_dec = |quantity: &'static str, value: fn(&Trade) -> Decimal| {
            trades
                .iter()
                .try_fold(Decimal::ZERO, |acc, t| {
                    value(t)
                        .checked_mul(Decimal::from(t.volume))
                        .and_then(|v| acc.checked_add(v))
                })
                .and_then(|sum| sum.checked_div(weight))
                .map(|mean| mean.to_f64().unwrap_or(f64::NAN))
                .ok_or_else(|| overflow(quantity))
        };

        let total_prem = checked_sum("total_prem", |t| t.premium)?;
        let busiest = first_max_by_key(trades, |t| t.volume).unwrap_or(first);

        Ok(FeatureVector {
            dte: weighted_int("dte", Trade::dte_days)?,
            total_vol,
            av_vol: total_vol / count,
            max_vol: busiest.volume,
            total_prem,
            av_prem: total_prem / count,
            max_prem: trades.iter().map(|t| t.premium).max().unwrap_or_default(),
            oi: checked_sum("oi", |t| t.open_interest)?,
            spot: weighted_dec("spot", |t| t.spot)?,
            price: weighted_dec("price", |t| t.price)?,
            sector: first.sector.clone(),
            unusual: trades.iter().filter(|t| t.is_unusual).count(),
            num_trades: trades.len(),
            dom: weighted_int("dom", Trade::day_of_month)?,
            dow: busiest.day_of_week(),
            minute_of_day: weighted_int("mod", Trade::minute_of_day)?,
            moy: first.month_of_year(),
            av_percent_otm: weighted_dec("av_percent_otm", |t| t.percent_otm)?,
        })
    }

    /// Cell values in [`FEATURE_COLUMNS`] order.
    pub fn values(&self) -> Vec<String> {
        vec![
            self.dte.to_string(),
            self.total_vol.to_string(),
            self.av_vol.to_string(),
            self.max_vol.to_string(),
            self.total_prem.to_string(),
            self.av_prem.to_string(),
            self.max_prem.to_string(),
            self.oi.to_string(),
            self.spot.to_string(),
            self.price.to_string(),
            self.sector.clone(),
            self.unusual.to_string(),
            self.num_trades.to_string(),
            self.dom.to_string(),
            self.dow.clone(),
            self.minute_of_day.to_string(),
            self.moy.to_string(),
            self.av_percent_otm.to_string(),
        ]
    }
}

/// Describes the group's largest-premium trade. Not a model input.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMeta {
    pub max_prem_strike: Decimal,
    /// `MM/DD`
    pub max_prem_exp: String,
}

impl GroupMeta {
    pub fn compute(key: &str, trades: &[Trade]) -> Result<Self, FlowError> {
        let top = first_max_by_key(trades, |t| t.premium).ok_or_else(|| FlowError::EmptyGroup {
            key: key.to_string(),
        })?;
        Ok(GroupMeta {
            max_prem_strike: top.strike,
            max_prem_exp: top.expiry.format("%m/%d").to_string(),
        })
    }

    pub fn values(&self) -> Vec<String> {
        vec![format_strike(self.max_prem_strike), self.max_prem_exp.clone()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub key: String,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaRow {
    pub key: String,
    pub meta: GroupMeta,
}

/// Feature vectors in ascending group-key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FeatureVector> {
        self.rows
            .iter()
            .find(|r| r.key == key)
            .map(|r| &r.features)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaTable {
    pub rows: Vec<MetaRow>,
}

impl MetaTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&GroupMeta> {
        self.rows.iter().find(|r| r.key == key).map(|r| &r.meta)
    }
}

/// One pass over the groups producing a feature row and a metadata row each.
pub fn build_feature_table(groups: &TradeGroups) -> Result<(FeatureTable, MetaTable), FlowError> {
    let mut features = FeatureTable::default();
    let mut meta = MetaTable::default();

    for (key, trades) in groups {
        features.rows.push(FeatureRow {
            key: key.clone(),
            features: FeatureVector::compute(key, trades)?,
        });
        meta.rows.push(MetaRow {
            key: key.clone(),
            meta: GroupMeta::compute(key, trades)?,
        });
    }

    log::info!("built {} feature rows", features.len());
    Ok((features, meta))
}

/// First item holding the maximum key; later equal keys do not displace it.
fn first_max_by_key<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    items.iter().fold(None, |best, item| match best {
        Some(b) if key(b) >= key(item) => Some(b),
        _ => Some(item),
    })
}
