//! Load -> group -> aggregate, each stage fully materialised before the next.
//!
//! PipelineConfig holds the resolved run parameters (config file merged with
//! CLI overrides).

use crate::domain::error::FlowError;
use crate::domain::features::{build_feature_table, FeatureTable, MetaTable};
use crate::domain::grouping::{canonical_order, GroupBy, TradeGroups};
use crate::domain::loader::load_trades;
use crate::ports::row_source::RowSource;
use std::path::PathBuf;

pub const DEFAULT_SUFFIX: &str = ".csv";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
pub const DEFAULT_MODEL: &str = "svm";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub suffix: String,
    pub group_by: GroupBy,
    pub output_dir: Option<PathBuf>,
    pub preview_rows: usize,
    /// Model family; reported only, no training happens.
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub trade_count: usize,
    pub groups: TradeGroups,
    pub features: FeatureTable,
    pub meta: MetaTable,
}

/// Load and deduplicate, then group in canonical trade order.
pub fn group_trades(
    source: &dyn RowSource,
    group_by: GroupBy,
) -> Result<(usize, TradeGroups), FlowError> {
    let trades = load_trades(source)?;
    let groups = group_by.group(canonical_order(&trades));
    log::info!(
        "grouped {} trades into {} groups by {}",
        trades.len(),
        groups.len(),
        group_by
    );
    Ok((trades.len(), groups))
}

pub fn run_pipeline(source: &dyn RowSource, group_by: GroupBy) -> Result<PipelineOutput, FlowError> {
    let (trade_count, groups) = group_trades(source, group_by)?;
    let (features, meta) = build_feature_table(&groups)?;
    Ok(PipelineOutput {
        trade_count,
        groups,
        features,
        meta,
    })
}
