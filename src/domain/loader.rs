//! Deduplicating load of export rows into a set of trades.
//!
//! Exports routinely overlap, so the same trade can appear in several
//! batches. Collecting into a `HashSet<Trade>` keyed on [`Trade::identity`]
//! collapses those repeats. A malformed row aborts the whole load.

use crate::domain::error::FlowError;
use crate::domain::trade::Trade;
use crate::ports::row_source::{RowBatch, RowSource};
use std::collections::HashSet;

pub fn load_trades(source: &dyn RowSource) -> Result<HashSet<Trade>, FlowError> {
    let batches = source.fetch_batches()?;
    dedup_batches(&batches)
}

pub fn dedup_batches(batches: &[RowBatch]) -> Result<HashSet<Trade>, FlowError> {
    let mut trades = HashSet::new();
    let mut rows_read = 0usize;

    for batch in batches {
        let before = trades.len();
        // Row 0 is the header; line numbers are 1-based.
        for (index, row) in batch.rows.iter().enumerate().skip(1) {
            let trade = Trade::from_fields(row.as_slice()).map_err(|reason| FlowError::MalformedRecord {
                source_name: batch.name.clone(),
                line: index + 1,
                reason,
            })?;
            trades.insert(trade);
        }
        rows_read += batch.data_rows();
        log::debug!(
            "{}: {} rows, {} new trades",
            batch.name,
            batch.data_rows(),
            trades.len() - before
        );
    }

    log::info!(
        "loaded {} distinct trades from {} rows across {} batches ({} duplicates)",
        trades.len(),
        rows_read,
        batches.len(),
        rows_read - trades.len()
    );
    Ok(trades)
}
