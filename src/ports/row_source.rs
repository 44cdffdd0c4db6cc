//! Raw export row source port.

use crate::domain::error::FlowError;

/// One export file worth of raw rows. The first row is the header.
#[derive(Debug, Clone, Default)]
pub struct RowBatch {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl RowBatch {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Number of rows excluding the header.
    pub fn data_rows(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

pub trait RowSource {
    /// All available batches. Batch order carries no meaning.
    fn fetch_batches(&self) -> Result<Vec<RowBatch>, FlowError>;
}
