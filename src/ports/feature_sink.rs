//! Feature table sink port.

use crate::domain::error::FlowError;
use crate::domain::features::{FeatureTable, MetaTable};

/// Port for handing finished tables to storage or display.
pub trait FeatureSink {
    fn write(&self, features: &FeatureTable, meta: &MetaTable) -> Result<(), FlowError>;
}
