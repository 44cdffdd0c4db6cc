//! CSV export of the feature and metadata tables.
//!
//! Writes `features.csv` and `meta.csv` into the output directory. Both are
//! keyed by the group label in the first column.

use crate::domain::error::FlowError;
use crate::domain::features::{FeatureTable, MetaTable, FEATURE_COLUMNS, META_COLUMNS};
use crate::ports::feature_sink::FeatureSink;
use std::fs;
use std::path::{Path, PathBuf};

pub const FEATURES_FILE: &str = "features.csv";
pub const META_FILE: &str = "meta.csv";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn features_path(&self) -> PathBuf {
        self.output_dir.join(FEATURES_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.output_dir.join(META_FILE)
    }
}

fn write_table<'a, I>(path: &Path, columns: &[&str], rows: I) -> Result<(), FlowError>
where
    I: IntoIterator<Item = (&'a str, Vec<String>)>,
{
    let export_err = |e: csv::Error| FlowError::Export {
        reason: format!("{}: {}", path.display(), e),
    };
    let mut wtr = csv::Writer::from_path(path).map_err(export_err)?;

    wtr.write_record(std::iter::once("key").chain(columns.iter().copied()))
        .map_err(export_err)?;
    for (key, values) in rows {
        wtr.write_record(std::iter::once(key.to_string()).chain(values))
            .map_err(export_err)?;
    }
    wtr.flush().map_err(|e| FlowError::Export {
        reason: format!("{}: {}", path.display(), e),
    })
}

impl FeatureSink for CsvReportAdapter {
    fn write(&self, features: &FeatureTable, meta: &MetaTable) -> Result<(), FlowError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| FlowError::Export {
            reason: format!("failed to create {}: {}", self.output_dir.display(), e),
        })?;

        write_table(
            &self.features_path(),
            &FEATURE_COLUMNS,
            features
                .rows
                .iter()
                .map(|r| (r.key.as_str(), r.features.values())),
        )?;
        write_table(
            &self.meta_path(),
            &META_COLUMNS,
            meta.rows.iter().map(|r| (r.key.as_str(), r.meta.values())),
        )?;

        log::info!(
            "wrote {} feature rows to {}",
            features.len(),
            self.output_dir.display()
        );
        Ok(())
    }
}
