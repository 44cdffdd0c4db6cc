#![allow(dead_code)]

use flowtrader::domain::error::FlowError;
use flowtrader::domain::trade::Trade;
use flowtrader::ports::row_source::{RowBatch, RowSource};
use std::path::Path;

pub const HEADER: [&str; 15] = [
    "Date", "Time", "Ticker", "Expiry", "Strike", "C/P", "Spot", "Qty", "Price", "Type", "Volume",
    "OI", "Premium", "Sector", "Unusual",
];

pub struct MockRowSource {
    pub batches: Vec<RowBatch>,
    pub missing: Option<String>,
}

impl MockRowSource {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            missing: None,
        }
    }

    pub fn with_batch(mut self, name: &str, rows: &[ExportRow]) -> Self {
        let mut all: Vec<Vec<String>> = vec![HEADER.iter().map(|h| h.to_string()).collect()];
        all.extend(rows.iter().map(ExportRow::fields));
        self.batches.push(RowBatch::new(name, all));
        self
    }

    pub fn with_raw_batch(mut self, name: &str, rows: Vec<Vec<String>>) -> Self {
        self.batches.push(RowBatch::new(name, rows));
        self
    }

    pub fn missing(mut self, path: &str) -> Self {
        self.missing = Some(path.to_string());
        self
    }
}

impl RowSource for MockRowSource {
    fn fetch_batches(&self) -> Result<Vec<RowBatch>, FlowError> {
        if let Some(path) = &self.missing {
            return Err(FlowError::MissingDataDirectory { path: path.clone() });
        }
        Ok(self.batches.clone())
    }
}

/// One export row; defaults to the reference XYZ call sweep.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub date: String,
    pub time: String,
    pub ticker: String,
    pub expiry: String,
    pub strike: String,
    pub side: String,
    pub spot: String,
    pub quantity: String,
    pub price: String,
    pub trade_type: String,
    pub volume: String,
    pub open_interest: String,
    pub premium: String,
    pub sector: String,
    pub unusual: String,
}

impl Default for ExportRow {
    fn default() -> Self {
        Self {
            date: "1/2/23".into(),
            time: "9:30:00.000".into(),
            ticker: "XYZ".into(),
            expiry: "2023-02-17".into(),
            strike: "100".into(),
            side: "CALLS".into(),
            spot: "95.0".into(),
            quantity: "10".into(),
            price: "1.20".into(),
            trade_type: "SWEEP".into(),
            volume: "50".into(),
            open_interest: "200".into(),
            premium: "$6,000".into(),
            sector: "Tech".into(),
            unusual: "FALSE".into(),
        }
    }
}

impl ExportRow {
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.time.clone(),
            self.ticker.clone(),
            self.expiry.clone(),
            self.strike.clone(),
            self.side.clone(),
            self.spot.clone(),
            self.quantity.clone(),
            self.price.clone(),
            self.trade_type.clone(),
            self.volume.clone(),
            self.open_interest.clone(),
            self.premium.clone(),
            self.sector.clone(),
            self.unusual.clone(),
        ]
    }

    pub fn trade(&self) -> Trade {
        Trade::from_fields(self.fields().as_slice()).unwrap()
    }
}

pub fn row(time: &str, volume: i64, premium: i64) -> ExportRow {
    ExportRow {
        time: time.into(),
        volume: volume.to_string(),
        premium: format!("${premium}"),
        ..ExportRow::default()
    }
}

/// Write an export file the way the vendor does: header row, quoted premiums.
pub fn write_export(dir: &Path, name: &str, rows: &[ExportRow]) {
    let mut wtr = csv::Writer::from_path(dir.join(name)).unwrap();
    wtr.write_record(HEADER).unwrap();
    for r in rows {
        wtr.write_record(r.fields()).unwrap();
    }
    wtr.flush().unwrap();
}
