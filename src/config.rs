// src/config.rs

use arrow::datatypes::{DataType, TimeUnit};
use once_cell::sync::Lazy;

/// Where the yellow taxi CSV releases live.
pub const URL_PREFIX: &str = "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/yellow";

/// Rows per batch handed to the loader.
pub const CHUNK_SIZE: usize = 100_000;

/// Records sampled when inferring types for columns without a declared type.
pub const INFER_MAX_RECORDS: usize = 1_000;

pub const DEFAULT_TABLE_NAME: &str = "yellow_taxi_data_click";

/// Declared type of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Nullable 64-bit integer. Integral float renderings like `"2.0"` are accepted.
    Int,
    Float,
    Text,
    Timestamp,
}

impl ColumnType {
    /// The arrow type a column of this kind ends up as once coerced.
    pub fn arrow_type(&self) -> DataType {
        match self {
            ColumnType::Int => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Text => DataType::Utf8,
            ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }
}

/// Static column layout: declared types plus the columns parsed as timestamps.
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub declared: Vec<(&'static str, ColumnType)>,
    pub timestamp_columns: Vec<&'static str>,
}

impl ColumnConfig {
    /// Look up the declared type for `name`. Timestamp columns win over the mapping.
    pub fn declared_type(&self, name: &str) -> Option<ColumnType> {
        if self.timestamp_columns.iter().any(|c| *c == name) {
            return Some(ColumnType::Timestamp);
        }
        self.declared
            .iter()
            .find(|(col, _)| *col == name)
            .map(|(_, ty)| *ty)
    }
}

/// Yellow taxi trip record layout, built once per process.
pub static TRIP_COLUMNS: Lazy<ColumnConfig> = Lazy::new(|| ColumnConfig {
    declared: vec![
        ("VendorID", ColumnType::Int),
        ("passenger_count", ColumnType::Int),
        ("trip_distance", ColumnType::Float),
        ("RatecodeID", ColumnType::Int),
        ("store_and_fwd_flag", ColumnType::Text),
        ("PULocationID", ColumnType::Int),
        ("DOLocationID", ColumnType::Int),
        ("payment_type", ColumnType::Int),
        ("fare_amount", ColumnType::Float),
        ("extra", ColumnType::Float),
        ("mta_tax", ColumnType::Float),
        ("tip_amount", ColumnType::Float),
        ("tolls_amount", ColumnType::Float),
        ("improvement_surcharge", ColumnType::Float),
        ("total_amount", ColumnType::Float),
        ("congestion_surcharge", ColumnType::Float),
    ],
    timestamp_columns: vec!["tpep_pickup_datetime", "tpep_dropoff_datetime"],
});
