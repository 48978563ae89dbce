// src/load/mod.rs
pub mod ddl;
pub mod encode;
pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use anyhow::Result;
use arrow::{datatypes::Schema, record_batch::RecordBatch};
use async_trait::async_trait;

pub use postgres::{PgParams, PgSink};

/// Destination for a single named table.
#[async_trait]
pub trait TableSink: Send {
    /// Drop any existing table and create an empty one with `schema`'s columns.
    async fn replace_table(&mut self, schema: &Schema) -> Result<()>;

    /// Append every row of `batch` in order, returning the number written.
    async fn append(&mut self, batch: &RecordBatch) -> Result<u64>;
}
