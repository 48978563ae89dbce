use crate::load::TableSink;
use anyhow::{bail, Result};
use arrow::{
    datatypes::{Schema, SchemaRef},
    record_batch::RecordBatch,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Replace(usize),
    Append(usize),
}

/// In-memory table used to observe what the pipeline writes.
#[derive(Default)]
pub struct MemorySink {
    pub schema: Option<SchemaRef>,
    pub batches: Vec<RecordBatch>,
    pub events: Vec<SinkEvent>,
    /// Fail the append with this zero-based index.
    pub fail_on_append: Option<usize>,
    appends: usize,
}

impl MemorySink {
    pub fn failing_on(append: usize) -> Self {
        Self {
            fail_on_append: Some(append),
            ..Default::default()
        }
    }

    pub fn rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

#[async_trait]
impl TableSink for MemorySink {
    async fn replace_table(&mut self, schema: &Schema) -> Result<()> {
        self.schema = Some(Arc::new(schema.clone()));
        self.batches.clear();
        self.events.push(SinkEvent::Replace(schema.fields().len()));
        Ok(())
    }

    async fn append(&mut self, batch: &RecordBatch) -> Result<u64> {
        let Some(schema) = &self.schema else {
            bail!("append before replace_table");
        };
        if batch.schema() != *schema {
            bail!("batch schema does not match the table");
        }
        let idx = self.appends;
        self.appends += 1;
        if self.fail_on_append == Some(idx) {
            bail!("injected failure on append {}", idx);
        }
        self.batches.push(batch.clone());
        self.events.push(SinkEvent::Append(batch.num_rows()));
        Ok(batch.num_rows() as u64)
    }
}
