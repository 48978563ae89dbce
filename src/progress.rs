use anyhow::Result;
use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::info;

/// Iterator adapter that logs batch and row counts as batches go by.
///
/// Counting happens when a batch is handed out, so the numbers report what
/// has been read, not what has been persisted.
pub struct Progress<I> {
    inner: I,
    label: &'static str,
    batches: usize,
    rows: usize,
    started: Instant,
    finished: bool,
}

impl<I> Progress<I> {
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<I> Iterator for Progress<I>
where
    I: Iterator<Item = Result<RecordBatch>>,
{
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(Ok(batch)) => {
                self.batches += 1;
                self.rows += batch.num_rows();
                info!(
                    label = self.label,
                    batch = self.batches,
                    rows = self.rows,
                    "batch read"
                );
                Some(Ok(batch))
            }
            Some(Err(e)) => Some(Err(e)),
            None => {
                if !self.finished {
                    self.finished = true;
                    info!(
                        label = self.label,
                        batches = self.batches,
                        rows = self.rows,
                        elapsed = ?self.started.elapsed(),
                        "all batches read"
                    );
                }
                None
            }
        }
    }
}

pub trait ProgressExt: Sized {
    fn with_progress(self, label: &'static str) -> Progress<Self>;
}

impl<I> ProgressExt for I
where
    I: Iterator<Item = Result<RecordBatch>>,
{
    fn with_progress(self, label: &'static str) -> Progress<Self> {
        Progress {
            inner: self,
            label,
            batches: 0,
            rows: 0,
            started: Instant::now(),
            finished: false,
        }
    }
}
