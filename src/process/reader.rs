use crate::config::{ColumnConfig, INFER_MAX_RECORDS};
use crate::process::{convert::coerce_batch, schema::resolve_schema, schema::ResolvedSchema, source};
use anyhow::{bail, Context, Result};
use arrow::{
    csv::{reader::BufReader as CsvReader, ReaderBuilder},
    datatypes::SchemaRef,
    record_batch::RecordBatch,
};
use std::{io::BufRead, path::Path};
use tracing::{debug, instrument};

/// Lazy, finite sequence of typed batches over one CSV source.
///
/// Each call to `next` parses at most `batch_size` rows and coerces them to the
/// resolved schema. The reader owns its decoder: once consumed it cannot be
/// rewound, and after the first error it yields nothing more.
pub struct BatchReader {
    inner: CsvReader<Box<dyn BufRead + Send>>,
    resolved: ResolvedSchema,
    rows_read: usize,
    batches_read: usize,
    failed: bool,
}

impl BatchReader {
    /// Open `path` (plain or gzip CSV with a header row).
    ///
    /// The source is read twice: once for the header and a type sample, then
    /// again from the start for the actual batches.
    #[instrument(level = "info", skip(columns), fields(path = %path.display()))]
    pub fn open(path: &Path, columns: &ColumnConfig, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch size must be at least 1");
        }

        let resolved = resolve_schema(source::open_decoded(path)?, columns, INFER_MAX_RECORDS)
            .with_context(|| format!("resolving schema of {}", path.display()))?;

        let inner = ReaderBuilder::new(resolved.read.clone())
            .with_header(true)
            .with_batch_size(batch_size)
            .build_buffered(source::open_decoded(path)?)
            .context("creating CSV reader")?;

        debug!(
            columns = resolved.target.fields().len(),
            batch_size, "CSV reader ready"
        );

        Ok(Self {
            inner,
            resolved,
            rows_read: 0,
            batches_read: 0,
            failed: false,
        })
    }

    /// Schema every yielded batch conforms to.
    pub fn schema(&self) -> SchemaRef {
        self.resolved.target.clone()
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl Iterator for BatchReader {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let batch_no = self.batches_read;
        let result = match self.inner.next()? {
            Ok(raw) => {
                let first_row = self.rows_read + 1;
                self.rows_read += raw.num_rows();
                self.batches_read += 1;
                coerce_batch(raw, &self.resolved, first_row)
            }
            Err(e) => Err(e.into()),
        };

        if result.is_err() {
            self.failed = true;
        }
        Some(result.with_context(|| format!("reading CSV batch {}", batch_no)))
    }
}
