use crate::{
    config::{ColumnConfig, CHUNK_SIZE, TRIP_COLUMNS},
    fetch::{build_url, download_to_tempfile},
    load::{postgres, PgParams, PgSink, TableSink},
    process::BatchReader,
    progress::ProgressExt,
};
use anyhow::{Context, Result};
use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use reqwest::Client;
use serde::Serialize;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument};

/// Everything `run` needs: where to fetch from and where to write to.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub pg: PgParams,
    pub table_name: String,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub batches: usize,
    pub rows: u64,
    pub elapsed: Duration,
}

/// Open `path` on the blocking pool; schema inference reads and decompresses
/// the head of the file.
pub async fn open_reader(
    path: PathBuf,
    columns: &'static ColumnConfig,
    batch_size: usize,
) -> Result<BatchReader> {
    tokio::task::spawn_blocking(move || BatchReader::open(&path, columns, batch_size))
        .await
        .context("reader task failed")?
}

/// Pull one item from `iter` on the blocking pool and hand the iterator back.
async fn next_blocking<I>(mut iter: I) -> Result<(I, Option<I::Item>)>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let item = iter.next();
        (iter, item)
    })
    .await
    .context("reader task failed")
}

/// Write `batches` into `sink`.
///
/// The table is replaced right before the first batch is appended, using that
/// batch's schema. A source without data rows still gets an empty table built
/// from `schema`. Batches are parsed on the blocking pool and persisted one at
/// a time, in order; the first error ends the run with whatever was already
/// committed left in place.
#[instrument(level = "info", skip_all)]
pub async fn ingest<I, S>(batches: I, schema: SchemaRef, sink: &mut S) -> Result<IngestSummary>
where
    I: Iterator<Item = Result<RecordBatch>> + Send + 'static,
    S: TableSink + ?Sized,
{
    let started = Instant::now();
    let mut summary = IngestSummary {
        batches: 0,
        rows: 0,
        elapsed: Duration::ZERO,
    };

    let mut batches = batches.with_progress("ingest");
    loop {
        let (rest, next) = next_blocking(batches).await?;
        batches = rest;
        let Some(batch) = next else {
            break;
        };
        let batch = batch?;
        if summary.batches == 0 {
            sink.replace_table(&batch.schema())
                .await
                .context("creating destination table")?;
        }
        let written = sink
            .append(&batch)
            .await
            .with_context(|| format!("appending batch {}", summary.batches))?;
        summary.batches += 1;
        summary.rows += written;
        debug!(batch = summary.batches, written, "batch persisted");
    }

    if summary.batches == 0 {
        info!("source has no data rows; creating empty table");
        sink.replace_table(&schema)
            .await
            .context("creating destination table")?;
    }

    summary.elapsed = started.elapsed();
    Ok(summary)
}

/// Download one month of trip records and load it into PostgreSQL.
#[instrument(level = "info", skip_all, fields(year = params.year, month = params.month, table = %params.table_name))]
pub async fn run(params: &RunParams) -> Result<IngestSummary> {
    let url = build_url(params.year, params.month);
    info!(%url, "source");

    let client = Client::new();
    let file = download_to_tempfile(&client, &url)
        .await
        .with_context(|| format!("downloading {}", url))?;

    let reader = open_reader(file.path().to_path_buf(), &TRIP_COLUMNS, CHUNK_SIZE).await?;
    let schema = reader.schema();

    info!(db = %params.pg, "connecting");
    let pg = postgres::connect(&params.pg.url()?)
        .await
        .with_context(|| format!("connecting to {}", params.pg))?;
    let mut sink = PgSink::new(pg, params.table_name.clone());

    let summary = ingest(reader, schema, &mut sink).await?;
    info!(
        batches = summary.batches,
        rows = summary.rows,
        elapsed = ?summary.elapsed,
        "ingest finished"
    );
    Ok(summary)
}
