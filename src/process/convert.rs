use crate::process::schema::ResolvedSchema;
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Int64Builder, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;

// i64::MAX is not representable as f64; 2^63 is the first value out of range.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Parse an integer field. Whole-number float renderings (`"2.0"`, `"1e3"`)
/// are accepted; blank fields are null; everything else is rejected.
pub fn parse_int(raw: &str) -> Option<Option<i64>> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(None);
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(Some(v));
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&f) {
        Some(Some(f as i64))
    } else {
        None
    }
}

/// Convert the text-read integer columns of `batch` into `Int64`, producing a
/// batch shaped like `resolved.target`.
///
/// `first_row` is the 1-based data row number of the batch's first row, used
/// only to point at the offending record in errors.
pub fn coerce_batch(
    batch: RecordBatch,
    resolved: &ResolvedSchema,
    first_row: usize,
) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    for &idx in &resolved.int_columns {
        let name = resolved.target.field(idx).name();
        let text = columns[idx]
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                anyhow!(
                    "column {} was expected to be read as text, got {:?}",
                    name,
                    columns[idx].data_type()
                )
            })?;

        let mut builder = Int64Builder::with_capacity(text.len());
        for (row, value) in text.iter().enumerate() {
            match value {
                None => builder.append_null(),
                Some(raw) => {
                    let parsed = parse_int(raw).ok_or_else(|| {
                        anyhow!(
                            "column {}: cannot coerce {:?} to an integer at data row {} (CSV line {})",
                            name,
                            raw,
                            first_row + row,
                            first_row + row + 1
                        )
                    })?;
                    builder.append_option(parsed);
                }
            }
        }
        columns[idx] = Arc::new(builder.finish());
    }

    RecordBatch::try_new(resolved.target.clone(), columns).context("building coerced batch")
}
