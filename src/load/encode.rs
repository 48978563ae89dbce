use anyhow::{anyhow, bail, Result};
use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        TimestampMicrosecondArray,
    },
    datatypes::{DataType, TimeUnit},
    record_batch::RecordBatch,
};
use bytes::Bytes;

/// Buffer size at which encoded rows are handed to the COPY stream.
pub const COPY_CHUNK_BYTES: usize = 1024 * 1024;

const NULL_MARKER: &str = "\\N";

/// Typed view of one column, resolved once per batch.
enum Column<'a> {
    Bool(&'a BooleanArray),
    Int(&'a Int64Array),
    Float(&'a Float64Array),
    Text(&'a StringArray),
    Date(&'a Date32Array),
    Timestamp(&'a TimestampMicrosecondArray),
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("unexpected array layout for {:?}", array.data_type()))
}

impl<'a> Column<'a> {
    fn new(array: &'a ArrayRef) -> Result<Self> {
        Ok(match array.data_type() {
            DataType::Boolean => Column::Bool(downcast(array)?),
            DataType::Int64 => Column::Int(downcast(array)?),
            DataType::Float64 => Column::Float(downcast(array)?),
            DataType::Utf8 => Column::Text(downcast(array)?),
            DataType::Date32 => Column::Date(downcast(array)?),
            DataType::Timestamp(TimeUnit::Microsecond, _) => Column::Timestamp(downcast(array)?),
            other => bail!("cannot encode arrow type {:?} for COPY", other),
        })
    }

    fn is_null(&self, row: usize) -> bool {
        match self {
            Column::Bool(a) => a.is_null(row),
            Column::Int(a) => a.is_null(row),
            Column::Float(a) => a.is_null(row),
            Column::Text(a) => a.is_null(row),
            Column::Date(a) => a.is_null(row),
            Column::Timestamp(a) => a.is_null(row),
        }
    }

    fn write(&self, row: usize, out: &mut String) -> Result<()> {
        if self.is_null(row) {
            out.push_str(NULL_MARKER);
            return Ok(());
        }
        match self {
            Column::Bool(a) => out.push_str(if a.value(row) { "true" } else { "false" }),
            Column::Int(a) => out.push_str(&a.value(row).to_string()),
            Column::Float(a) => write_float(a.value(row), out),
            Column::Text(a) => write_quoted(a.value(row), out),
            Column::Date(a) => {
                let date = a
                    .value_as_date(row)
                    .ok_or_else(|| anyhow!("date out of range at row {}", row))?;
                out.push_str(&date.format("%Y-%m-%d").to_string());
            }
            Column::Timestamp(a) => {
                let ts = a
                    .value_as_datetime(row)
                    .ok_or_else(|| anyhow!("timestamp out of range at row {}", row))?;
                out.push_str(&ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string());
            }
        }
        Ok(())
    }
}

fn write_float(v: f64, out: &mut String) {
    if v.is_nan() {
        out.push_str("NaN");
    } else if v.is_infinite() {
        out.push_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        out.push_str(ryu::Buffer::new().format_finite(v));
    }
}

/// Quote as a CSV field. Quoted fields never match the unquoted `\N` marker,
/// so text that happens to read `\N` survives.
fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Encode `batch` as COPY CSV rows, split into chunks of roughly
/// `chunk_bytes`. Row boundaries are never split across chunks.
pub fn encode_batch(batch: &RecordBatch, chunk_bytes: usize) -> Result<Vec<Bytes>> {
    let columns = batch
        .columns()
        .iter()
        .map(Column::new)
        .collect::<Result<Vec<_>>>()?;

    let mut chunks = Vec::new();
    let mut buf = String::with_capacity(chunk_bytes.min(COPY_CHUNK_BYTES));

    for row in 0..batch.num_rows() {
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                buf.push(',');
            }
            col.write(row, &mut buf)?;
        }
        buf.push('\n');

        if buf.len() >= chunk_bytes {
            chunks.push(Bytes::from(std::mem::take(&mut buf)));
        }
    }
    if !buf.is_empty() {
        chunks.push(Bytes::from(buf));
    }

    Ok(chunks)
}
