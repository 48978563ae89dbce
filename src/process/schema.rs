use crate::config::ColumnConfig;
use anyhow::{bail, Context, Result};
use arrow::{
    csv::reader::Format,
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
};
use std::{io::Read, sync::Arc};
use tracing::{debug, warn};

/// Schema of one CSV source, resolved from its header against the static
/// column configuration.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    /// Final, coerced schema: what every batch looks like after conversion.
    pub target: SchemaRef,
    /// Schema handed to the CSV parser. Integer columns are read as text here
    /// and coerced afterwards.
    pub read: SchemaRef,
    /// Positions of the columns that need integer coercion.
    pub int_columns: Vec<usize>,
}

/// Map an inferred arrow type onto the set of types the loader knows how to write.
fn normalize_inferred(dt: &DataType) -> DataType {
    match dt {
        DataType::Boolean | DataType::Float64 | DataType::Date32 | DataType::Utf8 => dt.clone(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 => DataType::Float64,
        DataType::Timestamp(_, _) => DataType::Timestamp(TimeUnit::Microsecond, None),
        _ => DataType::Utf8,
    }
}

/// Read the header (and a sample of records) from `reader` and resolve the
/// type of every column.
///
/// - declared columns keep their declared type, timestamp columns become
///   `Timestamp(µs)`;
/// - other header columns get a type inferred from the first `max_records`;
/// - a declared timestamp column missing from the header is an error.
pub fn resolve_schema<R: Read>(
    reader: R,
    columns: &ColumnConfig,
    max_records: usize,
) -> Result<ResolvedSchema> {
    let (inferred, sampled) = Format::default()
        .with_header(true)
        .infer_schema(reader, Some(max_records))
        .context("reading CSV header")?;

    if inferred.fields().is_empty() {
        bail!("CSV source has no header row");
    }
    debug!(columns = inferred.fields().len(), sampled, "inferred CSV schema");

    for ts in &columns.timestamp_columns {
        if inferred.field_with_name(ts).is_err() {
            bail!("timestamp column {:?} is missing from the CSV header", ts);
        }
    }
    for (name, _) in &columns.declared {
        if inferred.field_with_name(name).is_err() {
            warn!(column = %name, "declared column not present in CSV header; ignoring");
        }
    }

    let mut target_fields = Vec::with_capacity(inferred.fields().len());
    let mut read_fields = Vec::with_capacity(inferred.fields().len());
    let mut int_columns = Vec::new();

    for (idx, field) in inferred.fields().iter().enumerate() {
        let name = field.name();
        let target_type = match columns.declared_type(name) {
            Some(ty) => ty.arrow_type(),
            None => {
                let ty = normalize_inferred(field.data_type());
                debug!(column = %name, ?ty, "no declared type, using inferred");
                ty
            }
        };

        let read_type = if target_type == DataType::Int64 {
            int_columns.push(idx);
            DataType::Utf8
        } else {
            target_type.clone()
        };

        target_fields.push(Field::new(name, target_type, true));
        read_fields.push(Field::new(name, read_type, true));
    }

    Ok(ResolvedSchema {
        target: Arc::new(Schema::new(target_fields)),
        read: Arc::new(Schema::new(read_fields)),
        int_columns,
    })
}
