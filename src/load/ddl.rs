// src/load/ddl.rs

use anyhow::{bail, Result};
use arrow::datatypes::{DataType, Schema};

/// Quote a PostgreSQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Map an arrow column type onto the PostgreSQL column type it is stored as.
pub fn pg_type(dt: &DataType) -> Result<&'static str> {
    Ok(match dt {
        DataType::Boolean => "BOOLEAN",
        DataType::Int64 => "BIGINT",
        DataType::Float64 => "DOUBLE PRECISION",
        DataType::Utf8 => "TEXT",
        DataType::Date32 => "DATE",
        DataType::Timestamp(_, None) => "TIMESTAMP",
        DataType::Timestamp(_, Some(_)) => "TIMESTAMPTZ",
        other => bail!("no PostgreSQL column type for arrow type {:?}", other),
    })
}

/// `CREATE TABLE` for `schema`'s columns, in order.
pub fn create_table_sql(table: &str, schema: &Schema) -> Result<String> {
    if schema.fields().is_empty() {
        bail!("cannot create table {} without columns", table);
    }
    let columns = schema
        .fields()
        .iter()
        .map(|f| Ok(format!("{} {}", quote_ident(f.name()), pg_type(f.data_type())?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n)",
        quote_ident(table),
        columns.join(",\n    ")
    ))
}

/// Drop-and-create script run when the destination is (re)initialised.
pub fn replace_table_sql(table: &str, schema: &Schema) -> Result<String> {
    Ok(format!(
        "DROP TABLE IF EXISTS {};\n{};",
        quote_ident(table),
        create_table_sql(table, schema)?
    ))
}

/// `COPY ... FROM STDIN` in CSV format with `\N` as the null marker.
pub fn copy_in_sql(table: &str, schema: &Schema) -> String {
    let columns = schema
        .fields()
        .iter()
        .map(|f| quote_ident(f.name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT csv, NULL '\\N')",
        quote_ident(table),
        columns
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, TimeUnit};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("VendorID", DataType::Int64, true),
            Field::new(
                "tpep_pickup_datetime",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("fare_amount", DataType::Float64, true),
            Field::new("store_and_fwd_flag", DataType::Utf8, true),
        ])
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("VendorID"), "\"VendorID\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn create_table_keeps_column_order_and_types() -> Result<()> {
        let sql = create_table_sql("yellow_taxi_data", &schema())?;
        assert_eq!(
            sql,
            "CREATE TABLE \"yellow_taxi_data\" (\n    \"VendorID\" BIGINT,\n    \"tpep_pickup_datetime\" TIMESTAMP,\n    \"fare_amount\" DOUBLE PRECISION,\n    \"store_and_fwd_flag\" TEXT\n)"
        );
        Ok(())
    }

    #[test]
    fn replace_drops_first() -> Result<()> {
        let sql = replace_table_sql("t", &schema())?;
        assert!(sql.starts_with("DROP TABLE IF EXISTS \"t\";\nCREATE TABLE \"t\""));
        Ok(())
    }

    #[test]
    fn copy_statement_lists_columns() {
        assert_eq!(
            copy_in_sql("t", &schema()),
            "COPY \"t\" (\"VendorID\", \"tpep_pickup_datetime\", \"fare_amount\", \"store_and_fwd_flag\") FROM STDIN WITH (FORMAT csv, NULL '\\N')"
        );
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let schema = Schema::new(vec![Field::new("blob", DataType::Binary, true)]);
        assert!(create_table_sql("t", &schema).is_err());
        assert!(create_table_sql("t", &Schema::empty()).is_err());
    }
}
