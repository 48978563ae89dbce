use anyhow::Result;
use clap::Parser;
use taxi_ingest::{
    config::DEFAULT_TABLE_NAME,
    load::PgParams,
    pipeline::{self, RunParams},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Load one month of NYC yellow taxi trip records into PostgreSQL.
#[derive(Parser)]
#[command(name = "taxi-ingest", version)]
struct Args {
    /// Postgres user
    #[arg(long)]
    pg_user: String,
    /// Postgres password
    #[arg(long)]
    pg_password: String,
    /// Postgres host
    #[arg(long)]
    pg_host: String,
    /// Postgres port
    #[arg(long, default_value_t = 5432)]
    pg_port: u16,
    /// Postgres database name
    #[arg(long)]
    pg_database: String,
    /// Target table name; replaced if it already exists
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    table_name: String,
    /// Data year (e.g. 2021)
    #[arg(long)]
    year: i32,
    /// Data month (1-12)
    #[arg(long)]
    month: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let params = RunParams {
        pg: PgParams {
            user: args.pg_user,
            password: args.pg_password,
            host: args.pg_host,
            port: args.pg_port,
            database: args.pg_database,
        },
        table_name: args.table_name,
        year: args.year,
        month: args.month,
    };

    let summary = pipeline::run(&params).await?;
    info!(summary = %serde_json::to_string(&summary)?, "done");
    println!("Ingestion completed successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 13] = [
        "taxi-ingest",
        "--pg-user",
        "root",
        "--pg-password",
        "secret",
        "--pg-host",
        "localhost",
        "--pg-database",
        "ny_taxi",
        "--year",
        "2021",
        "--month",
        "1",
    ];

    fn without(flag: &str) -> Vec<&'static str> {
        let mut args = Vec::new();
        let mut iter = REQUIRED.iter();
        while let Some(arg) = iter.next() {
            if *arg == flag {
                iter.next();
                continue;
            }
            args.push(*arg);
        }
        args
    }

    #[test]
    fn required_flags_and_defaults() -> Result<()> {
        let args = Args::try_parse_from(REQUIRED)?;
        assert_eq!(args.pg_user, "root");
        assert_eq!(args.pg_password, "secret");
        assert_eq!(args.pg_host, "localhost");
        assert_eq!(args.pg_database, "ny_taxi");
        assert_eq!(args.year, 2021);
        assert_eq!(args.month, 1);
        assert_eq!(args.pg_port, 5432);
        assert_eq!(args.table_name, "yellow_taxi_data_click");
        Ok(())
    }

    #[test]
    fn overrides_port_and_table() -> Result<()> {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--pg-port", "6543", "--table-name", "trips"]);
        let args = Args::try_parse_from(argv)?;
        assert_eq!(args.pg_port, 6543);
        assert_eq!(args.table_name, "trips");
        Ok(())
    }

    #[test]
    fn missing_required_flags_are_rejected() {
        for flag in ["--pg-user", "--pg-password", "--pg-host", "--pg-database", "--year", "--month"] {
            assert!(Args::try_parse_from(without(flag)).is_err(), "{} should be required", flag);
        }
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        let mut argv = without("--year");
        argv.extend(["--year", "twenty"]);
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn every_flag_has_help() {
        let cmd = Args::command();
        for arg in cmd.get_arguments() {
            if matches!(arg.get_id().as_str(), "help" | "version") {
                continue;
            }
            assert!(arg.get_help().is_some(), "{} has no help text", arg.get_id());
        }
        cmd.debug_assert();
    }
}
