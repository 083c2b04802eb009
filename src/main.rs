//! pushdown - translate client expressions and run pushed-down scans

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use log::info;
use arrow::util::pretty::pretty_format_batches;
use pushdown::access::RecordBatch;
use pushdown::config::{CallPolicy, EndOfTable, ScanConfig, TranslatorConfig};
use pushdown::expression::{QueryBuilder, Translator};
use pushdown::scan::{open_scan, ScanOptions};
use pushdown::storage::AsOf;

/// Predicate pushdown for versioned columnar tables
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the query an expression compiles to
    Translate {
        /// Expression in the client engine's syntax
        expr: String,

        /// Fail on calls to unknown functions instead of ignoring them
        #[arg(long)]
        strict_calls: bool,

        /// Name of the column accessor function
        #[arg(long)]
        accessor: Option<String>,
    },

    /// Scan a table and print each batch
    Scan {
        /// Connection URI (mem://NAME or file://DIR)
        #[arg(long)]
        uri: String,

        #[arg(long)]
        collection: String,

        #[arg(long)]
        table: String,

        /// Read this version id
        #[arg(long, conflicts_with = "snapshot")]
        version: Option<u64>,

        /// Read the version pinned under this label
        #[arg(long)]
        snapshot: Option<String>,

        /// Comma-separated columns to return
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Filter expression to push down
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of rows to return
        #[arg(long)]
        limit: Option<usize>,

        /// Underlying rows per range read
        #[arg(long)]
        batch_size: Option<usize>,

        /// Detect the end of the table from its row count
        #[arg(long)]
        row_count_end: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Translate {
            expr,
            strict_calls,
            accessor,
        } => {
            let mut config = TranslatorConfig::from_env();
            if strict_calls {
                config.unknown_calls = CallPolicy::Strict;
            }
            if let Some(accessor) = accessor {
                config.column_accessor = accessor;
            }
            let query = Translator::with_config(config)
                .translate(&expr, QueryBuilder::new())
                .with_context(|| format!("Failed to translate {:?}", expr))?;
            println!("{}", query);
        }

        Command::Scan {
            uri,
            collection,
            table,
            version,
            snapshot,
            columns,
            filter,
            limit,
            batch_size,
            row_count_end,
        } => {
            let as_of = match (version, snapshot) {
                (Some(version), _) => Some(AsOf::Version(version)),
                (None, Some(label)) => Some(AsOf::Snapshot(label)),
                (None, None) => None,
            };

            let mut config = ScanConfig::from_env();
            if row_count_end {
                config.end_of_table = EndOfTable::RowCount;
            }

            let handle = open_scan(&uri, &collection, &table, as_of)
                .with_context(|| format!("Failed to open {}/{} at {}", collection, table, uri))?;
            info!(
                "Scanning {}/{} version {} ({} columns)",
                collection,
                table,
                handle.version(),
                handle.schema().fields().len()
            );

            let options = ScanOptions {
                with_columns: columns,
                predicate: filter,
                n_rows: limit,
                batch_size,
            };
            let stream = handle
                .scan_with(config)
                .open(options)
                .context("Failed to start scan")?;

            let mut total = 0;
            for (index, batch) in stream.enumerate() {
                let batch: RecordBatch = batch.context("Scan failed")?;
                total += batch.num_rows();
                println!("-- batch {} ({} rows)", index, batch.num_rows());
                println!("{}", pretty_format_batches(&[batch])?);
            }
            info!("Scanned {} rows", total);
        }
    }

    Ok(())
}
