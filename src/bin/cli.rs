//! RecFile CLI
//!
//! Command-line interface for creating, loading, searching, and joining
//! record files.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use recfile::join::{HeapFileSource, JoinDriver, Row};
use recfile::loader::{BulkLoader, TableDefinition};
use recfile::{Config, HeapFile, RecFileError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// RecFile CLI
#[derive(Parser, Debug)]
#[command(name = "recfile-cli")]
#[command(about = "Block-based record files with range search and merge join")]
#[command(version)]
struct Args {
    /// Directory holding table files
    #[arg(short, long, default_value = "./recfile_data")]
    data_dir: String,

    /// Field width (bytes) used for join output files
    #[arg(long, default_value = "32")]
    join_width: u32,

    /// Differing rows shown per side by `validate`
    #[arg(long, default_value = "10")]
    preview: usize,

    /// Accept duplicate search keys during bulk insert
    #[arg(long)]
    allow_duplicates: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a table file from a configuration file
    Create {
        /// File whose first line is `name;count;names...;lengths...`
        config: PathBuf,
    },

    /// Bulk insert records from a data file
    Insert {
        /// Table name (without extension)
        table: String,

        /// Data file with `label,v1;v2|v1;v2` lines
        data: PathBuf,
    },

    /// Print one field of every record in chain order
    SearchField {
        table: String,
        field: String,
    },

    /// Print records whose search key lies in [min, max]
    SearchRange {
        table: String,
        min: String,
        max: String,
    },

    /// Show a table's schema header
    Schema {
        table: String,
    },

    /// Merge-join two tables into a new table
    Join {
        left: String,
        right: String,
        /// Join key column name
        key: String,
        /// Output table name
        output: String,
    },

    /// Compare the merge join with a reference result file
    Validate {
        /// File of pipe-separated rows, one per line
        reference: PathBuf,
        left: String,
        right: String,
        key: String,
        /// Also print every distinct row of both results
        #[arg(long)]
        full: bool,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recfile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .join_field_width(args.join_width)
        .validation_preview_limit(args.preview)
        .allow_duplicate_keys(args.allow_duplicates)
        .build();

    if let Err(e) = run(args.command, &config) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Create { config: path } => {
            let definition = TableDefinition::from_file(&path)?;
            let (heap, _) = definition.create(config)?;
            println!("Created '{}' with {} fields", heap.path().display(), definition.fields.len());
        }

        Commands::Insert { table, data } => {
            let heap = HeapFile::open(config.table_path(&table));
            let summary = BulkLoader::new(heap.clone())
                .allow_duplicate_keys(config.allow_duplicate_keys)
                .load_file(&data)?;
            println!("Inserted {} records into '{}'", summary.inserted, heap.path().display());

            if let (Some(min), Some(max)) = (&summary.min_key, &summary.max_key) {
                println!("Range {} ~ {}", min, max);
                print_range(&heap, min, max)?;
            }
        }

        Commands::SearchField { table, field } => {
            let heap = HeapFile::open(config.table_path(&table));
            for hit in heap.search_field(&field)? {
                let hit = hit?;
                println!("{} Field {} Value: {}", hit.address, field, hit.display_value());
            }
        }

        Commands::SearchRange { table, min, max } => {
            let heap = HeapFile::open(config.table_path(&table));
            print_range(&heap, &min, &max)?;
        }

        Commands::Schema { table } => {
            let heap = HeapFile::open(config.table_path(&table));
            let meta = heap.read_header()?;
            println!("Fields of '{}':", heap.path().display());
            for (i, field) in meta.fields.iter().enumerate() {
                println!("  {}: {} (length={})", i, field.name, field.length);
            }
            match meta.head {
                Some(head) => println!("First record: {}", head),
                None => println!("First record: (empty)"),
            }
        }

        Commands::Join {
            left,
            right,
            key,
            output,
        } => {
            let mut left = HeapFileSource::open(HeapFile::open(config.table_path(&left)))?;
            let mut right = HeapFileSource::open(HeapFile::open(config.table_path(&right)))?;

            let summary = JoinDriver::new(config).execute(
                &mut left,
                &mut right,
                &key,
                &config.table_path(&output),
            )?;
            println!(
                "Merge join wrote {} rows ({} duplicates skipped) to '{}'",
                summary.rows_persisted,
                summary.duplicates_skipped(),
                summary.output.display()
            );
        }

        Commands::Validate {
            reference,
            left,
            right,
            key,
            full,
        } => {
            let rows = read_reference(&reference)?;
            let mut left = HeapFileSource::open(HeapFile::open(config.table_path(&left)))?;
            let mut right = HeapFileSource::open(HeapFile::open(config.table_path(&right)))?;

            let report = JoinDriver::new(config).validate(rows, &mut left, &mut right, &key)?;
            println!("Reference row count:  {}", report.reference_count);
            println!("Merge-join row count: {}", report.merge_count);
            println!("Only in reference ({}):", report.only_in_reference_count);
            for row in &report.only_in_reference {
                println!("   {}", row);
            }
            println!("Only in merge ({}):", report.only_in_merge_count);
            for row in &report.only_in_merge {
                println!("   {}", row);
            }

            if full {
                println!("Reference rows:");
                for row in &report.reference_rows {
                    println!("   {}", row);
                }
                println!("Merge-join rows:");
                for row in &report.merged_rows {
                    println!("   {}", row);
                }
            }
        }
    }

    Ok(())
}

fn print_range(heap: &HeapFile, min: &str, max: &str) -> Result<()> {
    let meta = heap.read_header()?;
    for hit in heap.search_records_by_key_range(min, max)? {
        let hit = hit?;
        println!(
            "{} Search-key:{}",
            hit.address,
            hit.record.search_key().unwrap_or("null")
        );
        for (field, value) in meta.fields.iter().zip(&hit.record.values).skip(1) {
            println!("{}: {}", field.name, value.as_deref().unwrap_or("null"));
        }
    }
    Ok(())
}

/// Reference rows: one per non-empty line, values separated by `|`
fn read_reference(path: &Path) -> Result<Vec<Row>> {
    let contents = fs::read_to_string(path).map_err(|e| RecFileError::io(path, e))?;
    Ok(contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('|').map(|v| Some(v.to_string())).collect::<Row>())
        .collect())
}
