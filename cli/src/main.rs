//! Airgraph CLI: build the airline survey graph and verify it
//!
//! Talks to a Neo4j-compatible server configured in `config.txt`, or to an
//! in-process graph with `--memory`.

use std::path::{Path, PathBuf};
use std::process::exit;

use airgraph::{
    AirgraphError, Baseline, GraphBackend, GraphLoader, HttpBackend, LoadOptions, MemoryBackend,
    PropertyValue, QueryCatalog, ResultRow, ResultValidator, StoreConfig, TracingObserver,
    ValidationSummary, Verdict,
};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use tracing::Level;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "airgraph", version, about = "Airline survey knowledge graph")]
struct Cli {
    /// Store configuration file (KEY=VALUE lines)
    #[arg(long, default_value = "config.txt", global = true, env = "AIRGRAPH_CONFIG")]
    config: PathBuf,

    /// Use an in-process graph instead of the configured store
    #[arg(long, global = true)]
    memory: bool,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a survey CSV into the graph
    Load {
        #[arg(long, default_value = "Airline_surveys_sample.csv")]
        csv: PathBuf,

        /// Records per write transaction
        #[arg(long, default_value_t = airgraph::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Merge into the existing graph instead of clearing it first
        #[arg(long)]
        keep_existing: bool,
    },
    /// Run the query catalog and compare against golden results
    Validate {
        /// JSON baseline; the built-in survey sample results otherwise
        #[arg(long)]
        baseline: Option<PathBuf>,
    },
    /// Load, then validate against the same store
    Pipeline {
        #[arg(long, default_value = "Airline_surveys_sample.csv")]
        csv: PathBuf,

        #[arg(long, default_value_t = airgraph::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        #[arg(long)]
        baseline: Option<PathBuf>,
    },
    /// List the catalog queries
    Catalog,
    /// Run one catalog query and print its rows
    Query {
        /// Catalog number, 1 to 5
        number: u8,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Catalog => run_catalog(&cli.format),
        command => match open_backend(&cli) {
            Ok(backend) => run_command(backend.as_ref(), command, &cli.format).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(true) => {}
        Ok(false) => exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}

fn open_backend(cli: &Cli) -> CliResult<Box<dyn GraphBackend>> {
    if cli.memory {
        return Ok(Box::new(MemoryBackend::new()));
    }
    let config = StoreConfig::from_file(&cli.config)?;
    Ok(Box::new(HttpBackend::new(config)))
}

/// Returns false when validation ran and found failures
async fn run_command(backend: &dyn GraphBackend, command: &Commands, format: &OutputFormat) -> CliResult<bool> {
    match command {
        Commands::Load {
            csv,
            batch_size,
            keep_existing,
        } => {
            run_load(backend, csv, *batch_size, !keep_existing, format).await?;
            Ok(true)
        }
        Commands::Validate { baseline } => run_validate(backend, baseline.as_deref(), format).await,
        Commands::Pipeline {
            csv,
            batch_size,
            baseline,
        } => {
            run_load(backend, csv, *batch_size, true, format).await?;
            run_validate(backend, baseline.as_deref(), format).await
        }
        Commands::Query { number } => {
            run_query(backend, *number, format).await?;
            Ok(true)
        }
        Commands::Catalog => run_catalog(format),
    }
}

async fn run_load(
    backend: &dyn GraphBackend,
    csv: &Path,
    batch_size: usize,
    wipe_first: bool,
    format: &OutputFormat,
) -> CliResult<()> {
    let options = LoadOptions {
        batch_size,
        wipe_first,
    };
    let summary = GraphLoader::new(&options, &TracingObserver)
        .load_csv(backend, csv)
        .await
        .map_err(|e| {
            if let AirgraphError::SchemaMismatch { missing, available } = &e {
                eprintln!("Missing columns: {}", missing.join(", "));
                eprintln!("Available columns: {}", available.join(", "));
            }
            e
        })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Table => {
            println!("Knowledge Graph created successfully!");
            println!("Rows:    {}", summary.rows);
            println!("Batches: {}", summary.batches);
            println!("Elapsed: {:.2?}", summary.elapsed);
        }
    }
    Ok(())
}

async fn run_validate(backend: &dyn GraphBackend, baseline: Option<&Path>, format: &OutputFormat) -> CliResult<bool> {
    let baseline = match baseline {
        Some(path) => Baseline::from_json_file(path)?,
        None => Baseline::survey_sample(),
    };
    let summary = ResultValidator::new(QueryCatalog::standard(), baseline)
        .validate(backend)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Table => print_validation(&summary),
    }
    Ok(summary.all_passed())
}

fn print_validation(summary: &ValidationSummary) {
    for report in &summary.reports {
        println!("\nQuery {}: {}", report.number, report.title);
        match &report.verdict {
            Verdict::Passed => println!("  PASS"),
            Verdict::NoBaseline => println!("  SKIPPED (no expected results)"),
            Verdict::LengthMismatch { expected, actual } => {
                println!("  FAIL: expected {} rows, got {}", expected, actual)
            }
            Verdict::ValueMismatch { mismatches } => {
                println!("  FAIL");
                for m in mismatches {
                    let actual = m.actual.as_ref().map_or("<missing>".to_string(), format_value);
                    println!(
                        "  row {} '{}': expected {}, got {}",
                        m.row,
                        m.field,
                        format_value(&m.expected),
                        actual
                    );
                }
            }
        }
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Query", "Result"]);
    for report in &summary.reports {
        let result = match report.verdict {
            Verdict::Passed => "PASS",
            Verdict::NoBaseline => "SKIPPED",
            _ => "FAIL",
        };
        table.add_row(vec![report.number.to_string(), report.title.clone(), result.to_string()]);
    }
    println!("\n{}", table);
    println!("{}/{} queries passed", summary.passed_count(), summary.reports.len());
}

fn run_catalog(format: &OutputFormat) -> CliResult<bool> {
    let catalog = QueryCatalog::standard();
    match format {
        OutputFormat::Json => {
            let queries: Vec<_> = catalog.iter().collect();
            println!("{}", serde_json::to_string_pretty(&queries)?);
        }
        OutputFormat::Table => {
            for query in catalog.iter() {
                println!("Query {}: {}", query.number, query.title);
                println!("{}\n", query.cypher);
            }
        }
    }
    Ok(true)
}

async fn run_query(backend: &dyn GraphBackend, number: u8, format: &OutputFormat) -> CliResult<()> {
    let catalog = QueryCatalog::standard();
    let query = catalog
        .get(number)
        .ok_or_else(|| format!("no catalog query {} (expected 1 to {})", number, catalog.len()))?;

    let mut session = backend.open_session().await?;
    let outcome = session.run_read(query).await;
    let closed = session.close().await;
    let rows = outcome?;
    closed?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => print_rows(query.columns, &rows),
    }
    Ok(())
}

fn print_rows(columns: &[&str], rows: &[ResultRow]) {
    if rows.is_empty() {
        println!("(no results)");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.to_vec());
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| row.get(*c).map_or("null".to_string(), format_value))
            .collect();
        table.add_row(cells);
    }

    println!("{}", table);
    println!("{} row(s)", rows.len());
}

fn format_value(v: &PropertyValue) -> String {
    match v {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
