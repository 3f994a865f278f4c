//! tabload - load a delimited file into a database table
//!
//! ```text
//! tabload <schema> <connection> <data> [--batch-size N] [--strict-ddl] ...
//! ```

mod output;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use tabload::database::Dialect;
use tabload::load::{DEFAULT_BATCH_SIZE, DdlPolicy};
use tabload::models::DataType;
use tabload::logging::{DEFAULT_LOG_FILE, LogConfig, LogLevel, init_logging};
use tabload::pipeline::{PipelineConfig, PipelineError, PipelineExecutor, PipelineReport};

use progress::LoadProgress;

#[derive(Parser, Debug)]
#[command(
    name = "tabload",
    version,
    about = "Validate a delimited file against a schema and bulk-load it into a table"
)]
struct Cli {
    /// Field schema descriptor (JSON, or YAML for .yaml/.yml)
    schema: PathBuf,

    /// Connection descriptor (JSON, or YAML for .yaml/.yml)
    connection: PathBuf,

    /// Delimited source file
    data: PathBuf,

    /// Rows per insert batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Abort when CREATE TABLE fails instead of continuing
    #[arg(long)]
    strict_ddl: bool,

    /// Directory for the checkpoint log and progress notes
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Log file (appended)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// SQL dialect override (standard, duckdb, mysql, postgres)
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Column type override as TYPE=SQL, e.g. string=TEXT (repeatable)
    #[arg(long = "column-type", value_name = "TYPE=SQL", value_parser = parse_column_type)]
    column_types: Vec<(DataType, String)>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::new()
        .with_level(cli.log_level)
        .with_file(&cli.log_file);
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e}");
            None
        }
    };

    let progress = LoadProgress::new(!cli.no_progress && !cli.json);
    match run(&cli, progress.clone()) {
        Ok(report) => {
            progress.finish_success(&format!("{} rows loaded", report.load.rows_inserted));
            if cli.json {
                match output::format_json(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("Warning: could not render report: {e}"),
                }
            } else {
                eprint!("{}", output::format_report(&report));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            progress.finish_error("load failed");
            error!(error = %e, exit_code = e.exit_code(), "Run aborted");
            eprintln!("Error: {}", e.user_message());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli, progress: LoadProgress) -> Result<PipelineReport, PipelineError> {
    let ddl_policy = if cli.strict_ddl {
        DdlPolicy::Strict
    } else {
        DdlPolicy::Tolerate
    };

    let mut config = PipelineConfig::new(&cli.schema, &cli.connection, &cli.data)
        .with_batch_size(cli.batch_size)
        .with_ddl_policy(ddl_policy)
        .with_work_dir(&cli.work_dir);
    if let Some(dialect) = cli.dialect {
        config = config.with_dialect(dialect);
    }
    for (data_type, sql_type) in &cli.column_types {
        config = config.with_column_type(data_type.clone(), sql_type);
    }

    let mut executor = PipelineExecutor::new(config)?.with_progress(move |range, inserted, total| {
        progress.update(range.number, inserted, total)
    });
    info!(run_id = %executor.run_id(), "Starting run");

    executor.run()
}

fn parse_column_type(s: &str) -> Result<(DataType, String), String> {
    match s.split_once('=') {
        Some((data_type, sql_type)) if !data_type.trim().is_empty() && !sql_type.trim().is_empty() => {
            Ok((DataType::parse(data_type), sql_type.trim().to_string()))
        }
        _ => Err(format!("expected TYPE=SQL, got '{s}'")),
    }
}
