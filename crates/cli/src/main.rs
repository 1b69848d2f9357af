//! querytrail: report on prior Athena query executions.
//!
//! One run lists the execution ids a CloudTrail audit table recorded for `GetQueryExecution`
//! inside a time window, looks each one up in batches, writes a CSV row per execution and
//! prints a summary of how much data the window's queries scanned.
//!
//! ```text
//! querytrail --from-time 2024-05-01T00:00:00Z --to-time 2024-05-02T00:00:00Z
//! querytrail --from-time ... --to-time ... --big-only --bigger-then 500000000000
//! querytrail --from-time ... --to-time ... --output json --profile prod
//! ```

use clap::{CommandFactory, Parser};
use dotenv::dotenv;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod exit_codes;
mod output;

use commands::RunSettings;
use config::CliConfig;
use output::OutputFormat;
use querytrail_core::athena::AthenaService;
use querytrail_core::{DecodeMode, RowFilter, TimeWindow};
use querytrail_error::{ErrorCategory, QueryTrailError};

#[derive(Parser, Debug)]
#[command(name = "querytrail", version)]
#[command(about = "Report which Athena queries ran in a time window and how much they scanned", long_about = None)]
struct Cli {
    /// Start of the window, as stored in the audit table's eventtime (e.g. 2024-05-01T00:00:00Z)
    #[arg(long)]
    from_time: Option<String>,

    /// End of the window (exclusive)
    #[arg(long)]
    to_time: Option<String>,

    /// AWS region [default: us-east-2]
    #[arg(long)]
    aws_region: Option<String>,

    /// CSV report path [default: querytrail-result_<from>-<to>.csv]
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Scanned-bytes threshold above which a query counts as big [default: 1099511627776]
    #[arg(long)]
    bigger_then: Option<i64>,

    /// Only write big queries to the CSV (the summary still covers every query)
    #[arg(long, default_value_t = false)]
    big_only: bool,

    /// What "big" means for --big-only
    #[arg(long, value_enum, default_value = "new-largest")]
    big_only_by: BigOnlyBy,

    /// Output format for the summary (human, json, yaml)
    #[arg(long, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Configuration profile
    #[arg(long, env = "QUERYTRAIL_PROFILE")]
    profile: Option<String>,

    /// Database the discovery query runs in
    #[arg(long)]
    database: Option<String>,

    /// S3 location for the discovery query's results
    #[arg(long)]
    result_location: Option<String>,

    /// CloudTrail audit table to search
    #[arg(long)]
    audit_table: Option<String>,

    /// Ids per bulk lookup (1-50)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Delay between discovery status checks
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Give up on the discovery query after this many seconds
    #[arg(long)]
    poll_timeout: Option<u64>,

    /// Fail on discovery rows that are not valid JSON instead of skipping them
    #[arg(long, default_value_t = false)]
    strict_decode: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BigOnlyBy {
    /// Write a row only when it beats every value seen before it
    NewLargest,
    /// Write a row only when it exceeds --bigger-then
    Threshold,
}

impl Cli {
    fn row_filter(&self) -> RowFilter {
        match (self.big_only, self.big_only_by) {
            (false, _) => RowFilter::All,
            (true, BigOnlyBy::NewLargest) => RowFilter::NewLargest,
            (true, BigOnlyBy::Threshold) => RowFilter::AboveThreshold,
        }
    }

    /// Merge flags over the loaded profile. Flags win.
    fn settings(&self, mut config: CliConfig, from: &str, to: &str) -> RunSettings {
        let warehouse = &mut config.warehouse;
        if let Some(region) = &self.aws_region {
            warehouse.region = region.clone();
        }
        if let Some(database) = &self.database {
            warehouse.database = database.clone();
        }
        if let Some(location) = &self.result_location {
            warehouse.result_location = location.clone();
        }
        if let Some(table) = &self.audit_table {
            warehouse.audit_table = table.clone();
        }
        if let Some(size) = self.batch_size {
            warehouse.batch_size = size;
        }
        if let Some(interval) = self.poll_interval_ms {
            warehouse.poll_interval_ms = interval;
        }
        if let Some(timeout) = self.poll_timeout {
            warehouse.poll_timeout_secs = Some(timeout);
        }

        RunSettings {
            window: TimeWindow::new(from, to),
            warehouse: config.warehouse,
            output_file: self
                .output_file
                .clone()
                .unwrap_or_else(|| commands::default_output_file(from, to)),
            big_threshold: self.bigger_then.unwrap_or(config.big_threshold),
            filter: self.row_filter(),
            decode: if self.strict_decode {
                DecodeMode::Strict
            } else {
                DecodeMode::Lenient
            },
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let (Some(from), Some(to)) = (cli.from_time.as_deref(), cli.to_time.as_deref()) else {
        eprintln!(
            "{} --from-time and --to-time are required",
            "Error:".red().bold()
        );
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(exit_codes::MISSING_TIME_RANGE);
    };

    let outcome = tokio::select! {
        result = run_cli(&cli, from, to) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{} interrupted", "Error:".red().bold());
            std::process::exit(exit_codes::INTERRUPTED);
        }
    };

    if let Err(e) = outcome {
        let exit_code = map_error_to_exit_code(&e);
        if cli.output.is_machine_readable() {
            output::print_error(cli.output, &e.to_string(), exit_code).ok();
        } else {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        std::process::exit(exit_code);
    }

    Ok(())
}

fn map_error_to_exit_code(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<QueryTrailError>() {
        return match err.category() {
            ErrorCategory::Discovery => exit_codes::DISCOVERY_ERROR,
            ErrorCategory::Fetch => exit_codes::FETCH_ERROR,
            ErrorCategory::Config => exit_codes::CONFIG_ERROR,
            ErrorCategory::Output => exit_codes::OUTPUT_ERROR,
            ErrorCategory::Internal => exit_codes::GENERAL_ERROR,
            _ => exit_codes::GENERAL_ERROR,
        };
    }
    exit_codes::GENERAL_ERROR
}

async fn run_cli(cli: &Cli, from: &str, to: &str) -> Result<(), anyhow::Error> {
    let config = config::load(cli.profile.as_deref())?;
    let settings = cli.settings(config, from, to);
    debug!(
        region = %settings.warehouse.region,
        database = %settings.warehouse.database,
        audit_table = %settings.warehouse.audit_table,
        output_file = %settings.output_file.display(),
        "Resolved settings"
    );

    let service = AthenaService::connect(&settings.warehouse.region).await;
    let outcome = commands::report(&service, &settings, cli.output).await?;
    debug!(
        batches = outcome.batches,
        queries = outcome.stats.query_count,
        rows_written = outcome.rows_written,
        rows_failed = outcome.rows_failed,
        "Run finished"
    );
    Ok(())
}
