//! tabcat - stream a tab-separated file through a typed, backpressured reader
//!
//! Reads a file or stdin line by line, decodes each line against a column
//! list and writes the records back out as TSV or JSON lines. Malformed lines
//! are reported on stderr according to the `--on-malformed` policy.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod config;
mod error;
mod output;

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tabstream::{
    ColumnSpec, Input, MalformedPolicy, RecordStream, StreamConfig, StreamError, StreamOptions,
    parse_columns,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{FileConfig, Overrides};
use crate::error::CliError;
use crate::output::RecordWriter;

#[derive(Parser, Debug)]
#[command(name = "tabcat")]
#[command(about = "Stream tab-separated records with bounded buffering")]
#[command(version)]
#[command(long_about = "
tabcat reads line-delimited, separator-delimited records from a file or
stdin, decodes each field against a typed column list, and writes the
records to stdout. At most --capacity decoded records are held in memory;
reading pauses while the buffer is full.

Exit codes: 0 success, 2 invalid configuration, 3 file not found,
4 malformed input, 5 input stalled past --timeout-ms, 130 interrupted.
")]
struct Cli {
    /// Input file; `-` or omitted reads stdin
    input: Option<PathBuf>,

    /// Column list, e.g. `name:text,count:integer`
    #[arg(short, long)]
    columns: Option<String>,

    /// YAML config file with `columns` and stream settings
    #[arg(long, env = "TABCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum buffered records before reading pauses
    #[arg(long)]
    capacity: Option<usize>,

    /// Occupancy at which paused reading resumes
    #[arg(long)]
    resume_below: Option<usize>,

    /// Field separator: a single character, `tab`, `comma` or `space`
    #[arg(short, long, value_parser = config::parse_separator)]
    separator: Option<char>,

    /// What to do with lines that fail to decode
    #[arg(long, value_enum)]
    on_malformed: Option<PolicyArg>,

    /// Give up when no record arrives for this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Write records as JSON objects keyed by column name
    #[arg(long)]
    json: bool,

    /// Print a summary of stream counters on stderr
    #[arg(long)]
    stats: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Report the line on stderr and continue; exit 4 at the end
    Surface,
    /// Drop the line silently
    Skip,
    /// Stop at the first malformed line
    FailFast,
}

impl From<PolicyArg> for MalformedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Surface => MalformedPolicy::Surface,
            PolicyArg::Skip => MalformedPolicy::Skip,
            PolicyArg::FailFast => MalformedPolicy::FailFast,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tabcat={log_level},tabstream={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            std::process::exit(output::exit_code(&e));
        }
    }
}

fn settings(cli: &Cli) -> Result<(Vec<ColumnSpec>, StreamConfig), CliError> {
    let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
    let columns = cli.columns.as_deref().map(parse_columns).transpose()?;

    config::resolve(
        file,
        Overrides {
            columns,
            max_capacity: cli.capacity,
            resume_below: cli.resume_below,
            separator: cli.separator,
            on_malformed: cli.on_malformed.map(MalformedPolicy::from),
            wait_timeout_ms: cli.timeout_ms,
        },
    )
}

fn input(cli: &Cli) -> Input {
    match cli.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => Input::path(path),
        _ => Input::reader(tokio::io::stdin()),
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let (columns, stream_config) = settings(cli)?;
    debug!(?columns, config = ?stream_config, "resolved settings");
    let fail_fast = stream_config.on_malformed == MalformedPolicy::FailFast;

    let mut stream = RecordStream::open(
        StreamOptions::new()
            .columns(columns.clone())
            .input(input(cli))
            .config(stream_config),
    )
    .map_err(CliError::from)?;

    let cancel = stream.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            cancel.cancel();
        }
    });

    let stdout = std::io::stdout();
    let mut writer = RecordWriter::new(BufWriter::new(stdout.lock()), &columns, cli.json);
    let mut surfaced = 0u64;

    let outcome = loop {
        match stream.next().await {
            Some(Ok(row)) => {
                if let Err(e) = writer.write_row(&row) {
                    break Err(e);
                }
            }
            Some(Err(StreamError::Malformed(err))) if fail_fast => {
                break Err(CliError::from(StreamError::Malformed(err)));
            }
            Some(Err(StreamError::Malformed(err))) => {
                surfaced += 1;
                output::print_malformed(&err, cli.json);
            }
            Some(Err(StreamError::Cancelled)) => break Err(CliError::Interrupted),
            Some(Err(e)) => break Err(CliError::from(e)),
            None => break Ok(()),
        }
    };

    let outcome = outcome.and_then(|()| writer.flush());
    if cli.stats {
        output::print_stats(&stream.stats(), cli.json);
    }

    match outcome {
        Err(e) if output::is_broken_pipe(&e) => {
            debug!("stdout closed, stopping");
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(()) if surfaced > 0 => {
            warn!(surfaced, "input contained malformed lines");
            Err(CliError::MalformedInput { count: surfaced }.into())
        }
        Ok(()) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::time::Duration;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["tabcat", "-c", "a:text"])?;
        assert!(cli.input.is_none());
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(input(&cli), Input::Reader(_)));
        Ok(())
    }

    #[test]
    fn parse_full_flag_set() -> TestResult {
        let cli = Cli::try_parse_from([
            "tabcat",
            "data.tsv",
            "--columns",
            "name:text,n:int",
            "--capacity",
            "10",
            "--resume-below",
            "2",
            "--separator",
            "comma",
            "--on-malformed",
            "fail-fast",
            "--timeout-ms",
            "250",
            "--json",
            "-vv",
        ])?;

        assert_eq!(cli.on_malformed, Some(PolicyArg::FailFast));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(input(&cli), Input::Path(_)));

        let (columns, config) = settings(&cli)?;
        assert_eq!(
            columns,
            vec![ColumnSpec::text("name"), ColumnSpec::integer("n")]
        );
        assert_eq!(config.max_capacity, 10);
        assert_eq!(config.resume_threshold(), 2);
        assert_eq!(config.separator, ',');
        assert_eq!(config.on_malformed, MalformedPolicy::FailFast);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        Ok(())
    }

    #[test]
    fn dash_reads_stdin() -> TestResult {
        let cli = Cli::try_parse_from(["tabcat", "-", "-c", "a"])?;
        assert!(matches!(input(&cli), Input::Reader(_)));
        Ok(())
    }

    #[test]
    fn bad_column_kind_is_configuration_error() -> TestResult {
        let cli = Cli::try_parse_from(["tabcat", "-c", "a:decimal"])?;
        assert!(matches!(
            settings(&cli),
            Err(CliError::Stream(StreamError::Configuration(_)))
        ));
        Ok(())
    }

    #[test]
    fn unknown_policy_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["tabcat", "-c", "a", "--on-malformed", "ignore"]);
        assert!(result.is_err());
    }
}
