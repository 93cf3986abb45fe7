//! CSV Joiner CLI
//!
//! Merges two or more delimited files into one by matching rows on a join
//! key column whose accepted names come from a JSON config.

use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use joiner_core::{
    expand_inputs, merge_files, project, write_csv, Error, KeyCandidates, MergeOptions,
    MergePolicy, MergeReport,
};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "csv-joiner")]
#[command(about = "Merge CSV files on a shared key column", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config listing equivalent join key column names
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Output CSV file path
    #[arg(short, long = "out", visible_alias = "output", default_value = "output.csv")]
    out: PathBuf,

    /// How rows from later files are combined
    #[arg(short, long, value_enum, default_value = "inner-join")]
    policy: PolicyArg,

    /// Field delimiter for input and output (a single character, or "tab")
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log more detail (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Input files or directories, merged in the order given
    inputs: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Keep only keys present in every file; earlier values win
    InnerJoin,
    /// Keep every key; colliding columns get numeric suffixes
    Accumulate,
}

impl From<PolicyArg> for MergePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::InnerJoin => MergePolicy::InnerJoin,
            PolicyArg::Accumulate => MergePolicy::Accumulate,
        }
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!("delimiter must be a single ASCII character, got '{}'", s)),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(report) => {
            println!("Merged CSV written to: {}", cli.out.display());
            println!(
                "  {} rows, {} columns from {} files",
                report.row_count,
                report.column_count,
                report.tables.len()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if matches!(e, Error::TooFewInputs { .. }) {
                eprintln!("{}", Cli::command().render_usage());
            }
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> joiner_core::Result<MergeReport> {
    let inputs = expand_inputs(&cli.inputs)?;
    if inputs.len() < 2 {
        return Err(Error::TooFewInputs {
            found: inputs.len(),
        });
    }

    let candidates = KeyCandidates::load(&cli.config)?;
    let options = MergeOptions {
        policy: cli.policy.into(),
        delimiter: cli.delimiter,
    };

    let store = merge_files(&inputs, &candidates, &options)?;
    let mut report = MergeReport::new(&candidates, &store);
    let projection = project(store);
    report.record_projection(&projection);

    write_csv(&cli.out, &projection, cli.delimiter)?;
    report.output = Some(cli.out.clone());

    if let Some(path) = &cli.report {
        report.save(path)?;
        tracing::info!(path = %path.display(), "wrote run report");
    }

    Ok(report)
}
