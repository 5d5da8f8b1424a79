use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use spar_order_convert::{
    ArticleRefRule, ConversionReport, ConvertError, ConvertOptions, DEFAULT_OUTPUT_SUFFIX,
    ExtractOptions, ExtractionReport, InputSource, MergePolicy, convert, extract_pdf_to_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "spar-convert",
    version,
    about = "Convert SPAR vendor orders (xlsx or PDF) into the internal order format"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enrich an order with internal codes and write the converted workbook.
    Convert(ConvertArgs),
    /// Extract order rows from a PDF into CSV.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Reference workbook holding the conversion table in Sheet1.
    #[arg(short, long)]
    table: PathBuf,

    /// Order spreadsheet or PDF.
    #[arg(short, long)]
    input: PathBuf,

    /// First data row (default 2 for PDF input, 6 for spreadsheets).
    #[arg(long)]
    start_row: Option<u32>,

    /// Output workbook path; derived from the input name when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suffix appended to the input file stem for the derived output name.
    #[arg(long, default_value = DEFAULT_OUTPUT_SUFFIX)]
    suffix: String,

    /// What dissolved merged cells receive: clear or propagate.
    #[arg(long, default_value = "clear")]
    merge_policy: MergePolicy,

    /// Require article refs of at least five digits in PDF input.
    #[arg(long)]
    strict_article_ref: bool,

    /// Print the conversion report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Require article refs of at least five digits.
    #[arg(long)]
    strict_article_ref: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn extract_options(strict_article_ref: bool) -> ExtractOptions {
    let article_ref_rule = if strict_article_ref {
        ArticleRefRule::strict()
    } else {
        ArticleRefRule::AnyDigits
    };
    ExtractOptions {
        article_ref_rule,
        ..ExtractOptions::default()
    }
}

fn log_extraction(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn print_conversion(report: &ConversionReport, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(report).context("failed to render conversion report")?;
        println!("{rendered}");
        return Ok(());
    }

    if let InputSource::Pdf { extracted_rows, .. } = &report.source {
        eprintln!("extracted {extracted_rows} order row(s) from PDF");
    }
    println!(
        "{} -> {} ({} row(s) kept, {} removed)",
        report.input.display(),
        report.output.display(),
        report.remaining_rows,
        report.deleted_rows
    );
    Ok(())
}

fn run_convert(args: &ConvertArgs) -> Result<ConversionReport> {
    if args.start_row == Some(0) {
        return Err(anyhow!("--start-row must be at least 1"));
    }

    let options = ConvertOptions {
        start_row: args.start_row,
        merge_policy: args.merge_policy,
        output: args.output.clone(),
        output_suffix: args.suffix.clone(),
        staging_dir: None,
        extract: extract_options(args.strict_article_ref),
    };
    convert(&args.table, &args.input, &options)
        .with_context(|| format!("failed to convert '{}'", args.input.display()))
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let options = extract_options(args.strict_article_ref);
    extract_pdf_to_csv(&args.input, &args.output, &options, args.delimiter as u8)
        .with_context(|| format!("failed to extract orders from '{}'", args.input.display()))
}

fn exit_for_error(error: &anyhow::Error) -> ExitCode {
    eprintln!("error: {error:#}");
    let nothing_extracted = error
        .downcast_ref::<ConvertError>()
        .is_some_and(ConvertError::is_empty_extraction);
    if nothing_extracted {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spar_order_convert=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => {
            match run_convert(&args).and_then(|report| print_conversion(&report, args.json)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => exit_for_error(&error),
            }
        }
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_extraction(&report, args.verbose);
                ExitCode::SUCCESS
            }
            Err(error) => exit_for_error(&error),
        },
    }
}
