//! Implementation of the ap-check command.

use crate::cmd::common;
use crate::cmd::completions::ShellType;
use crate::report;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use payables_core::{format_invoice, FormatConfig, Invoice};
use payables_validate::{validate_all, Severity, ValidationError, ValidationOptions};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling integration
    Json,
}

/// A diagnostic message in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    /// Source file path
    pub file: String,
    /// Invoice id, absent when the file failed to load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<String>,
    /// Severity: "error", "warning" or "info"
    pub severity: String,
    /// Error code (e.g., "E1001", "LOAD")
    pub code: String,
    /// Error message
    pub message: String,
    /// Optional context information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// JSON output structure for all diagnostics.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    /// List of diagnostics
    pub diagnostics: Vec<JsonDiagnostic>,
    /// Number of invoices checked
    pub invoice_count: usize,
    /// Total error count
    pub error_count: usize,
    /// Total warning count
    pub warning_count: usize,
}

/// Validate invoice files before they are saved.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Invoice files to check
    #[arg(value_name = "FILE", required_unless_present = "generate_completions")]
    pub files: Vec<PathBuf>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Show verbose output including timing information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,

    /// Accept invoices with empty category or cost-center lists
    #[arg(long)]
    pub allow_empty_allocations: bool,

    /// Skip the installment total check
    #[arg(long)]
    pub skip_installment_total: bool,

    /// Print every invoice before its diagnostics
    #[arg(short, long)]
    pub print: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Result of checking one file.
struct FileReport {
    path: PathBuf,
    outcome: Result<(Vec<Invoice>, Vec<Vec<ValidationError>>)>,
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();
    let start = std::time::Instant::now();
    let json_mode = matches!(args.format, OutputFormat::Json);

    let options = ValidationOptions {
        require_allocations: !args.allow_empty_allocations,
        check_installment_total: !args.skip_installment_total,
    };

    // Check files in parallel
    let reports: Vec<FileReport> = args
        .files
        .par_iter()
        .map(|path| {
            let outcome = common::load(path).map(|invoices| {
                let errors = validate_all(&invoices, &options);
                (invoices, errors)
            });
            FileReport {
                path: path.clone(),
                outcome,
            }
        })
        .collect();

    let mut diagnostics = Vec::new();
    let mut invoice_count = 0;
    let mut error_count = 0;
    let mut warning_count = 0;
    let format_config = FormatConfig::default();

    for file_report in &reports {
        let file = file_report.path.display().to_string();
        let (invoices, errors) = match &file_report.outcome {
            Ok(checked) => checked,
            Err(e) => {
                error_count += 1;
                if json_mode {
                    diagnostics.push(JsonDiagnostic {
                        file,
                        invoice: None,
                        severity: Severity::Error.to_string(),
                        code: "LOAD".to_string(),
                        message: format!("{e:#}"),
                        context: None,
                    });
                } else if !args.quiet {
                    writeln!(stdout, "error[LOAD]: {e:#}")?;
                    writeln!(stdout)?;
                }
                continue;
            }
        };
        invoice_count += invoices.len();

        for (invoice, invoice_errors) in invoices.iter().zip(errors) {
            if args.print && !json_mode && !args.quiet {
                writeln!(stdout, "{}", format_invoice(invoice, &format_config))?;
            }

            let warnings = invoice_errors
                .iter()
                .filter(|e| e.severity() != Severity::Error)
                .count();
            warning_count += warnings;

            if json_mode {
                error_count += invoice_errors.len() - warnings;
                diagnostics.extend(invoice_errors.iter().map(|err| JsonDiagnostic {
                    file: file.clone(),
                    invoice: Some(err.invoice.clone()),
                    severity: err.severity().to_string(),
                    code: err.code.code().to_string(),
                    message: err.message.clone(),
                    context: err.context.clone(),
                }));
            } else if args.quiet {
                error_count += invoice_errors.len() - warnings;
            } else {
                error_count += report::report_validation_errors(
                    invoice_errors,
                    &file_report.path,
                    &mut stdout,
                )?;
            }
        }
    }

    tracing::debug!(
        files = reports.len(),
        invoices = invoice_count,
        errors = error_count,
        warnings = warning_count,
        "check finished"
    );

    if json_mode {
        let output = JsonOutput {
            diagnostics,
            invoice_count,
            error_count,
            warning_count,
        };
        writeln!(
            stdout,
            "{}",
            serde_json::to_string_pretty(&output).context("failed to encode diagnostics")?
        )?;
    } else if !args.quiet {
        if args.verbose {
            writeln!(
                stdout,
                "\nChecked {invoice_count} invoices in {:.2}ms",
                start.elapsed().as_secs_f64() * 1000.0
            )?;
        }
        report::print_summary(invoice_count, error_count, warning_count, &mut stdout)?;
    }

    if error_count > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Main entry point for the check command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    // Handle shell completion generation
    if let Some(shell) = args.generate_completions {
        crate::cmd::completions::generate_completions::<Args>(shell, "ap-check");
        return ExitCode::SUCCESS;
    }

    common::init_tracing(args.verbose);

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
