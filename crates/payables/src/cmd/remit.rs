//! Implementation of the ap-remit command.

use crate::cmd::common;
use crate::cmd::completions::ShellType;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use payables_core::{Decimal, Invoice};
use payables_remittance::{export, select, RemittanceConfig};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Export selected invoices as a bank remittance file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Invoice files to read
    #[arg(value_name = "FILE", required_unless_present = "generate_completions")]
    pub files: Vec<PathBuf>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Invoice ids to include (default: every unpaid invoice with an outstanding amount)
    #[arg(long = "invoice", value_name = "ID")]
    pub invoices: Vec<String>,

    /// Bank code written to the header
    #[arg(long, required_unless_present = "generate_completions")]
    pub bank_code: Option<String>,

    /// Paying company name
    #[arg(long, required_unless_present = "generate_completions")]
    pub company_name: Option<String>,

    /// Paying company tax document
    #[arg(long, required_unless_present = "generate_completions")]
    pub company_document: Option<String>,

    /// File sequence number
    #[arg(long, default_value_t = 1)]
    pub sequence: u32,

    /// Generation date (defaults to today)
    #[arg(long, value_parser = common::parse_day)]
    pub date: Option<NaiveDate>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn selected(all: Vec<Invoice>, ids: &[String]) -> Result<Vec<Invoice>> {
    if ids.is_empty() {
        return Ok(all
            .into_iter()
            .filter(|i| !i.status.is_paid() && i.outstanding() > Decimal::ZERO)
            .collect());
    }

    let mut chosen = Vec::with_capacity(ids.len());
    for id in ids {
        let invoice = all
            .iter()
            .find(|i| &i.id == id)
            .with_context(|| format!("invoice {id} not found"))?;
        chosen.push(invoice.clone());
    }
    Ok(chosen)
}

fn run(args: &Args) -> Result<()> {
    let mut all = Vec::new();
    for file in &args.files {
        all.extend(common::load(file)?);
    }
    let invoices = selected(all, &args.invoices)?;

    let items = select(&invoices).context("invalid remittance selection")?;

    let config = RemittanceConfig::builder()
        .company_name(args.company_name.clone().unwrap_or_default())
        .company_document(args.company_document.clone().unwrap_or_default())
        .bank_code(args.bank_code.clone().unwrap_or_default())
        .file_sequence(args.sequence)
        .build();
    if let Some(first) = items.first() {
        if first.bank != config.bank_code {
            tracing::warn!(
                invoice_bank = %first.bank,
                bank_code = %config.bank_code,
                "selected invoices settle through a bank other than --bank-code"
            );
        }
    }

    let content = export(&items, &config, common::day_or_today(args.date))
        .context("failed to encode remittance")?;

    match &args.output {
        Some(path) => fs::write(path, &content)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout().lock().write_all(content.as_bytes())?,
    }
    tracing::info!(invoices = items.len(), "remittance written");
    Ok(())
}

/// Main entry point for the remit command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    // Handle shell completion generation
    if let Some(shell) = args.generate_completions {
        crate::cmd::completions::generate_completions::<Args>(shell, "ap-remit");
        return ExitCode::SUCCESS;
    }

    common::init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
