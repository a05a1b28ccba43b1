//! Implementation of the ap-settle command.
//!
//! Settles one installment of an invoice and prints the updated invoice
//! together with its audit records. With `--write`, the file is updated in
//! place and only the audit records are printed.

use crate::cmd::common::{self, ChangeOutput};
use crate::cmd::completions::ShellType;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use payables_audit::{diff, FieldLabels};
use payables_booking::{settle, Settlement};
use payables_core::Decimal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Settle one installment of an invoice.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Invoice file
    #[arg(value_name = "FILE", required_unless_present = "generate_completions")]
    pub file: Option<PathBuf>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Invoice id (required when the file holds several invoices)
    #[arg(long)]
    pub invoice: Option<String>,

    /// Installment number, starting at 1
    #[arg(long, short = 'n', required_unless_present = "generate_completions")]
    pub installment: Option<usize>,

    /// Amount paid
    #[arg(long, value_parser = common::parse_decimal, required_unless_present = "generate_completions")]
    pub amount: Option<Decimal>,

    /// Discount granted at payment
    #[arg(long, value_parser = common::parse_decimal)]
    pub discount: Option<Decimal>,

    /// Interest or late fee charged at payment
    #[arg(long, value_parser = common::parse_decimal)]
    pub interest: Option<Decimal>,

    /// Payment date (defaults to today)
    #[arg(long, value_parser = common::parse_day)]
    pub date: Option<NaiveDate>,

    /// Settling bank
    #[arg(long)]
    pub bank: Option<String>,

    /// Who is recording the settlement
    #[arg(long, required_unless_present = "generate_completions")]
    pub actor: Option<String>,

    /// Audit timestamp in RFC 3339 (defaults to now)
    #[arg(long, value_parser = common::parse_timestamp)]
    pub at: Option<DateTime<Utc>>,

    /// Update the file in place
    #[arg(short, long)]
    pub write: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn run(args: &Args) -> Result<()> {
    let file = args.file.as_ref().context("missing FILE")?;
    let number = args.installment.context("missing --installment")?;
    let amount = args.amount.context("missing --amount")?;
    let actor = args.actor.as_deref().context("missing --actor")?;

    let mut invoices = common::load(file)?;
    let position = common::pick(&invoices, args.invoice.as_deref(), file)?;
    let index = common::installment_index(number)?;

    let mut settlement = Settlement::new(amount, common::day_or_today(args.date))
        .with_discount(args.discount.unwrap_or_default())
        .with_interest(args.interest.unwrap_or_default());
    if let Some(bank) = &args.bank {
        settlement = settlement.with_bank(bank);
    }

    let ctx = common::audit_context(actor, args.at);
    let before = &invoices[position];
    let result = settle(before, index, &settlement, &ctx)
        .with_context(|| format!("cannot settle installment {number} of {}", before.id))?;

    let mut audit = vec![result.audit];
    audit.extend(diff(
        before,
        &result.invoice,
        &FieldLabels::invoice_defaults(),
        &ctx,
    ));

    let mut stdout = io::stdout().lock();
    if args.write {
        invoices[position] = result.invoice;
        common::save(file, &invoices)?;
        for record in &audit {
            writeln!(stdout, "{record}")?;
        }
    } else {
        let output = ChangeOutput {
            invoice: &result.invoice,
            audit: &audit,
        };
        writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
    }
    Ok(())
}

/// Main entry point for the settle command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    // Handle shell completion generation
    if let Some(shell) = args.generate_completions {
        crate::cmd::completions::generate_completions::<Args>(shell, "ap-settle");
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
