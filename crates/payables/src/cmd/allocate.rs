//! Implementation of the ap-allocate command.

use crate::cmd::common::{self, ChangeOutput};
use crate::cmd::completions::ShellType;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, ValueEnum};
use payables_audit::{diff, FieldLabels};
use payables_booking::{apply_edit, summarize, AllocationEdit, AllocationKind};
use payables_core::{AllocationEntry, Decimal};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Allocation list to edit.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Expense categories, balanced against gross
    Category,
    /// Cost centers, balanced against net
    CostCenter,
}

impl From<KindArg> for AllocationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Category => Self::Category,
            KindArg::CostCenter => Self::CostCenter,
        }
    }
}

/// The edit to apply: exactly one of percentage or value.
#[derive(ClapArgs, Debug)]
#[group(required = false, multiple = false)]
pub struct EditArgs {
    /// Share in percent
    #[arg(long, value_parser = common::parse_decimal)]
    pub percentage: Option<Decimal>,

    /// Share as an absolute amount
    #[arg(long, value_parser = common::parse_decimal)]
    pub value: Option<Decimal>,
}

/// Edit one category or cost-center allocation entry.
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

    /// Allocation list
    #[arg(long, value_enum, default_value = "category")]
    pub kind: KindArg,

    /// Entry position in the list, starting at 0
    #[arg(long, required_unless_present = "generate_completions")]
    pub index: Option<usize>,

    /// Label for a new entry appended at --index
    #[arg(long)]
    pub label: Option<String>,

    #[command(flatten)]
    pub edit: EditArgs,

    /// Record the change as this actor
    #[arg(long, default_value = "cli")]
    pub actor: String,

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
    let index = args.index.context("missing --index")?;
    let edit = match (args.edit.percentage, args.edit.value) {
        (Some(pct), _) => AllocationEdit::Percentage(pct),
        (None, Some(value)) => AllocationEdit::Value(value),
        (None, None) => anyhow::bail!("one of --percentage or --value is required"),
    };
    let kind = AllocationKind::from(args.kind);

    let mut invoices = common::load(file)?;
    let position = common::pick(&invoices, args.invoice.as_deref(), file)?;
    let mut before = invoices[position].clone();

    // A label names a new entry; it must be appended right at the end.
    if let Some(label) = &args.label {
        let entries = match kind {
            AllocationKind::Category => &mut before.categories,
            AllocationKind::CostCenter => &mut before.cost_centers,
        };
        anyhow::ensure!(
            index == entries.len(),
            "a new {kind} entry must be added at index {}",
            entries.len()
        );
        entries.push(AllocationEntry::new(label));
    }

    let after = apply_edit(&before, kind, index, edit)
        .with_context(|| format!("cannot edit {kind} entry {index} of {}", before.id))?;

    let summary = summarize(kind.entries(&after), kind.target(&after));
    tracing::debug!(
        %kind,
        percentage_total = %summary.percentage_total,
        value_total = %summary.value_total,
        balanced = summary.balanced,
        "allocation updated"
    );
    if !summary.balanced {
        eprintln!(
            "note: {kind} allocation not balanced yet ({}% and {} left)",
            summary.percentage_residual, summary.value_residual
        );
    }

    let ctx = common::audit_context(&args.actor, args.at);
    let audit = diff(
        &invoices[position],
        &after,
        &FieldLabels::invoice_defaults(),
        &ctx,
    );

    let mut stdout = io::stdout().lock();
    if args.write {
        invoices[position] = after;
        common::save(file, &invoices)?;
        for record in &audit {
            writeln!(stdout, "{record}")?;
        }
    } else {
        let output = ChangeOutput {
            invoice: &after,
            audit: &audit,
        };
        writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
    }
    Ok(())
}

/// Main entry point for the allocate command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    // Handle shell completion generation
    if let Some(shell) = args.generate_completions {
        crate::cmd::completions::generate_completions::<Args>(shell, "ap-allocate");
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
