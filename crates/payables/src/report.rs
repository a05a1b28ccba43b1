//! Diagnostic and summary output for the commands.

use payables_validate::{Severity, ValidationError};
use std::io::Write;
use std::path::Path;

/// Report validation errors for one file to the given writer.
///
/// Returns the number of error-severity entries written.
pub fn report_validation_errors<W: Write>(
    errors: &[ValidationError],
    path: &Path,
    writer: &mut W,
) -> std::io::Result<usize> {
    let mut error_count = 0;

    for error in errors {
        let severity = error.severity();
        if severity == Severity::Error {
            error_count += 1;
        }
        writeln!(
            writer,
            "{severity}[{}]: {} ({}, invoice {})",
            error.code,
            error.message,
            path.display(),
            error.invoice
        )?;
        if let Some(ctx) = &error.context {
            writeln!(writer, "  context: {ctx}")?;
        }
        writeln!(writer)?;
    }

    Ok(error_count)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Print the closing line of a check: how many invoices were checked and
/// whether any of them would be refused on save.
pub fn print_summary<W: Write>(
    invoices: usize,
    errors: usize,
    warnings: usize,
    writer: &mut W,
) -> std::io::Result<()> {
    let checked = plural(invoices, "invoice");
    match (errors, warnings) {
        (0, 0) => writeln!(writer, "\x1b[32mok\x1b[0m {checked} checked, ready to save"),
        (0, w) => writeln!(
            writer,
            "\x1b[33mok\x1b[0m {checked} checked, {}",
            plural(w, "warning")
        ),
        (e, 0) => writeln!(
            writer,
            "\x1b[31mblocked\x1b[0m {checked} checked, {}",
            plural(e, "error")
        ),
        (e, w) => writeln!(
            writer,
            "\x1b[31mblocked\x1b[0m {checked} checked, {}, {}",
            plural(e, "error"),
            plural(w, "warning")
        ),
    }
}
