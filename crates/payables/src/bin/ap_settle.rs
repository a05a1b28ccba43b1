//! ap-settle - Settle one installment of an invoice.

fn main() -> std::process::ExitCode {
    payables::cmd::settle::main()
}
