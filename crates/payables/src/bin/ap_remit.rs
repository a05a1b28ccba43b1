//! ap-remit - Export selected invoices as a bank remittance file.

fn main() -> std::process::ExitCode {
    payables::cmd::remit::main()
}
