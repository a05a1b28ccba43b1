//! ap-check - Validate invoice files before they are saved.

fn main() -> std::process::ExitCode {
    payables::cmd::check::main()
}
