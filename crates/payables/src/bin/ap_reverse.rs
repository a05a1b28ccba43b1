//! ap-reverse - Reverse the settlement of one installment.

fn main() -> std::process::ExitCode {
    payables::cmd::reverse::main()
}
