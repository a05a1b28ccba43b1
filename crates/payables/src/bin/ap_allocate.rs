//! ap-allocate - Edit one category or cost-center allocation entry.

fn main() -> std::process::ExitCode {
    payables::cmd::allocate::main()
}
