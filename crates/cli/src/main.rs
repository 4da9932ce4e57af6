use std::process::ExitCode;

fn main() -> ExitCode {
    carfinder_cli::run()
}
