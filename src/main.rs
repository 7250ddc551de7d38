use std::process::ExitCode;

fn main() -> ExitCode {
    wolfsight_lib::run()
}
