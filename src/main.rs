use std::process::ExitCode;

fn main() -> ExitCode {
    quaketrend_lib::run()
}
