use std::io::{self, Read, Write};
use std::process::ExitCode;

use color_eyre::Result;

/// Reads one Belts problem from stdin, solves it, and writes the result
/// document to stdout. Exit code 1 with a stderr diagnostic on malformed
/// input or a numeric anomaly; `status = "infeasible"` is a normal,
/// zero-exit-code outcome carrying a cut certificate.
fn main() -> Result<ExitCode> {
    if std::env::var("RUST_BACKTRACE").is_err() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }
    color_eyre::install()?;
    env_logger::init();

    let mut input_json = String::new();
    io::stdin().read_to_string(&mut input_json)?;

    match prodflow_solver::belts::run(&input_json) {
        Ok(output_json) => {
            io::stdout().write_all(output_json.as_bytes())?;
            io::stdout().write_all(b"\n")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("belts: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
