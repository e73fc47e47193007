//! Entry point of the `starfish` binary.
//!
//! Builds the command tree from the algorithm registry, dispatches the parsed
//! invocation and maps the outcome to an exit status. Usage help goes to
//! `stderr`; the registration summary goes to `stdout`.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};

use starfish_cli::{
    algorithms,
    cli::{CliError, DispatchOutcome, ParquetStackStore, build_cli, render_summary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

fn try_main() -> Result<DispatchOutcome> {
    let registry = algorithms::registry().context("failed to build algorithm registry")?;
    let matches = build_cli(registry).get_matches();
    let outcome = run_cli(&matches, registry, ParquetStackStore, &mut io::stderr())
        .context("failed to execute command")?;

    if let DispatchOutcome::Completed(summary) = &outcome {
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        render_summary(summary, &mut writer).context("failed to render summary")?;
        writer.flush().context("failed to flush output")?;
    }
    Ok(outcome)
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    match try_main() {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            let code = err.downcast_ref::<CliError>().and_then(CliError::code);
            error!(
                error = %format!("{err:#}"),
                code = code.map(field::display),
                "command execution failed"
            );
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
