//! Command-line surface for the starfish pipeline components.
//!
//! The clap command tree is assembled at runtime from the algorithm registry:
//! `register` owns the stack locations and each registered algorithm adds a
//! nested subcommand carrying its own flags.

mod command;
mod dispatch;
mod invocation;

use std::io::Write;

use clap::ArgMatches;
use starfish_core::AlgorithmRegistry;
use tracing::{Span, field, instrument};

pub use command::{
    BINARY_NAME, INPUT_ARG, OUTPUT_ARG, REGISTER_COMMAND, build_cli, build_register_command,
};
pub use dispatch::{
    CliError, DispatchOutcome, Dispatcher, ParquetStackStore, RegistrationSummary, StackStore,
    USAGE_EXIT_STATUS, render_summary,
};
pub use invocation::{RegisterInvocation, Selection};

/// Executes the command selected in the root `matches`.
///
/// Help for a missing algorithm selection is written to `help_out`.
///
/// # Errors
/// Returns [`CliError`] when the invocation cannot be extracted or any
/// dispatch step fails.
#[instrument(name = "cli.execute", err, skip_all, fields(command = field::Empty))]
pub fn run_cli<S: StackStore>(
    matches: &ArgMatches,
    registry: &AlgorithmRegistry,
    store: S,
    help_out: &mut dyn Write,
) -> Result<DispatchOutcome, CliError> {
    match matches.subcommand() {
        Some((REGISTER_COMMAND, scoped)) => {
            Span::current().record("command", field::display(REGISTER_COMMAND));
            let invocation = RegisterInvocation::from_matches(scoped, registry)?;
            let help = build_register_command(registry).bin_name(register_bin_name());
            Dispatcher::new(help, store).handle(&invocation, false, help_out)
        }
        Some((other, _)) => Err(CliError::UnknownCommand(other.to_owned())),
        None => Err(CliError::UnknownCommand(String::new())),
    }
}

fn register_bin_name() -> String {
    format!("{BINARY_NAME} {REGISTER_COMMAND}")
}

#[cfg(test)]
mod test_helpers;
