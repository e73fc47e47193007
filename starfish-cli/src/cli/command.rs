//! Builds the clap command tree from the algorithm registry.

use clap::{Arg, Command};
use starfish_core::{AlgorithmRegistry, existing_path};
use tracing::debug;

/// Name of the binary and of the root command.
pub const BINARY_NAME: &str = "starfish";
/// Subcommand hosting the registration component.
pub const REGISTER_COMMAND: &str = "register";
/// Argument id of the input stack location.
pub const INPUT_ARG: &str = "input";
/// Argument id of the output stack location.
pub const OUTPUT_ARG: &str = "output";

/// Builds the root `starfish` command with every pipeline component attached.
///
/// # Examples
/// ```
/// use starfish_cli::{algorithms, cli::build_cli};
///
/// let registry = algorithms::registry()?;
/// let command = build_cli(registry);
/// assert!(command.find_subcommand("register").is_some());
/// # Ok::<(), starfish_core::RegistryError>(())
/// ```
#[must_use]
pub fn build_cli(registry: &AlgorithmRegistry) -> Command {
    Command::new(BINARY_NAME)
        .about("Image-based transcriptomics pipeline components.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(build_register_command(registry))
}

/// Builds the `register` command group.
///
/// The group owns the `--input` and `--output` locations, both checked for
/// existence while parsing. Each registered algorithm contributes one nested
/// subcommand, named after the algorithm, whose flags are declared by the
/// algorithm itself and therefore stay scoped to that subcommand. Selecting
/// an algorithm is optional at parse time; the dispatcher reports a missing
/// selection.
///
/// # Examples
/// ```
/// use starfish_cli::{algorithms, cli::build_register_command};
///
/// let registry = algorithms::registry()?;
/// let command = build_register_command(registry);
/// let names: Vec<_> = command.get_subcommands().map(|sub| sub.get_name()).collect();
/// assert_eq!(names, ["fourier_shift", "translate"]);
/// # Ok::<(), starfish_core::RegistryError>(())
/// ```
#[must_use]
pub fn build_register_command(registry: &AlgorithmRegistry) -> Command {
    let group = Command::new(REGISTER_COMMAND)
        .about("Register the imaging rounds of a stack and write the result.")
        .arg(
            Arg::new(INPUT_ARG)
                .short('i')
                .long(INPUT_ARG)
                .value_name("PATH")
                .help("Stack to register (a Parquet file or a directory containing one)")
                .required(true)
                .value_parser(existing_path),
        )
        .arg(
            Arg::new(OUTPUT_ARG)
                .short('o')
                .long(OUTPUT_ARG)
                .value_name("PATH")
                .help("Existing directory (or Parquet file) receiving the registered stack")
                .required(true)
                .value_parser(existing_path),
        )
        .subcommand_value_name("ALGORITHM")
        .subcommand_help_heading("Algorithms");

    registry.iter().fold(group, |group, (name, descriptor)| {
        debug!(algorithm = name, "adding algorithm subcommand");
        let scoped = Command::new(name).about(descriptor.about());
        group.subcommand(descriptor.declare_arguments(scoped))
    })
}
