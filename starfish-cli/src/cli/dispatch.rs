//! Drives one `register` invocation: construct, load, run, persist.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::Command;
use starfish_core::{
    AlgorithmError, ImageStack, RegistrationAlgorithm, RegistryError, StackError, StackShape,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

use super::invocation::{RegisterInvocation, Selection};

/// Exit status reported when no algorithm was selected.
pub const USAGE_EXIT_STATUS: u8 = 2;

/// Errors surfaced while executing CLI commands.
///
/// Every variant other than the registry and argument errors carries the
/// underlying failure unchanged.
#[derive(Debug, Error)]
pub enum CliError {
    /// The algorithm registry could not be built.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The root command matched a subcommand with no handler.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// A component-level argument was absent from the parsed matches.
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),
    /// The parsed subcommand does not name a registered algorithm.
    #[error("unknown registration algorithm `{0}`")]
    UnknownAlgorithm(String),
    /// The selected algorithm rejected its parsed arguments.
    #[error(transparent)]
    Construction(AlgorithmError),
    /// The input stack could not be loaded.
    #[error(transparent)]
    Load(StackError),
    /// The algorithm failed while running.
    #[error(transparent)]
    Algorithm(AlgorithmError),
    /// The registered stack could not be written.
    #[error(transparent)]
    Persist(StackError),
    /// Help text could not be written.
    #[error("failed to write help: {0}")]
    Help(#[source] io::Error),
}

impl CliError {
    /// Stable machine-readable code of the underlying error, when one exists.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Registry(err) => Some(err.code().as_str()),
            Self::Load(err) | Self::Persist(err) => Some(err.code().as_str()),
            _ => None,
        }
    }
}

/// Loads and persists stacks on behalf of the dispatcher.
pub trait StackStore {
    /// Loads the stack stored at `path`.
    ///
    /// # Errors
    /// Returns [`StackError`] when the location is unreadable or malformed.
    fn load(&self, path: &Path) -> Result<ImageStack, StackError>;

    /// Writes `stack` to `path`.
    ///
    /// # Errors
    /// Returns [`StackError`] when the location is not writable.
    fn persist(&self, stack: &ImageStack, path: &Path) -> Result<(), StackError>;
}

impl<S> StackStore for &S
where
    S: StackStore + ?Sized,
{
    fn load(&self, path: &Path) -> Result<ImageStack, StackError> {
        (**self).load(path)
    }

    fn persist(&self, stack: &ImageStack, path: &Path) -> Result<(), StackError> {
        (**self).persist(stack, path)
    }
}

/// [`StackStore`] backed by the Parquet stack format.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParquetStackStore;

impl StackStore for ParquetStackStore {
    fn load(&self, path: &Path) -> Result<ImageStack, StackError> {
        ImageStack::read(path)
    }

    fn persist(&self, stack: &ImageStack, path: &Path) -> Result<(), StackError> {
        stack.write(path)
    }
}

/// Summarises a completed registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationSummary {
    /// Name of the algorithm that ran.
    pub algorithm: &'static str,
    /// Location the stack was loaded from.
    pub input: PathBuf,
    /// Location the registered stack was written to.
    pub output: PathBuf,
    /// Geometry of the registered stack.
    pub shape: StackShape,
}

/// Result of dispatching one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The stack was loaded, registered and persisted.
    Completed(RegistrationSummary),
    /// No algorithm was selected (or help was forced); usage was printed.
    UsageShown,
}

impl DispatchOutcome {
    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Completed(_) => 0,
            Self::UsageShown => USAGE_EXIT_STATUS,
        }
    }
}

/// Executes `register` invocations against a [`StackStore`].
///
/// The dispatcher keeps only the command used to render help; the algorithm
/// instance and the loaded stack live for a single [`Dispatcher::handle`] call.
#[derive(Debug)]
pub struct Dispatcher<S = ParquetStackStore> {
    help_command: Command,
    store: S,
}

impl<S: StackStore> Dispatcher<S> {
    /// Creates a dispatcher whose usage text is rendered from `help_command`.
    #[must_use]
    pub fn new(help_command: Command, store: S) -> Self {
        Self {
            help_command,
            store,
        }
    }

    /// Runs one invocation.
    ///
    /// When no algorithm is selected, or `force_help` is set, the command's
    /// help is written to `help_out` and [`DispatchOutcome::UsageShown`] is
    /// returned without touching the filesystem. Otherwise the algorithm is
    /// constructed, the input stack loaded, the algorithm run and the result
    /// persisted, stopping at the first failure.
    ///
    /// # Errors
    /// Returns [`CliError`] wrapping the failure of whichever step failed.
    #[instrument(
        name = "register.dispatch",
        err,
        skip(self, invocation, help_out),
        fields(algorithm = field::Empty, input = %invocation.input.display(), output = %invocation.output.display()),
    )]
    pub fn handle(
        &self,
        invocation: &RegisterInvocation,
        force_help: bool,
        help_out: &mut dyn Write,
    ) -> Result<DispatchOutcome, CliError> {
        let (descriptor, matches) = match &invocation.selection {
            Selection::Selected {
                descriptor,
                matches,
            } if !force_help => (descriptor, matches),
            _ => {
                warn!("no registration algorithm selected");
                self.write_help(help_out)?;
                return Ok(DispatchOutcome::UsageShown);
            }
        };
        let name = descriptor.name();
        Span::current().record("algorithm", field::display(name));

        let algorithm = descriptor
            .from_parsed_arguments(matches)
            .map_err(CliError::Construction)?;
        info!(algorithm = name, "registering stack");
        let mut stack = self.load(&invocation.input)?;
        run_algorithm(algorithm.as_ref(), &mut stack)?;
        self.persist(&stack, &invocation.output)?;

        info!(algorithm = name, "registration completed");
        Ok(DispatchOutcome::Completed(RegistrationSummary {
            algorithm: name,
            input: invocation.input.clone(),
            output: invocation.output.clone(),
            shape: stack.shape(),
        }))
    }

    #[instrument(name = "register.load", err, skip(self))]
    fn load(&self, path: &Path) -> Result<ImageStack, CliError> {
        self.store.load(path).map_err(CliError::Load)
    }

    #[instrument(name = "register.persist", err, skip(self, stack))]
    fn persist(&self, stack: &ImageStack, path: &Path) -> Result<(), CliError> {
        self.store.persist(stack, path).map_err(CliError::Persist)
    }

    fn write_help(&self, out: &mut dyn Write) -> Result<(), CliError> {
        let help = self.help_command.clone().render_help();
        write!(out, "{help}").map_err(CliError::Help)
    }
}

#[instrument(name = "register.run", err, skip_all, fields(algorithm = ?algorithm))]
fn run_algorithm(
    algorithm: &dyn RegistrationAlgorithm,
    stack: &mut ImageStack,
) -> Result<(), CliError> {
    algorithm.run(stack).map_err(CliError::Algorithm)
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use starfish_cli::cli::{RegistrationSummary, render_summary};
/// use starfish_core::StackShape;
///
/// let summary = RegistrationSummary {
///     algorithm: "fourier_shift",
///     input: PathBuf::from("in"),
///     output: PathBuf::from("out"),
///     shape: StackShape::new(4, 3, 64, 64),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer).expect("utf-8");
/// assert!(text.contains("algorithm: fourier_shift"));
/// assert!(text.contains("shape: 4 rounds x 3 channels x 64x64"));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &RegistrationSummary, mut writer: impl Write) -> io::Result<()> {
    let shape = summary.shape;
    writeln!(writer, "algorithm: {}", summary.algorithm)?;
    writeln!(writer, "input: {}", summary.input.display())?;
    writeln!(writer, "output: {}", summary.output.display())?;
    writeln!(
        writer,
        "shape: {} rounds x {} channels x {}x{}",
        shape.rounds, shape.channels, shape.height, shape.width
    )?;
    Ok(())
}
