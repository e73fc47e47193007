//! Typed view over the parsed `register` arguments.

use std::{fmt, path::PathBuf, sync::Arc};

use clap::ArgMatches;
use starfish_core::{AlgorithmDescriptor, AlgorithmRegistry};

use super::{
    command::{INPUT_ARG, OUTPUT_ARG},
    dispatch::CliError,
};

/// Which algorithm, if any, the user picked.
#[derive(Clone)]
pub enum Selection {
    /// No algorithm subcommand was given.
    Unselected,
    /// An algorithm subcommand was given, with its own parsed flags.
    Selected {
        /// Descriptor resolved from the registry.
        descriptor: Arc<dyn AlgorithmDescriptor>,
        /// Arguments scoped to the algorithm's subcommand.
        matches: ArgMatches,
    },
}

impl Selection {
    /// Name of the selected algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Option<&'static str> {
        match self {
            Self::Unselected => None,
            Self::Selected { descriptor, .. } => Some(descriptor.name()),
        }
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unselected => f.write_str("Unselected"),
            Self::Selected { descriptor, .. } => f
                .debug_struct("Selected")
                .field("algorithm", &descriptor.name())
                .finish_non_exhaustive(),
        }
    }
}

/// One parsed `register` invocation.
#[derive(Clone, Debug)]
pub struct RegisterInvocation {
    /// Location the stack is loaded from.
    pub input: PathBuf,
    /// Location the registered stack is written to.
    pub output: PathBuf,
    /// Algorithm discriminator.
    pub selection: Selection,
}

impl RegisterInvocation {
    /// Extracts an invocation from the `register` command's matches.
    ///
    /// # Errors
    /// Returns [`CliError::MissingArgument`] when `matches` lacks the input or
    /// output location, and [`CliError::UnknownAlgorithm`] when the selected
    /// subcommand has no registry entry.
    pub fn from_matches(
        matches: &ArgMatches,
        registry: &AlgorithmRegistry,
    ) -> Result<Self, CliError> {
        let path = |id: &'static str| {
            matches
                .try_get_one::<PathBuf>(id)
                .ok()
                .flatten()
                .cloned()
                .ok_or(CliError::MissingArgument(id))
        };
        let selection = match matches.subcommand() {
            None => Selection::Unselected,
            Some((name, scoped)) => {
                let descriptor = registry
                    .get(name)
                    .ok_or_else(|| CliError::UnknownAlgorithm(name.to_owned()))?;
                Selection::Selected {
                    descriptor: Arc::clone(descriptor),
                    matches: scoped.clone(),
                }
            }
        };
        Ok(Self {
            input: path(INPUT_ARG)?,
            output: path(OUTPUT_ARG)?,
            selection,
        })
    }
}
