//! Name-indexed registry of registration algorithms.

use std::{fmt, sync::Arc};

use clap::Command;
use indexmap::{IndexMap, map::Entry};
use tracing::debug;

use crate::{algorithm::AlgorithmDescriptor, error::RegistryError};

/// Argument ids, long flags and short flags owned by the component itself.
///
/// Algorithms may not declare any of these inside their subcommand.
pub const RESERVED_ARGUMENTS: &[&str] = &["input", "output", "help", "i", "o", "h"];

/// Write-once mapping from algorithm name to descriptor.
///
/// Iteration follows registration order so the command surface is stable
/// across runs.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use clap::{ArgMatches, Command};
/// use starfish_core::{
///     AlgorithmDescriptor, AlgorithmError, AlgorithmRegistry, RegistrationAlgorithm,
///     RegistryError,
/// };
///
/// struct Named(&'static str);
///
/// impl AlgorithmDescriptor for Named {
///     fn name(&self) -> &'static str { self.0 }
///     fn about(&self) -> &'static str { "" }
///     fn declare_arguments(&self, command: Command) -> Command { command }
///     fn from_parsed_arguments(
///         &self,
///         _: &ArgMatches,
///     ) -> Result<Box<dyn RegistrationAlgorithm>, AlgorithmError> {
///         unimplemented!()
///     }
/// }
///
/// let registry = AlgorithmRegistry::from_descriptors([
///     Arc::new(Named("b")) as Arc<dyn AlgorithmDescriptor>,
///     Arc::new(Named("a")) as Arc<dyn AlgorithmDescriptor>,
/// ])?;
/// assert_eq!(registry.names().collect::<Vec<_>>(), ["b", "a"]);
///
/// let err = AlgorithmRegistry::from_descriptors([
///     Arc::new(Named("a")) as Arc<dyn AlgorithmDescriptor>,
///     Arc::new(Named("a")) as Arc<dyn AlgorithmDescriptor>,
/// ])
/// .expect_err("duplicate names are rejected");
/// assert_eq!(err, RegistryError::DuplicateName { name: "a" });
/// # Ok::<(), RegistryError>(())
/// ```
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    entries: IndexMap<&'static str, Arc<dyn AlgorithmDescriptor>>,
}

impl AlgorithmRegistry {
    /// Builds a registry from `descriptors`, preserving their order.
    ///
    /// # Errors
    /// Returns [`RegistryError::EmptyName`] for an unnamed algorithm,
    /// [`RegistryError::DuplicateName`] when two algorithms share a name and
    /// [`RegistryError::ReservedArgument`] when an algorithm declares a flag
    /// listed in [`RESERVED_ARGUMENTS`].
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn AlgorithmDescriptor>>,
    {
        let mut entries = IndexMap::new();
        for descriptor in descriptors {
            let name = descriptor.name();
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            validate_arguments(descriptor.as_ref())?;
            match entries.entry(name) {
                Entry::Occupied(_) => return Err(RegistryError::DuplicateName { name }),
                Entry::Vacant(slot) => {
                    debug!(algorithm = name, "registered algorithm");
                    slot.insert(descriptor);
                }
            }
        }
        Ok(Self { entries })
    }

    /// Looks up an algorithm by its subcommand name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AlgorithmDescriptor>> {
        self.entries.get(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Registered `(name, descriptor)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arc<dyn AlgorithmDescriptor>)> {
        self.entries.iter().map(|(name, descriptor)| (*name, descriptor))
    }

    /// Number of registered algorithms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no algorithm is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

fn validate_arguments(descriptor: &dyn AlgorithmDescriptor) -> Result<(), RegistryError> {
    let command = descriptor.declare_arguments(Command::new(descriptor.name()));
    for arg in command.get_arguments() {
        let longs = arg.get_long().into_iter().chain(arg.get_all_aliases().unwrap_or_default());
        let shorts = arg
            .get_short()
            .into_iter()
            .chain(arg.get_all_short_aliases().unwrap_or_default());
        if let Some(argument) = std::iter::once(arg.get_id().as_str().to_owned())
            .chain(longs.map(ToOwned::to_owned))
            .chain(shorts.map(String::from))
            .find(|candidate| RESERVED_ARGUMENTS.contains(&candidate.as_str()))
        {
            return Err(RegistryError::ReservedArgument {
                algorithm: descriptor.name(),
                argument,
            });
        }
    }
    Ok(())
}
