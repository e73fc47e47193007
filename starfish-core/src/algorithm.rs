//! Capability contract for pluggable registration algorithms.
//!
//! An algorithm is split in two: an [`AlgorithmDescriptor`] describes how the
//! algorithm is named and configured on the command line, and the
//! [`RegistrationAlgorithm`] it constructs performs the actual work on an
//! [`ImageStack`].

use std::{fmt, marker::PhantomData};

use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::{error::AlgorithmError, stack::ImageStack};

/// A configured registration algorithm ready to run against a stack.
pub trait RegistrationAlgorithm: fmt::Debug + Send + Sync {
    /// Registers the tiles of `stack` in place.
    ///
    /// # Errors
    /// Returns [`AlgorithmError`] when the algorithm cannot complete. The
    /// error is surfaced to the user unchanged.
    fn run(&self, stack: &mut ImageStack) -> Result<(), AlgorithmError>;
}

/// Describes a registration algorithm to the command dispatcher.
///
/// # Examples
/// ```
/// use clap::{ArgMatches, Command};
/// use starfish_core::{
///     AlgorithmDescriptor, AlgorithmError, ImageStack, RegistrationAlgorithm,
/// };
///
/// #[derive(Debug)]
/// struct Identity;
///
/// impl RegistrationAlgorithm for Identity {
///     fn run(&self, _stack: &mut ImageStack) -> Result<(), AlgorithmError> {
///         Ok(())
///     }
/// }
///
/// struct IdentityDescriptor;
///
/// impl AlgorithmDescriptor for IdentityDescriptor {
///     fn name(&self) -> &'static str { "identity" }
///     fn about(&self) -> &'static str { "Leave the stack untouched." }
///     fn declare_arguments(&self, command: Command) -> Command { command }
///     fn from_parsed_arguments(
///         &self,
///         _matches: &ArgMatches,
///     ) -> Result<Box<dyn RegistrationAlgorithm>, AlgorithmError> {
///         Ok(Box::new(Identity))
///     }
/// }
///
/// let descriptor = IdentityDescriptor;
/// let matches = descriptor
///     .declare_arguments(Command::new(descriptor.name()))
///     .get_matches_from(["identity"]);
/// assert!(descriptor.from_parsed_arguments(&matches).is_ok());
/// ```
pub trait AlgorithmDescriptor: Send + Sync {
    /// Stable identifier, used verbatim as the subcommand token.
    fn name(&self) -> &'static str;

    /// One-line description shown in help output.
    fn about(&self) -> &'static str;

    /// Adds the algorithm's own flags to its subcommand.
    fn declare_arguments(&self, command: Command) -> Command;

    /// Builds a configured algorithm from the subcommand's parsed arguments.
    ///
    /// Implementations must not perform I/O here.
    ///
    /// # Errors
    /// Returns [`AlgorithmError::InvalidArguments`] when the parsed values do
    /// not describe a valid configuration.
    fn from_parsed_arguments(
        &self,
        matches: &ArgMatches,
    ) -> Result<Box<dyn RegistrationAlgorithm>, AlgorithmError>;
}

impl<T> AlgorithmDescriptor for &T
where
    T: AlgorithmDescriptor + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn about(&self) -> &'static str {
        (**self).about()
    }

    fn declare_arguments(&self, command: Command) -> Command {
        (**self).declare_arguments(command)
    }

    fn from_parsed_arguments(
        &self,
        matches: &ArgMatches,
    ) -> Result<Box<dyn RegistrationAlgorithm>, AlgorithmError> {
        (**self).from_parsed_arguments(matches)
    }
}

/// Associates a stable algorithm name with a clap-derived argument type.
pub trait NamedAlgorithm {
    /// Subcommand token for the algorithm.
    const NAME: &'static str;
    /// One-line description shown in help output.
    const ABOUT: &'static str;
}

/// [`AlgorithmDescriptor`] for algorithms whose configuration is a clap
/// `Args` struct.
///
/// # Examples
/// ```
/// use clap::{Args, Command};
/// use starfish_core::{
///     AlgorithmDescriptor, AlgorithmError, ClapAlgorithm, ImageStack, NamedAlgorithm,
///     RegistrationAlgorithm,
/// };
///
/// #[derive(Args, Debug)]
/// struct Offset {
///     #[arg(long, default_value_t = 0.0)]
///     by: f32,
/// }
///
/// impl NamedAlgorithm for Offset {
///     const NAME: &'static str = "offset";
///     const ABOUT: &'static str = "Add a constant to every pixel.";
/// }
///
/// impl RegistrationAlgorithm for Offset {
///     fn run(&self, _stack: &mut ImageStack) -> Result<(), AlgorithmError> {
///         Ok(())
///     }
/// }
///
/// static OFFSET: ClapAlgorithm<Offset> = ClapAlgorithm::new();
/// let matches = OFFSET
///     .declare_arguments(Command::new(OFFSET.name()))
///     .get_matches_from(["offset", "--by", "2.5"]);
/// let algorithm = OFFSET.from_parsed_arguments(&matches)?;
/// assert_eq!(format!("{algorithm:?}"), "Offset { by: 2.5 }");
/// # Ok::<(), AlgorithmError>(())
/// ```
pub struct ClapAlgorithm<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> ClapAlgorithm<T> {
    /// Creates the descriptor; usable in `static` items.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for ClapAlgorithm<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AlgorithmDescriptor for ClapAlgorithm<T>
where
    T: NamedAlgorithm + Args + FromArgMatches + RegistrationAlgorithm + 'static,
{
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn about(&self) -> &'static str {
        T::ABOUT
    }

    fn declare_arguments(&self, command: Command) -> Command {
        T::augment_args(command)
    }

    fn from_parsed_arguments(
        &self,
        matches: &ArgMatches,
    ) -> Result<Box<dyn RegistrationAlgorithm>, AlgorithmError> {
        let algorithm = T::from_arg_matches(matches).map_err(|err| {
            AlgorithmError::InvalidArguments {
                algorithm: T::NAME,
                message: err.to_string(),
            }
        })?;
        Ok(Box::new(algorithm))
    }
}
