//! Starfish core library.
//!
//! Provides the image stack container, the capability contract every
//! registration algorithm implements, and the registry that indexes those
//! algorithms by name for the command-line dispatcher.

mod algorithm;
mod args;
mod error;
mod ingest;
mod registry;
mod stack;

pub use crate::{
    algorithm::{AlgorithmDescriptor, ClapAlgorithm, NamedAlgorithm, RegistrationAlgorithm},
    args::existing_path,
    error::{AlgorithmError, RegistryError, RegistryErrorCode, StackError, StackErrorCode},
    registry::{AlgorithmRegistry, RESERVED_ARGUMENTS},
    stack::{ImageStack, STACK_FILE_NAME, StackShape},
};
