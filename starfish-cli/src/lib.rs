//! Support library for the starfish CLI binary.
//!
//! Exposes the algorithm registry, command construction and dispatch so
//! integration tests can drive the `register` pipeline without forking a
//! subprocess.

pub mod algorithms;
pub mod cli;
pub mod logging;
