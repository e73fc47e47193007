//! Built-in registration algorithms and the process-wide registry.
//!
//! Algorithms become selectable by being listed in [`builtin_descriptors`].
//! The registry built from that table is created on first use and never
//! modified afterwards.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use starfish_core::{AlgorithmDescriptor, AlgorithmRegistry, RegistryError};
use tracing::info;

static REGISTRY: OnceCell<AlgorithmRegistry> = OnceCell::new();

/// Every algorithm shipped with the CLI, in subcommand order.
///
/// # Examples
/// ```
/// use starfish_core::AlgorithmDescriptor as _;
///
/// let names: Vec<_> = starfish_cli::algorithms::builtin_descriptors()
///     .iter()
///     .map(|descriptor| descriptor.name())
///     .collect();
/// assert_eq!(names, ["fourier_shift", "translate"]);
/// ```
#[must_use]
pub fn builtin_descriptors() -> Vec<Arc<dyn AlgorithmDescriptor>> {
    vec![
        Arc::new(&starfish_registration_fourier::DESCRIPTOR) as Arc<dyn AlgorithmDescriptor>,
        Arc::new(&starfish_registration_translate::DESCRIPTOR) as Arc<dyn AlgorithmDescriptor>,
    ]
}

/// Returns the process-wide registry, building it on first use.
///
/// Concurrent and repeated calls observe the same instance; a failed build is
/// not cached, so the configuration error is reported by every caller.
///
/// # Errors
/// Returns [`RegistryError`] when the built-in table is inconsistent, for
/// example when two algorithms share a name.
pub fn registry() -> Result<&'static AlgorithmRegistry, RegistryError> {
    REGISTRY.get_or_try_init(|| {
        let registry = AlgorithmRegistry::from_descriptors(builtin_descriptors())?;
        info!(algorithms = registry.len(), "registration algorithms discovered");
        Ok(registry)
    })
}
