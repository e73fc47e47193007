//! Shared clap value parsers.

use std::path::PathBuf;

/// Parses a filesystem path and requires that it already exists.
///
/// Used as a clap `value_parser` so missing inputs are rejected while the
/// command line is parsed, before any algorithm code runs.
///
/// # Errors
/// Returns a message naming the path when it is empty or does not exist.
///
/// # Examples
/// ```
/// use starfish_core::existing_path;
///
/// assert!(existing_path(".").is_ok());
/// assert!(existing_path("/definitely/not/here").is_err());
/// ```
pub fn existing_path(raw: &str) -> Result<PathBuf, String> {
    if raw.is_empty() {
        return Err("path must not be empty".to_owned());
    }
    let path = PathBuf::from(raw);
    match path.try_exists() {
        Ok(true) => Ok(path),
        Ok(false) => Err(format!("`{raw}` does not exist")),
        Err(err) => Err(format!("cannot access `{raw}`: {err}")),
    }
}
