//! Site definition loading.

use std::{fs, path::Path};

use log::debug;

use siteplan::definition::SiteDefinition;

use crate::CliError;

/// Reads and parses a JSON site definition.
///
/// # Errors
///
/// Returns [`CliError::Io`] when the file cannot be read and
/// [`CliError::Input`] when it is not a valid site definition.
pub fn read_definition(path: impl AsRef<Path>) -> Result<SiteDefinition, CliError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let definition: SiteDefinition =
        serde_json::from_str(&content).map_err(|source| CliError::Input {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(spaces = definition.space_count(); "Site definition parsed");
    Ok(definition)
}
