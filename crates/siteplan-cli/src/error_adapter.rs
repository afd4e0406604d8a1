//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use siteplan::SiteplanError;

use crate::CliError;

/// Adapter attaching a diagnostic code and help text to a [`CliError`].
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Siteplan(SiteplanError::Config(_)) => "siteplan::config",
            CliError::Io(_) => "siteplan::io",
            CliError::Siteplan(SiteplanError::Internal(_)) => "siteplan::internal",
            CliError::Input { .. } => "siteplan::input",
            CliError::ConfigFile(_) => "siteplan::config_file",
            CliError::Output(_) => "siteplan::output",
            CliError::Argument(_) => "siteplan::argument",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Siteplan(SiteplanError::Config(_)) => {
                "check the site definition: dimensions, building types and main_process_sequence"
            }
            CliError::Siteplan(SiteplanError::Internal(_)) => {
                "this is a bug in siteplan; please report it with the input file"
            }
            CliError::Input { .. } => "the input must be a JSON site definition",
            CliError::ConfigFile(_) => "see the [search], [generator], [fitness] and [constraints] sections",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use siteplan::ConfigError;

    use super::*;
    use crate::config::ConfigFileError;

    fn code(err: &CliError) -> Option<String> {
        ErrorAdapter(err).code().map(|code| code.to_string())
    }

    #[test]
    fn test_codes() {
        let config = CliError::Siteplan(SiteplanError::Config(ConfigError::NoSpaces));
        assert_eq!(code(&config).as_deref(), Some("siteplan::config"));

        let file = CliError::ConfigFile(ConfigFileError::Parse("bad".to_string()));
        assert_eq!(code(&file).as_deref(), Some("siteplan::config_file"));

        let io = CliError::Io(std::io::Error::other("disk"));
        assert_eq!(code(&io).as_deref(), Some("siteplan::io"));
    }

    #[test]
    fn test_library_errors_have_codes() {
        let library = [
            SiteplanError::Config(ConfigError::NoMainUnits),
            SiteplanError::Internal("chain".to_string()),
        ];
        let codes: Vec<Option<String>> = library
            .into_iter()
            .map(|err| code(&CliError::Siteplan(err)))
            .collect();
        assert_eq!(
            codes,
            vec![
                Some("siteplan::config".to_string()),
                Some("siteplan::internal".to_string())
            ]
        );
    }

    #[test]
    fn test_message_and_help() {
        let err = CliError::Siteplan(SiteplanError::Internal("broken chain".to_string()));
        let adapter = ErrorAdapter(&err);
        assert_eq!(adapter.to_string(), "Internal error: broken chain");
        assert!(adapter.help().is_some());

        let output = CliError::Argument("time limit".to_string());
        assert!(ErrorAdapter(&output).help().is_none());
    }
}
