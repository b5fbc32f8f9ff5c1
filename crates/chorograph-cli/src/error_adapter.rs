//! Error adapter for converting ChorographError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use chorograph::{ChorographError, TopologyError};

/// Adapter giving a [`ChorographError`] an error code and help text.
pub struct ErrorAdapter<'a>(pub &'a ChorographError);

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
        let code = match &self.0 {
            ChorographError::Topology(_) => "chorograph::topology",
            ChorographError::NoGeometry => "chorograph::no_geometry",
            ChorographError::DegenerateBounds { .. } => "chorograph::degenerate_bounds",
            ChorographError::InvalidArgument(_) => "chorograph::invalid_argument",
            ChorographError::Data(_) => "chorograph::data",
            ChorographError::DuplicateKey(_) => "chorograph::duplicate_key",
            ChorographError::Io(_) => "chorograph::io",
            ChorographError::Export(_) => "chorograph::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            ChorographError::Topology(TopologyError::UnknownObject(_)) => {
                "check the `object` of each configured layer against the topology's objects"
            }
            ChorographError::Topology(TopologyError::NotATopology(_)) => {
                "the input must be a TopoJSON document with \"type\": \"Topology\""
            }
            ChorographError::Topology(_) => return None,
            ChorographError::NoGeometry => {
                "make at least one layer visible and point it at an object with coordinates"
            }
            ChorographError::DegenerateBounds { .. } => {
                "the visible layers must span a non-zero width and height"
            }
            ChorographError::InvalidArgument(_) => return None,
            ChorographError::Data(_) => "the data file must hold a JSON array of records",
            ChorographError::DuplicateKey(_) => {
                "disable `strict_keys` in the [data] section to keep the last record per key"
            }
            ChorographError::Io(_) | ChorographError::Export(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = ChorographError::NoGeometry;
        let adapter = ErrorAdapter(&err);
        assert_eq!(
            adapter.code().map(|code| code.to_string()).as_deref(),
            Some("chorograph::no_geometry")
        );
        assert!(adapter.help().is_some());

        let err = ChorographError::invalid_argument("bad");
        let adapter = ErrorAdapter(&err);
        assert_eq!(
            adapter.code().map(|code| code.to_string()).as_deref(),
            Some("chorograph::invalid_argument")
        );
        assert!(adapter.help().is_none());
        assert_eq!(adapter.to_string(), "Invalid argument: bad");
    }

    #[test]
    fn test_data_error_keeps_source() {
        let err = chorograph::MapBuilder::default().parse_data("[{").unwrap_err();
        let adapter = ErrorAdapter(&err);
        assert_eq!(
            adapter.code().map(|code| code.to_string()).as_deref(),
            Some("chorograph::data")
        );
        assert!(adapter.help().is_some());
        assert!(std::error::Error::source(&adapter).is_some());
    }

    #[test]
    fn test_topology_help() {
        let err = ChorographError::from(TopologyError::UnknownObject("lakes".to_string()));
        let adapter = ErrorAdapter(&err);
        assert!(adapter.help().is_some());

        let mut writer = String::new();
        miette::GraphicalReportHandler::new()
            .render_report(&mut writer, &adapter)
            .unwrap();
        assert!(writer.contains("chorograph::topology"));
    }
}
