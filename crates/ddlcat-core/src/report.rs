//! Ingestion report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::catalog::Catalog;
use crate::diagnostic::{Diagnostic, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Source files attempted
    pub files_processed: usize,

    /// Source files skipped because of an error
    pub files_failed: usize,

    pub tables: usize,
    pub enums: usize,
    pub functions: usize,
    pub composite_types: usize,
    pub views: usize,
    pub indexes: usize,
    pub relationships: usize,

    /// Number of error diagnostics
    pub errors: usize,

    /// Number of info diagnostics
    pub info: usize,
}

impl ReportSummary {
    /// Count the artifacts of a catalog
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            tables: catalog.tables.len(),
            enums: catalog.enums.len(),
            functions: catalog.functions.len(),
            composite_types: catalog.composite_types.len(),
            views: catalog.views.len(),
            indexes: catalog.index_count(),
            relationships: catalog.relationship_count(),
            ..Self::default()
        }
    }
}

/// Ingestion report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All diagnostics, in emission order
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Build a report for a finished catalog
    pub fn new(
        catalog: &Catalog,
        files_processed: usize,
        files_failed: usize,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut summary = ReportSummary::from_catalog(catalog);
        summary.files_processed = files_processed;
        summary.files_failed = files_failed;
        summary.errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
        summary.info = diagnostics.iter().filter(|d| d.severity == Severity::Info).count();

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            diagnostics,
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Column, Table};
    use crate::diagnostic::DiagnosticCode;

    #[test]
    fn empty_report() {
        let report = Report::new(&Catalog::new(), 0, 0, Vec::new());
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary, ReportSummary::default());
        assert!(!report.has_errors());
    }

    #[test]
    fn report_counts_catalog_and_diagnostics() {
        let mut catalog = Catalog::new();
        catalog.tables.push(Table::new("public", "users", vec![Column::new("id", "uuid")]));

        let diagnostics = vec![
            Diagnostic::info(DiagnosticCode::SourceStarted, "Processing a.sql"),
            Diagnostic::error(DiagnosticCode::SourceReadError, "Failed to read b.sql: gone"),
        ];

        let report = Report::new(&catalog, 2, 1, diagnostics);
        assert_eq!(report.summary.files_processed, 2);
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.summary.tables, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.info, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn failed_files_come_from_the_caller() {
        let diagnostics = vec![
            Diagnostic::error(DiagnosticCode::SourceReadError, "Failed to read a.sql: gone"),
            Diagnostic::error(DiagnosticCode::SourceParseError, "Failed to parse b.sql: boom"),
            Diagnostic::error(DiagnosticCode::SourceReadError, "Failed to read c.sql: gone"),
        ];

        let report = Report::new(&Catalog::new(), 5, 2, diagnostics);
        assert_eq!(report.summary.files_processed, 5);
        assert_eq!(report.summary.files_failed, 2);
        assert_eq!(report.summary.errors, 3);
    }

    #[test]
    fn report_serialization() {
        let report = Report::new(&Catalog::new(), 0, 0, Vec::new());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"diagnostics\""));
    }
}
