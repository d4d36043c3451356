//! Catalog aggregation over many source files
//!
//! Files are processed in the given order, each with a fresh resolver, and
//! their catalogs are appended to the running result. A file that cannot be
//! read or resolved is reported and skipped; it never stops the run.

use crate::source::{FsReader, SourceReader};
use ddlcat_core::{Catalog, Diagnostic, DiagnosticCode, Location, Report, Severity};
use ddlcat_sql::{resolve, ResolveOptions};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Outcome of an ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct Ingestion {
    pub catalog: Catalog,

    /// Progress and error messages in emission order
    pub diagnostics: Vec<Diagnostic>,

    /// Files attempted
    pub files_processed: usize,

    /// Files skipped because of an error
    pub files_failed: usize,
}

impl Ingestion {
    /// Build the serialisable run report
    pub fn report(&self) -> Report {
        Report::new(&self.catalog, self.files_processed, self.files_failed, self.diagnostics.clone())
    }

    pub fn has_errors(&self) -> bool {
        self.files_failed > 0
    }
}

/// Why a single file was skipped
#[derive(Debug)]
enum FileFailure {
    Read(String),
    Parse(String),
}

/// Drives resolution over a list of source files
pub struct Ingestor<R> {
    reader: R,
    options: ResolveOptions,
}

impl<R: SourceReader> Ingestor<R> {
    pub fn new(reader: R, options: ResolveOptions) -> Self {
        Self { reader, options }
    }

    /// Process `paths` in order and collect everything that resolved
    pub fn ingest<P: AsRef<Path>>(&self, paths: &[P]) -> Ingestion {
        let mut catalog = Catalog::new();
        let mut diagnostics = Vec::new();
        let mut files_failed = 0;

        for path in paths {
            let path = path.as_ref();
            let location = Location::new(path.display().to_string());

            emit(
                &mut diagnostics,
                Diagnostic::info(DiagnosticCode::SourceStarted, format!("Processing {}", path.display()))
                    .with_location(location.clone()),
            );

            match self.ingest_file(path) {
                Ok(file_catalog) => catalog.extend(file_catalog),
                Err(failure) => {
                    files_failed += 1;
                    let (code, message) = match failure {
                        FileFailure::Read(message) => (
                            DiagnosticCode::SourceReadError,
                            format!("Failed to read {}: {}", path.display(), message),
                        ),
                        FileFailure::Parse(message) => (
                            DiagnosticCode::SourceParseError,
                            format!("Failed to parse {}: {}", path.display(), message),
                        ),
                    };
                    emit(&mut diagnostics, Diagnostic::error(code, message).with_location(location));
                }
            }
        }

        for (count, kind) in [
            (catalog.tables.len(), "tables"),
            (catalog.enums.len(), "enums"),
            (catalog.functions.len(), "functions"),
            (catalog.composite_types.len(), "composite types"),
            (catalog.views.len(), "views"),
        ] {
            emit(
                &mut diagnostics,
                Diagnostic::info(DiagnosticCode::CatalogSummary, format!("Found {} {}", count, kind)),
            );
        }

        Ingestion {
            catalog,
            diagnostics,
            files_processed: paths.len(),
            files_failed,
        }
    }

    fn ingest_file(&self, path: &Path) -> Result<Catalog, FileFailure> {
        let text = match panic::catch_unwind(AssertUnwindSafe(|| self.reader.read(path))) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(FileFailure::Read(format!("{:#}", e))),
            Err(payload) => return Err(FileFailure::Read(panic_message(payload))),
        };

        let (catalog, stats) = panic::catch_unwind(AssertUnwindSafe(|| resolve(&text, &self.options)))
            .map_err(|payload| FileFailure::Parse(panic_message(payload)))?;

        tracing::debug!(
            file = %path.display(),
            statements = stats.statements,
            recognized = stats.recognized,
            dropped = stats.dropped,
            "resolved source"
        );
        Ok(catalog)
    }
}

/// Record a diagnostic and mirror it to the log
fn emit(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    match diagnostic.severity {
        Severity::Error => tracing::error!(code = %diagnostic.code, "{}", diagnostic.message),
        Severity::Info => tracing::info!(code = %diagnostic.code, "{}", diagnostic.message),
    }
    diagnostics.push(diagnostic);
}

/// Displayable text of a panic payload
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}

/// Build a catalog from files on disk
pub fn build_catalog<P: AsRef<Path>>(paths: &[P], default_schema: &str, extract_comments: bool) -> Catalog {
    Ingestor::new(FsReader, ResolveOptions::new(default_schema, extract_comments))
        .ingest(paths)
        .catalog
}
