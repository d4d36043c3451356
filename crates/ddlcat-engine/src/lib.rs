//! ddlcat engine - catalog aggregation
//!
//! This crate turns a list of DDL source files into one catalog:
//! - Reading sources through a pluggable reader
//! - Resolving each file independently, in input order
//! - Isolating per-file failures
//! - Emitting progress and summary diagnostics

pub mod source;
pub mod ingest;

pub use source::{FsReader, SourceError, SourceReader};
pub use ingest::{build_catalog, Ingestion, Ingestor};
