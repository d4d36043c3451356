//! ddlcat Core
//!
//! Core domain model for the resolved schema catalog.
//! Never rename diagnostic codes - they are part of the public API.

pub mod catalog;
pub mod diagnostic;
pub mod report;
pub mod config;

pub use catalog::{
    Argument, ArgumentMode, Attribute, Catalog, Column, CompositeType, EnumType, Function,
    Index, QualifiedName, Relationship, Table, View, ViewColumn,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError};
