#![forbid(unsafe_code)]

//! Command-line utilities behind the `dungeoneer` binary.
//!
//! The binary itself lives in `src/bin/cli.rs`; this module holds the
//! pieces that are useful as a library, currently the CSV import and
//! export of the catalog tables.

/// Catalog data import and export operations.
///
/// Reads and writes the CSV interchange format for duties and
/// collectables, including their acquisition sources.
pub mod import_export;
