//! Dependency parser error types.

use thiserror::Error;

/// Reasons a pull request yielded no dependency changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The body has no table with both a `Package` and a `Change` column.
    #[error("no table with 'Package' and 'Change' columns")]
    MissingTable,

    /// The dependency table has a header but no data rows.
    #[error("dependency table has no rows")]
    EmptyTable,

    /// A data row of the dependency table could not be read.
    #[error("dependency table row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// The title does not follow a recognized update pattern.
    #[error("title '{title}' does not name a single dependency update")]
    UnrecognizedTitle { title: String },

    /// Neither the table nor the title produced a change.
    #[error("{table}; {title}")]
    Unparseable {
        table: Box<ParseError>,
        title: Box<ParseError>,
    },
}
