//! Dependency change extraction from pull request text.
//!
//! The dependency table in the body is authoritative. When the body has no
//! usable table, a single change is recovered from the title instead.

mod error;
mod table;
mod title;

pub use error::ParseError;
pub use table::parse_table;
pub use title::parse_title;

use crate::model::DependencyChange;

/// Extracts every dependency change described by a pull request.
///
/// # Errors
///
/// Returns [`ParseError::Unparseable`] carrying both the table and the title
/// failure when neither yields a change.
pub fn parse_dependency_changes(
    title: &str,
    body: &str,
) -> Result<Vec<DependencyChange>, ParseError> {
    let table_error = match parse_table(body) {
        Ok(changes) => return Ok(changes),
        Err(error) => error,
    };

    match parse_title(title) {
        Ok(change) => Ok(vec![change]),
        Err(title_error) => Err(ParseError::Unparseable {
            table: Box::new(table_error),
            title: Box::new(title_error),
        }),
    }
}
