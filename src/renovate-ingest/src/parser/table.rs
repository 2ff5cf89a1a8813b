//! Markdown dependency table extraction.
//!
//! Renovate describes its changes in a pipe table such as:
//!
//! ```text
//! | Package | Change | Age | Confidence |
//! |---|---|---|---|
//! | [serde](https://serde.rs) ([source](https://github.com/serde-rs/serde)) | [`1.0.190` -> `1.0.200`](https://renovatebot.com/diffs/...) | ... | ... |
//! ```

use super::ParseError;
use crate::model::DependencyChange;
use regex::Regex;
use std::sync::LazyLock;

static LINK_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("invalid link regex"));

static VERSION_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`]+)`\s*(?:->|→)\s*`([^`]+)`").expect("invalid version change regex")
});

/// Column positions of a recognized dependency table.
struct Columns {
    package: usize,
    change: usize,
}

/// Parses the first dependency table in `body`.
///
/// Every data row must yield a change; one malformed row rejects the table.
pub fn parse_table(body: &str) -> Result<Vec<DependencyChange>, ParseError> {
    let lines: Vec<&str> = body.lines().map(str::trim).collect();

    let mut index = 0;
    while index + 1 < lines.len() {
        let header = lines[index];
        let delimiter = lines[index + 1];
        if is_table_line(header) && is_delimiter_row(delimiter) {
            if let Some(columns) = find_columns(&split_cells(header)) {
                let rows: Vec<&str> = lines[index + 2..]
                    .iter()
                    .copied()
                    .take_while(|line| is_table_line(line))
                    .collect();
                return parse_rows(&rows, &columns);
            }
        }
        index += 1;
    }

    Err(ParseError::MissingTable)
}

fn parse_rows(rows: &[&str], columns: &Columns) -> Result<Vec<DependencyChange>, ParseError> {
    let mut changes = Vec::new();
    for (position, line) in rows.iter().enumerate() {
        let row = position + 1;
        let cells = split_cells(line);
        let malformed = |reason: &str| ParseError::MalformedRow {
            row,
            reason: reason.to_string(),
        };

        let package_cell = cells
            .get(columns.package)
            .ok_or_else(|| malformed("missing Package cell"))?;
        let change_cell = cells
            .get(columns.change)
            .ok_or_else(|| malformed("missing Change cell"))?;

        let name = package_name(package_cell).ok_or_else(|| malformed("empty package name"))?;
        let captures = VERSION_CHANGE
            .captures(change_cell)
            .ok_or_else(|| malformed("Change cell is not `old` -> `new`"))?;

        changes.push(DependencyChange {
            name,
            old_version: captures[1].trim().to_string(),
            new_version: captures[2].trim().to_string(),
        });
    }

    if changes.is_empty() {
        return Err(ParseError::EmptyTable);
    }
    Ok(changes)
}

fn is_table_line(line: &str) -> bool {
    line.starts_with('|')
}

fn is_delimiter_row(line: &str) -> bool {
    let cells = split_cells(line);
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let dashes = cell.trim_start_matches(':').trim_end_matches(':');
            !dashes.is_empty() && dashes.chars().all(|c| c == '-')
        })
}

fn find_columns(header: &[String]) -> Option<Columns> {
    let position = |name: &str| {
        header
            .iter()
            .position(|cell| cell.trim_matches('*').eq_ignore_ascii_case(name))
    };
    Some(Columns {
        package: position("Package")?,
        change: position("Change")?,
    })
}

/// Splits a pipe table row into trimmed cells, honoring `\|` escapes.
fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Returns the link text of the first link in the cell, or the plain cell
/// text with backticks removed.
fn package_name(cell: &str) -> Option<String> {
    let name = match LINK_TEXT.captures(cell) {
        Some(captures) => captures[1].to_string(),
        None => cell.to_string(),
    };
    let name = name.replace('`', "").trim().to_string();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENOVATE_BODY: &str = r#"This PR contains the following updates:

| Package | Type | Update | Change | Age |
|---|---|---|---|---|
| [serde](https://serde.rs) ([source](https://github.com/serde-rs/serde)) | dependencies | patch | [`1.0.190` -> `1.0.200`](https://renovatebot.com/diffs/crates/serde/1.0.190/1.0.200) | [![age](https://badges)](https://docs) |
| [tokio](https://tokio.rs) ([source](https://github.com/tokio-rs/tokio)) | dependencies | minor | [`1.35.0` -> `1.36.0`](https://renovatebot.com/diffs/crates/tokio/1.35.0/1.36.0) | |
| `actions/checkout` | action | major | `v3` -> `v4` | |

---

### Release Notes
"#;

    #[test]
    fn parses_every_row() {
        let changes = parse_table(RENOVATE_BODY).unwrap();

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].name, "serde");
        assert_eq!(changes[0].old_version, "1.0.190");
        assert_eq!(changes[0].new_version, "1.0.200");
        assert_eq!(changes[1].name, "tokio");
        assert_eq!(changes[2].name, "actions/checkout");
        assert_eq!(changes[2].old_version, "v3");
        assert_eq!(changes[2].new_version, "v4");
    }

    #[test]
    fn change_column_may_be_second() {
        let body = "| Package | Change |\n|:---|:---:|\n| lodash | `4.17.20` → `4.17.21` |\n";
        let changes = parse_table(body).unwrap();

        assert_eq!(
            changes,
            vec![DependencyChange {
                name: "lodash".to_string(),
                old_version: "4.17.20".to_string(),
                new_version: "4.17.21".to_string(),
            }]
        );
    }

    #[test]
    fn skips_tables_without_required_columns() {
        let body = "| File | Notes |\n|---|---|\n| a | b |\n\n| Package | Change |\n|---|---|\n| left-pad | `1.0.0` -> `1.1.0` |\n";
        let changes = parse_table(body).unwrap();
        assert_eq!(changes[0].name, "left-pad");
    }

    #[test]
    fn malformed_row_rejects_table() {
        let body = "| Package | Change |\n|---|---|\n| a | `1.0.0` -> `1.1.0` |\n| b | unknown |\n";
        assert_eq!(
            parse_table(body),
            Err(ParseError::MalformedRow {
                row: 2,
                reason: "Change cell is not `old` -> `new`".to_string(),
            })
        );
    }

    #[test]
    fn reports_missing_and_empty_tables() {
        assert_eq!(parse_table("no table here"), Err(ParseError::MissingTable));
        assert_eq!(
            parse_table("| Package | Change |\n|---|---|\n\ntext"),
            Err(ParseError::EmptyTable)
        );
    }

    #[test]
    fn splits_escaped_pipes() {
        assert_eq!(
            split_cells(r"| a \| b | c |"),
            vec!["a | b".to_string(), "c".to_string()]
        );
    }
}
