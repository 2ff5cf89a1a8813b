//! Pull request title fallback.

use super::ParseError;
use crate::model::DependencyChange;
use regex::Regex;
use std::sync::LazyLock;

/// Suffixes Renovate appends to titles, stripped before matching.
const TITLE_SUFFIXES: &[&str] = &[" - autoclosed", " - abandoned", " (major)", " [SECURITY]"];

/// Words Renovate puts around the package name, e.g.
/// `Update Rust crate serde to v1.0.200` or `Update node docker tag to v20`.
const NAME_PREFIXES: &[&str] = &["dependency ", "Rust crate ", "module ", "docker image "];
const NAME_SUFFIXES: &[&str] = &[" docker tag", " action", " digest", " image"];

static UPDATE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:(?:chore|fix|build)(?:\([^)]*\))?!?:\s+)?
        (?i:update|bump|pin)\s+
        (?P<name>.+?)\s+
        (?:from\s+(?P<old>\S+)\s+)?
        to\s+(?P<new>\S+)$",
    )
    .expect("invalid update title regex")
});

/// Parses a single change from a pull request title.
///
/// Recognizes `Update|Bump|Pin [dependency] NAME [from OLD] to NEW`, with or
/// without a semantic commit prefix. A missing old version is returned as an
/// empty string.
pub fn parse_title(title: &str) -> Result<DependencyChange, ParseError> {
    let unrecognized = || ParseError::UnrecognizedTitle {
        title: title.to_string(),
    };

    let stripped = strip_suffixes(title.trim());
    let captures = UPDATE_TITLE.captures(stripped).ok_or_else(unrecognized)?;

    let name = strip_name_affixes(&captures["name"]);
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(unrecognized());
    }

    Ok(DependencyChange {
        name: name.to_string(),
        old_version: captures
            .name("old")
            .map(|old| old.as_str().to_string())
            .unwrap_or_default(),
        new_version: captures["new"].to_string(),
    })
}

fn strip_suffixes(mut title: &str) -> &str {
    loop {
        let before = title;
        for suffix in TITLE_SUFFIXES {
            title = title.strip_suffix(suffix).unwrap_or(title).trim_end();
        }
        if title == before {
            return title;
        }
    }
}

fn strip_name_affixes(name: &str) -> &str {
    let name = NAME_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);
    NAME_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
        .trim()
}
