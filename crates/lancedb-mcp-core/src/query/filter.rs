//! Filter expression checks and distance-clause extraction.
//!
//! Filters are SQL-like predicates evaluated by LanceDB. Before a filter is
//! passed on, delete requests are screened for tautologies, and hybrid search
//! pulls `_distance < x` style clauses out of the filter: LanceDB cannot
//! pre-filter on a distance it has not computed yet, so those clauses become
//! a post-search distance threshold instead.

use lancedb_mcp_types::error::OperationError;

/// Column names treated as referring to the search distance.
const DISTANCE_ALIASES: &[&str] = &["_distance", "distance", "score"];

/// Filters that match every row.
const TAUTOLOGIES: &[&str] = &["true", "1=1"];

/// Trim a filter and reject it when empty.
pub fn require_filter<'a>(filter_expr: &'a str, action: &str) -> Result<&'a str, OperationError> {
    let trimmed = filter_expr.trim();
    if trimmed.is_empty() {
        return Err(OperationError::invalid(format!(
            "filter expression cannot be empty; specify a filter to select documents to {action}"
        )));
    }
    Ok(trimmed)
}

/// Whether a filter trivially selects every row (`true`, `1=1`, `1 = 1`).
pub fn is_tautology(filter_expr: &str) -> bool {
    let normalized: String = filter_expr
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    TAUTOLOGIES.contains(&normalized.as_str())
}

/// A filter split into its database part and its distance part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitFilter {
    /// Clauses LanceDB should evaluate, re-joined with `AND`.
    pub remaining: Option<String>,
    /// Upper bound on `_distance` taken from `<`, `<=`, `=` clauses.
    pub threshold: Option<f32>,
    /// Distance clauses that cannot become an upper bound (`>`, `>=`, `!=`).
    pub ignored: Vec<String>,
}

/// Split `AND`-joined distance clauses out of a filter.
///
/// Filters containing a top-level `OR` are returned unchanged: pulling a
/// clause out of a disjunction would change its meaning. When several upper
/// bounds are present the smallest wins.
pub fn split_distance_clauses(filter_expr: &str) -> SplitFilter {
    let trimmed = filter_expr.trim();
    if trimmed.is_empty() {
        return SplitFilter::default();
    }

    if !find_keyword(trimmed, "or").is_empty() {
        return SplitFilter {
            remaining: Some(trimmed.to_string()),
            ..Default::default()
        };
    }

    let mut split = SplitFilter::default();
    let mut kept = Vec::new();

    for clause in split_on_keyword(trimmed, "and") {
        match parse_distance_clause(clause) {
            Some((op, value)) if matches!(op, "<" | "<=" | "=" | "==") => {
                split.threshold = Some(match split.threshold {
                    Some(existing) => existing.min(value),
                    None => value,
                });
            }
            Some(_) => split.ignored.push(clause.to_string()),
            None => kept.push(clause),
        }
    }

    if !kept.is_empty() {
        split.remaining = Some(kept.join(" AND "));
    }
    split
}

/// Parse `<alias> <op> <number>`; returns the operator and the number.
fn parse_distance_clause(clause: &str) -> Option<(&'static str, f32)> {
    let clause = clause.trim();
    let lower = clause.to_ascii_lowercase();

    let alias = DISTANCE_ALIASES
        .iter()
        .find(|alias| lower.starts_with(*alias))?;
    let rest = clause[alias.len()..].trim_start();

    // Longest operators first so `<=` is not read as `<`.
    const OPERATORS: &[&str] = &["<=", ">=", "==", "!=", "<>", "<", ">", "="];
    let op = OPERATORS.iter().find(|op| rest.starts_with(*op))?;
    let value = rest[op.len()..].trim().parse::<f32>().ok()?;

    Some((*op, value))
}

/// Byte offsets of a keyword at paren depth zero, outside string literals,
/// bounded by non-identifier characters.
fn find_keyword(expr: &str, keyword: &str) -> Vec<usize> {
    let bytes = expr.as_bytes();
    let lower = expr.to_ascii_lowercase();
    let lower = lower.as_bytes();
    let kw = keyword.as_bytes();

    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut positions = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' => in_quote = true,
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ if depth == 0
                && lower[i..].starts_with(kw)
                && (i == 0 || !is_ident(bytes[i - 1]))
                && (i + kw.len() == bytes.len() || !is_ident(bytes[i + kw.len()])) =>
            {
                positions.push(i);
                i += kw.len();
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    positions
}

fn split_on_keyword<'a>(expr: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in find_keyword(expr, keyword) {
        parts.push(expr[start..pos].trim());
        start = pos + keyword.len();
    }
    parts.push(expr[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}
