//! Search domain types: distance metrics and result envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column LanceDB adds to vector search results.
pub const DISTANCE_COLUMN: &str = "_distance";

/// Distance metric used to rank nearest neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Dot,
    /// Euclidean (L2) distance.
    L2,
}

impl DistanceMetric {
    pub const SUPPORTED: &'static [&'static str] = &["cosine", "dot", "euclidean", "l2"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Dot => "dot",
            DistanceMetric::L2 => "l2",
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            "l2" | "euclidean" => Ok(Self::L2),
            other => Err(format!(
                "invalid distance metric '{other}', must be one of: {}",
                Self::SUPPORTED.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result row: every non-vector column plus `_distance`.
pub type SearchHit = Map<String, Value>;

/// Ranked search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub table_name: String,
    /// `"semantic"` for `query_table`, `"hybrid"` for `hybrid_search`.
    pub search_type: String,
    pub metric: DistanceMetric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_threshold: Option<f32>,
    pub results: Vec<SearchHit>,
    pub count: usize,
}

/// Answer to a `top_k = 0` search: does anything match at all?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistenceCheck {
    pub query: String,
    pub table_name: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Results(SearchResponse),
    Existence(ExistenceCheck),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!("cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!("Euclidean".parse::<DistanceMetric>().unwrap(), DistanceMetric::L2);
        assert_eq!("l2".parse::<DistanceMetric>().unwrap(), DistanceMetric::L2);
        assert_eq!("DOT".parse::<DistanceMetric>().unwrap(), DistanceMetric::Dot);

        let err = "hamming".parse::<DistanceMetric>().unwrap_err();
        assert!(err.contains("hamming"));
        assert!(err.contains("cosine, dot, euclidean, l2"));
    }

    #[test]
    fn test_existence_outcome_serializes_flat() {
        let outcome = SearchOutcome::Existence(ExistenceCheck {
            query: "rust".to_string(),
            table_name: "Docs".to_string(),
            exists: true,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["exists"], true);
        assert!(json.get("results").is_none());
    }
}
