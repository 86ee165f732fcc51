//! Project status workflow graph and project options payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw payloads this short carry no graph (`""`, `"{}"`, `"null"`).
const MIN_GRAPH_PAYLOAD_LEN: usize = 5;

/// Allowed status transitions: status → statuses reachable from it.
///
/// Every status that appears as a target is also present as a key, so the
/// graph can be walked without missing-key checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusGraph(BTreeMap<String, Vec<String>>);

impl StatusGraph {
    /// Decode a stored `status_graph` column.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().len() <= MIN_GRAPH_PAYLOAD_LEN {
            return Ok(Self::default());
        }
        let edges: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;
        Ok(Self::from_edges(edges))
    }

    /// Build a normalized graph from an edge map.
    pub fn from_edges(edges: BTreeMap<String, Vec<String>>) -> Self {
        let mut graph: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (status, targets) in edges {
            for target in &targets {
                graph.entry(target.clone()).or_default();
            }
            graph.entry(status).or_default().extend(targets);
        }
        Self(graph)
    }

    /// Statuses reachable in one step from `status`.
    pub fn next(&self, status: &str) -> Option<&[String]> {
        self.0.get(status).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-project workflow options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOptions {
    #[serde(default)]
    pub require_cancelation_comment: Option<bool>,
    #[serde(default)]
    pub require_done_comment: Option<bool>,
    #[serde(default)]
    pub status_enable: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ProjectOptions {
    /// Decode a stored `options` column. JSON `null` yields the defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let options: Option<ProjectOptions> = serde_json::from_str(raw)?;
        Ok(options.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_payload_is_empty_graph() {
        for raw in ["", "{}", "null", " {} "] {
            let graph = StatusGraph::from_json(raw).unwrap();
            assert!(graph.is_empty(), "payload {raw:?} should be empty");
        }
    }

    #[test]
    fn test_targets_become_keys() {
        let graph = StatusGraph::from_json(r#"{"0": ["1", "2"], "1": ["3"]}"#).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.next("0").unwrap(), ["1".to_string(), "2".to_string()]);
        assert!(graph.next("3").unwrap().is_empty());
        assert!(graph.next("9").is_none());
    }

    #[test]
    fn test_malformed_graph_is_error() {
        assert!(StatusGraph::from_json(r#"{"0": "not-a-list"}"#).is_err());
        assert!(StatusGraph::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_graph_serializes_as_plain_map() {
        let graph = StatusGraph::from_json(r#"{"0": ["1"]}"#).unwrap();
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json, serde_json::json!({"0": ["1"], "1": []}));
    }

    #[test]
    fn test_options_decode() {
        let options =
            ProjectOptions::from_json(r##"{"status_enable": true, "color": "#fff"}"##).unwrap();
        assert_eq!(options.status_enable, Some(true));
        assert_eq!(options.color.as_deref(), Some("#fff"));
        assert_eq!(options.require_done_comment, None);
    }

    #[test]
    fn test_options_null_is_default() {
        assert_eq!(
            ProjectOptions::from_json("null").unwrap(),
            ProjectOptions::default()
        );
    }

    #[test]
    fn test_options_malformed_is_error() {
        assert!(ProjectOptions::from_json("").is_err());
        assert!(ProjectOptions::from_json(r#"{"status_enable": "yes"}"#).is_err());
    }
}
