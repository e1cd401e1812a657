//! Core data models for zdbtree
//!
//! This module contains the types produced by parsing `zdb -C` output: the
//! pool record and the tree of configuration nodes (vdevs) beneath it.

pub mod parser;
pub mod render;

pub use parser::{parse_named_pool_output, parse_pool_output, ParseError};
pub use render::render_pool;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pool as described by `zdb -C`
///
/// Created fresh by every parse and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    /// Pool name
    pub name: String,
    /// Pool GUID as supplied by the caller, empty when unknown
    pub guid: String,
    /// On-disk pool version
    pub version: String,
    /// Top-level nodes, in input order
    #[serde(rename = "children", default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl PoolRecord {
    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(Node::subtree_len).sum()
    }

    /// Finds the first node (depth-first) carrying the given GUID
    pub fn find_by_guid(&self, guid: u64) -> Option<&Node> {
        self.nodes.iter().find_map(|node| node.find_by_guid(guid))
    }
}

/// One entry of the pool configuration tree, typically a vdev
///
/// Recognized fields are exposed as typed values; every field seen for the
/// node, recognized or not, is also kept verbatim in `properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node type (`root`, `mirror`, `raidz`, `disk`, ...)
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<u64>,
    /// Device path for leaf vdevs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whole_disk: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metaslab_array: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metaslab_shift: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ashift: Option<i64>,
    /// Allocatable size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_log: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_txg: Option<u64>,
    /// Raw value of every field seen for this node, including `type`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Child nodes, in input order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a node of the given type with `type` already recorded in `properties`
    pub fn new(node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        let mut properties = BTreeMap::new();
        properties.insert("type".to_string(), node_type.clone());
        Self {
            node_type,
            properties,
            ..Self::default()
        }
    }

    /// Looks up a raw property value
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Whether this node is a log device
    pub fn is_log_device(&self) -> bool {
        self.is_log.unwrap_or(0) != 0
    }

    /// Nodes without children beneath (and including) this one, in input order
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if self.children.is_empty() {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }

    fn find_by_guid(&self, guid: u64) -> Option<&Node> {
        if self.guid == Some(guid) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_guid(guid))
    }
}
