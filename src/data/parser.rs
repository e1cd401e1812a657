//! Parser for the indented configuration dump printed by `zdb -C`
//!
//! Each non-blank line has the shape `<TAB>*field: value`. Only `type` lines
//! open a new node; the number of leading tabs on a `type` line decides which
//! open nodes it closes and therefore who its parent is. Every other line
//! attaches to the most recently opened node, whatever its own indentation.

use thiserror::Error;

use super::{Node, PoolRecord};

/// Errors that can occur while parsing zdb output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input contained nothing but whitespace
    #[error("no output from zdb for pool {pool}")]
    EmptyOutput { pool: String },

    /// A recognized field carried a value of the wrong shape
    #[error("failed to parse {field} for pool {pool}: invalid value '{value}'")]
    InvalidField {
        field: &'static str,
        pool: String,
        value: String,
    },
}

/// An open node: its index in the parent's child list and the depth of its `type` line
#[derive(Debug, Clone, Copy)]
struct Frame {
    index: usize,
    depth: usize,
}

/// Parses zdb output into a pool record
///
/// # Returns
/// * `Ok(PoolRecord)` with the version, name and node tree found in `text`
/// * `Err(ParseError::EmptyOutput)` if `text` is blank
/// * `Err(ParseError::InvalidField)` if a typed field could not be converted
pub fn parse_pool_output(text: &str) -> Result<PoolRecord, ParseError> {
    parse_named_pool_output("", text)
}

/// Parses zdb output for a pool whose name is already known
///
/// The record starts out named `name`; a top-level `name:` line overrides it.
pub fn parse_named_pool_output(name: &str, text: &str) -> Result<PoolRecord, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyOutput {
            pool: name.to_string(),
        });
    }

    let mut pool = PoolRecord {
        name: name.to_string(),
        ..PoolRecord::default()
    };
    let mut stack: Vec<Frame> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let depth = line.chars().take_while(|c| *c == '\t').count();
        let Some((field, value)) = line.trim_start_matches(['\t', ' ']).split_once(':') else {
            continue;
        };
        let field = field.trim();
        let value = value.trim();

        if stack.is_empty() {
            match field {
                "version" => {
                    pool.version = value.to_string();
                    continue;
                }
                "name" => {
                    pool.name = value.to_string();
                    continue;
                }
                _ => {}
            }
        }

        if field == "type" {
            while stack.last().is_some_and(|frame| frame.depth >= depth) {
                stack.pop();
            }

            let Some(siblings) = open_children_mut(&mut pool.nodes, &stack) else {
                continue;
            };
            siblings.push(Node::new(value));
            stack.push(Frame {
                index: siblings.len() - 1,
                depth,
            });
            continue;
        }

        // Properties before the first `type` line have no owner.
        let Some(node) = open_node_mut(&mut pool.nodes, &stack) else {
            continue;
        };
        apply_field(node, field, value).map_err(|field| ParseError::InvalidField {
            field,
            pool: pool.name.clone(),
            value: value.to_string(),
        })?;
    }

    Ok(pool)
}

/// Resolves the child list of the innermost open node, or the top level when nothing is open
fn open_children_mut<'a>(nodes: &'a mut Vec<Node>, stack: &[Frame]) -> Option<&'a mut Vec<Node>> {
    let mut children = nodes;
    for frame in stack {
        children = &mut children.get_mut(frame.index)?.children;
    }
    Some(children)
}

/// Resolves the innermost open node
fn open_node_mut<'a>(nodes: &'a mut Vec<Node>, stack: &[Frame]) -> Option<&'a mut Node> {
    let (top, parents) = stack.split_last()?;
    open_children_mut(nodes, parents)?.get_mut(top.index)
}

/// Records a field on a node, filling the typed slot when the name is recognized
///
/// On failure, returns the name of the field whose value could not be converted.
fn apply_field(node: &mut Node, field: &str, value: &str) -> Result<(), &'static str> {
    node.properties.insert(field.to_string(), value.to_string());

    match field {
        "path" => node.path = Some(value.to_string()),
        "id" => node.id = Some(parse_id(value)?),
        "guid" => node.guid = Some(parse_guid(value)?),
        "whole_disk" => node.whole_disk = Some(parse_whole_disk(value)?),
        "metaslab_array" => node.metaslab_array = Some(parse_metaslab_array(value)?),
        "metaslab_shift" => node.metaslab_shift = Some(parse_metaslab_shift(value)?),
        "ashift" => node.ashift = Some(parse_ashift(value)?),
        "asize" => node.asize = Some(parse_asize(value)?),
        "is_log" => node.is_log = Some(parse_is_log(value)?),
        "create_txg" => node.create_txg = Some(parse_create_txg(value)?),
        _ => {}
    }
    Ok(())
}

fn parse_id(value: &str) -> Result<i64, &'static str> {
    value.parse().map_err(|_| "id")
}

fn parse_guid(value: &str) -> Result<u64, &'static str> {
    value.parse().map_err(|_| "guid")
}

fn parse_whole_disk(value: &str) -> Result<i64, &'static str> {
    value.parse().map_err(|_| "whole_disk")
}

fn parse_metaslab_array(value: &str) -> Result<i64, &'static str> {
    value.parse().map_err(|_| "metaslab_array")
}

fn parse_metaslab_shift(value: &str) -> Result<i64, &'static str> {
    value.parse().map_err(|_| "metaslab_shift")
}

fn parse_ashift(value: &str) -> Result<i64, &'static str> {
    value.parse().map_err(|_| "ashift")
}

fn parse_asize(value: &str) -> Result<u64, &'static str> {
    value.parse().map_err(|_| "asize")
}

fn parse_is_log(value: &str) -> Result<i64, &'static str> {
    value.parse().map_err(|_| "is_log")
}

fn parse_create_txg(value: &str) -> Result<u64, &'static str> {
    value.parse().map_err(|_| "create_txg")
}
