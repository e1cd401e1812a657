//! Plain-text rendering of a parsed pool

use std::fmt;

use super::{Node, PoolRecord};

/// Renders a pool header followed by its node tree, two spaces per level
pub fn render_pool(pool: &PoolRecord) -> String {
    pool.to_string()
}

impl fmt::Display for PoolRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:    {}", self.name)?;
        writeln!(f, "GUID:    {}", self.guid)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "VDEVs:")?;
        for node in &self.nodes {
            write_node(f, node, 2)?;
        }
        Ok(())
    }
}

fn write_node(out: &mut impl fmt::Write, node: &Node, indent: usize) -> fmt::Result {
    write!(out, "{:indent$}- type={}", "", node.node_type)?;
    if let Some(path) = &node.path {
        write!(out, " path={path}")?;
    }
    if let Some(guid) = node.guid {
        write!(out, " guid={guid}")?;
    }
    if node.is_log_device() {
        out.write_str(" (log)")?;
    }
    out.write_char('\n')?;

    for child in &node.children {
        write_node(out, child, indent + 2)?;
    }
    Ok(())
}
