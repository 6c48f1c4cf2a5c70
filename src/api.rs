//! The convenience surface the template-variable UI layer calls: parse a
//! query, resolve it against the session's topology snapshot and shape the
//! result into dropdown options. Incomplete queries and resolution misses
//! both map to an empty option list, never to an error.

use crate::grammar::parse;
use crate::resolver::resolve;
use crate::topology::{NetworkAtlas, NetworkNode};
use serde::Serialize;

/// One presented value for a template variable's dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableOption {
    /// `"<name> (<address>)"`, with the address segment omitted when empty.
    pub text: String,
    /// The node id.
    pub value: i64,
}

impl VariableOption {
    fn for_node(node: &NetworkNode) -> VariableOption {
        let text = if node.address.is_empty() {
            node.name.clone()
        } else {
            format!("{} ({})", node.name, node.address)
        };
        VariableOption {
            text,
            value: node.id,
        }
    }
}

/// Parses and resolves `query` in one step. A query the grammar does not
/// fully consume, or one whose resolution misses, yields an empty list.
pub fn process(query: &str, atlas: &NetworkAtlas) -> Vec<VariableOption> {
    let outcome = parse(query);
    if !outcome.complete_parsed {
        return Vec::new();
    }
    let resolution = resolve(&outcome.tokens, atlas);
    if !resolution.success {
        return Vec::new();
    }
    resolution.nodes.iter().map(VariableOption::for_node).collect()
}
