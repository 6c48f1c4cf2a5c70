//! Resolves a parsed query token sequence against a topology snapshot.
//! Tokens are processed left to right as a filtering pipeline over a current
//! node list; the first token that cannot be resolved stops processing and
//! yields an unsuccessful, empty resolution. Nothing here errors: a missing
//! folder may simply mean the topology has not converged yet, or a typo.

use crate::device_type::classifier_matches;
use crate::token::{Token, TokenTag};
use crate::topology::{NetworkAtlas, NetworkNode, MONITORING_PACKS_NET_ID, ROOT_NET_ID};
use log::debug;

/// Static fallback from well-known monitoring-pack names to their fixed net
/// ids, for installations where the dynamic monitoring-pack map tree is
/// unavailable or has been renamed.
pub const STATIC_MONITORING_PACKS: &[(&str, i64)] = &[
    ("device health", 101),
    ("cpu utilization", 102),
    ("memory utilization", 103),
    ("disk utilization", 104),
    ("interface utilization", 105),
    ("ping availability", 106),
];

/// The outcome of resolving one query. `success: false` always carries an
/// empty node list.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub success: bool,
    pub nodes: Vec<NetworkNode>,
}

impl Resolution {
    fn failed() -> Resolution {
        Resolution {
            success: false,
            nodes: Vec::new(),
        }
    }
}

/// Walks the token sequence produced by [`crate::grammar::parse`], carrying a
/// current node list through the per-tag processors. Stops at the first
/// failing token.
pub fn resolve(tokens: &[Token], atlas: &NetworkAtlas) -> Resolution {
    let mut current: Vec<NetworkNode> = Vec::new();
    for token in tokens {
        let applied = match token.tag {
            TokenTag::Nodes => {
                current = atlas.nodes_in_order().cloned().collect();
                true
            }
            TokenTag::DeviceType => apply_device_type(token, &mut current),
            TokenTag::NetworkMap => apply_network_map(token, atlas, &mut current),
            TokenTag::MonitoringPack => apply_monitoring_pack(token, atlas, &mut current),
            // Structural and leaf tags never appear at the top level of a
            // parsed query; they carry no filtering of their own.
            TokenTag::Query
            | TokenTag::Folders
            | TokenTag::FoldersView
            | TokenTag::Group
            | TokenTag::MonitoringPacks
            | TokenTag::NetworkAtlas
            | TokenTag::Folder
            | TokenTag::View
            | TokenTag::Name
            | TokenTag::Selector
            | TokenTag::Nothing => true,
        };
        if !applied {
            debug!("resolution stopped at token {:?}", token.tag);
            return Resolution::failed();
        }
    }
    Resolution {
        success: true,
        nodes: current,
    }
}

fn apply_device_type(token: &Token, current: &mut Vec<NetworkNode>) -> bool {
    let Some(keyword) = token.as_text() else {
        return false;
    };
    current.retain(|node| classifier_matches(keyword, &node.classifier));
    true
}

fn apply_network_map(token: &Token, atlas: &NetworkAtlas, current: &mut Vec<NetworkNode>) -> bool {
    let Some(target) = walk_path(atlas, ROOT_NET_ID, &path_segments(token)) else {
        return false;
    };
    filter_by_map(atlas, target, current);
    true
}

fn apply_monitoring_pack(
    token: &Token,
    atlas: &NetworkAtlas,
    current: &mut Vec<NetworkNode>,
) -> bool {
    let segments = path_segments(token);
    if let Some(target) = walk_path(atlas, MONITORING_PACKS_NET_ID, &segments) {
        filter_by_map(atlas, target, current);
        return true;
    }
    // Dynamic walk failed; fall back to the static name table keyed by the
    // pack name (the final path segment).
    let Some(net_id) = token
        .sub_tokens()
        .iter()
        .rev()
        .find(|sub| sub.tag == TokenTag::Name)
        .and_then(|sub| sub.as_text())
        .and_then(static_pack_id)
    else {
        return false;
    };
    if atlas.map(net_id).is_none() {
        return false;
    }
    debug!("monitoring pack resolved through static fallback to net id {net_id}");
    filter_by_map(atlas, net_id, current);
    true
}

/// The display-name path a map or pack token encodes: the atlas/folder/view
/// or folder/name parameters, in query order.
fn path_segments(token: &Token) -> Vec<&str> {
    token
        .sub_tokens()
        .iter()
        .filter_map(|sub| sub.as_text())
        .collect()
}

/// Follows `segments` one child level at a time from `start`. `None` as soon
/// as a segment has no matching child (or the start map itself is unknown).
fn walk_path(atlas: &NetworkAtlas, start: i64, segments: &[&str]) -> Option<i64> {
    let mut at = atlas.map(start)?.net_id;
    for segment in segments {
        at = atlas.child_by_display_name(at, segment)?.net_id;
    }
    Some(at)
}

fn filter_by_map(atlas: &NetworkAtlas, net_id: i64, current: &mut Vec<NetworkNode>) {
    let member_ids = atlas.all_node_ids(net_id);
    current.retain(|node| member_ids.contains(&node.id));
}

fn static_pack_id(name: &str) -> Option<i64> {
    STATIC_MONITORING_PACKS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|&(_, net_id)| net_id)
}
