//! The network-topology model: a flat node collection plus an arena of maps
//! (folders/groups) keyed by net id, populated incrementally from a streaming
//! feed that offers no ordering guarantee between parents and children.
//! All mutation is idempotent: redelivered records and any permutation of the
//! same record set converge to the same tree.

use crate::error::TopologyError;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Net id of the synthetic root map; also the sentinel a missing or
/// unparseable parent reference decodes to ("attach to root").
pub const ROOT_NET_ID: i64 = 0;

/// Reserved net id of the monitoring-packs container. It is kept out of the
/// normal parent-child tree and surfaced through the resolver's fallback path.
pub const MONITORING_PACKS_NET_ID: i64 = -2;

/// A node's device classification, extracted from the raw descriptor field.
/// Both ids are empty when the descriptor is malformed; an empty classifier
/// matches no device family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceClassifier {
    pub class_id: String,
    pub category_id: String,
}

/// A monitored device. Immutable once constructed from its raw record.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkNode {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub classifier: DeviceClassifier,
}

/// A folder-like or leaf-like grouping entity in the topology. Children are
/// stored as net ids into the owning atlas, never as embedded references, so
/// "parent not yet known" is simply "id not yet present in the arena".
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMap {
    pub net_id: i64,
    pub parent_id: i64,
    pub display_name: String,
    pub is_folder: bool,
    pub is_flat_segment: bool,
    pub own_node_ids: HashSet<i64>,
    pub children: Vec<i64>,
}

/// Raw node record as delivered by the feed. Unknown fields are ignored and
/// missing fields default, so a sparse record still decodes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeRecord {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub device_type_descriptor: Value,
}

/// Raw map record as delivered by the feed. The loosely typed fields are
/// decoded defensively: a malformed parent ref means "root", a malformed
/// packed node list means "no own nodes".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapRecord {
    pub net_id: i64,
    pub display_name: String,
    pub parent_ref: Value,
    pub icon_id: i64,
    pub map_kind: Value,
    pub child_packed_data: Value,
}

impl NetworkNode {
    pub fn from_record(record: &NodeRecord) -> NetworkNode {
        NetworkNode {
            id: record.id,
            name: record.name.clone(),
            address: record.address.clone(),
            classifier: decode_classifier(&record.device_type_descriptor),
        }
    }
}

impl NetworkMap {
    pub fn from_record(record: &MapRecord) -> NetworkMap {
        let flat_segment = kind_is(&record.map_kind, "flatSegment");
        let folder_tag = kind_is(&record.map_kind, "folder");
        // An array-typed children field also marks the map as a folder even
        // without an explicit kind tag.
        let is_folder = folder_tag || flat_segment || record.child_packed_data.is_array();

        let mut parent_id = decode_parent_id(&record.parent_ref);
        if parent_id == record.net_id {
            warn!(
                "map {} declares itself as its own parent; attaching to root",
                record.net_id
            );
            parent_id = ROOT_NET_ID;
        }

        // Leaf maps always carry their nodes inline; folders only do when
        // they are the flat-segment kind.
        let own_node_ids = if flat_segment || !is_folder {
            decode_packed_node_ids(&record.child_packed_data)
        } else {
            HashSet::new()
        };

        NetworkMap {
            net_id: record.net_id,
            parent_id,
            display_name: record.display_name.clone(),
            is_folder,
            is_flat_segment: flat_segment,
            own_node_ids,
            children: Vec::new(),
        }
    }

    fn synthetic_root() -> NetworkMap {
        NetworkMap {
            net_id: ROOT_NET_ID,
            parent_id: ROOT_NET_ID,
            display_name: String::new(),
            is_folder: true,
            is_flat_segment: false,
            own_node_ids: HashSet::new(),
            children: Vec::new(),
        }
    }
}

/// The whole topology for one monitored environment/session: the map tree,
/// the flat node collection and the pool of maps still waiting for their
/// parent to arrive. Created per session; a passive sink for the feed.
#[derive(Debug)]
pub struct NetworkAtlas {
    maps: HashMap<i64, NetworkMap>,
    nodes: HashMap<i64, NetworkNode>,
    node_order: Vec<i64>,
    orphans: Vec<i64>,
}

impl Default for NetworkAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkAtlas {
    pub fn new() -> NetworkAtlas {
        let mut maps = HashMap::new();
        maps.insert(ROOT_NET_ID, NetworkMap::synthetic_root());
        NetworkAtlas {
            maps,
            nodes: HashMap::new(),
            node_order: Vec::new(),
            orphans: Vec::new(),
        }
    }

    /// Inserts a node by id. Last write wins, so redelivered records simply
    /// refresh the entry; discovery order is kept from the first sighting.
    pub fn add_node(&mut self, record: &NodeRecord) {
        let node = NetworkNode::from_record(record);
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.node_order.push(id);
        }
    }

    /// Inserts a map, adopting any pending orphans that were waiting for it
    /// and attaching it to its own parent (or the orphan pool) in turn.
    pub fn add_map(&mut self, record: &MapRecord) {
        if record.net_id == ROOT_NET_ID {
            warn!("ignoring map record with reserved root net id");
            return;
        }

        let mut map = NetworkMap::from_record(record);
        let net_id = map.net_id;

        // Children attached before this record arrived survive a re-add.
        if let Some(existing) = self.maps.get(&net_id) {
            map.children = existing.children.clone();
        }
        self.maps.insert(net_id, map);

        // Orphan adoption: any pending map naming this one as its parent is
        // attached now and leaves the pool.
        let adopted: Vec<i64> = self
            .orphans
            .iter()
            .copied()
            .filter(|id| self.maps.get(id).map(|m| m.parent_id) == Some(net_id))
            .collect();
        if !adopted.is_empty() {
            self.orphans.retain(|id| !adopted.contains(id));
            for child_id in adopted {
                debug!("map {net_id} adopts pending child {child_id}");
                self.attach_child(net_id, child_id);
            }
        }

        // The monitoring-packs container stays out of the tree; it is reached
        // through the resolver's fallback path instead.
        if net_id == MONITORING_PACKS_NET_ID {
            return;
        }

        let parent_id = self.maps[&net_id].parent_id;
        if self.maps.contains_key(&parent_id) {
            self.attach_child(parent_id, net_id);
        } else if !self.orphans.contains(&net_id) {
            debug!("parent {parent_id} of map {net_id} not seen yet; holding as orphan");
            self.orphans.push(net_id);
        }
    }

    /// Decodes and inserts a raw node record from the feed.
    ///
    /// # Errors
    /// Returns `TopologyError::InvalidNodeRecord` when the value is not an
    /// object-shaped record at all. Malformed fields inside an object never
    /// error; they decode to sentinels.
    pub fn add_node_value(&mut self, value: Value) -> Result<(), TopologyError> {
        let record: NodeRecord =
            serde_json::from_value(value).map_err(TopologyError::InvalidNodeRecord)?;
        self.add_node(&record);
        Ok(())
    }

    /// Decodes and inserts a raw map record from the feed.
    ///
    /// # Errors
    /// Returns `TopologyError::InvalidMapRecord` when the value is not an
    /// object-shaped record at all.
    pub fn add_map_value(&mut self, value: Value) -> Result<(), TopologyError> {
        let record: MapRecord =
            serde_json::from_value(value).map_err(TopologyError::InvalidMapRecord)?;
        self.add_map(&record);
        Ok(())
    }

    pub fn map(&self, net_id: i64) -> Option<&NetworkMap> {
        self.maps.get(&net_id)
    }

    pub fn node(&self, id: i64) -> Option<&NetworkNode> {
        self.nodes.get(&id)
    }

    /// All nodes in discovery order.
    pub fn nodes_in_order(&self) -> impl Iterator<Item = &NetworkNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Case-insensitive exact display-name match over the immediate children
    /// of `parent_id` only; folder-path traversal walks one level at a time.
    pub fn child_by_display_name(&self, parent_id: i64, name: &str) -> Option<&NetworkMap> {
        let parent = self.maps.get(&parent_id)?;
        parent
            .children
            .iter()
            .filter_map(|id| self.maps.get(id))
            .find(|child| child.display_name.eq_ignore_ascii_case(name))
    }

    /// The deduplicated node-id union over the subtree rooted at `net_id`.
    /// Flat-segment folders contribute their own inline nodes plus their
    /// children's unions; other folders contribute children only, even when
    /// inline nodes were captured; leaf maps contribute their own nodes only.
    pub fn all_node_ids(&self, net_id: i64) -> HashSet<i64> {
        let mut out = HashSet::new();
        let mut visited = HashSet::new();
        self.collect_node_ids(net_id, &mut out, &mut visited);
        out
    }

    fn collect_node_ids(&self, net_id: i64, out: &mut HashSet<i64>, visited: &mut HashSet<i64>) {
        // Malformed records could still produce a cycle through adoption.
        if !visited.insert(net_id) {
            return;
        }
        let Some(map) = self.maps.get(&net_id) else {
            return;
        };
        if map.is_folder {
            if map.is_flat_segment {
                out.extend(map.own_node_ids.iter().copied());
            }
            for &child_id in &map.children {
                self.collect_node_ids(child_id, out, visited);
            }
        } else {
            out.extend(map.own_node_ids.iter().copied());
        }
    }

    fn attach_child(&mut self, parent_id: i64, child_id: i64) {
        let Some(parent) = self.maps.get_mut(&parent_id) else {
            return;
        };
        // Re-adds are a no-op; children never hold duplicate net ids.
        if !parent.children.contains(&child_id) {
            parent.children.push(child_id);
        }
    }
}

fn kind_is(map_kind: &Value, expected: &str) -> bool {
    map_kind
        .as_str()
        .is_some_and(|kind| kind.eq_ignore_ascii_case(expected))
}

fn decode_parent_id(parent_ref: &Value) -> i64 {
    match parent_ref {
        Value::Number(number) => number.as_i64().unwrap_or_else(|| {
            warn!("non-integral parent ref {number}; attaching to root");
            ROOT_NET_ID
        }),
        Value::String(text) => text.trim().parse().unwrap_or_else(|_| {
            warn!("unparseable parent ref {text:?}; attaching to root");
            ROOT_NET_ID
        }),
        Value::Null => ROOT_NET_ID,
        other => {
            warn!("unexpected parent ref shape {other}; attaching to root");
            ROOT_NET_ID
        }
    }
}

fn decode_classifier(descriptor: &Value) -> DeviceClassifier {
    let Value::Object(fields) = descriptor else {
        if !descriptor.is_null() {
            warn!("unexpected device-type descriptor shape {descriptor}");
        }
        return DeviceClassifier::default();
    };
    DeviceClassifier {
        class_id: scalar_string(fields.get("classId")),
        category_id: scalar_string(fields.get("categoryId")),
    }
}

/// Classifier attributes arrive as either strings or numbers depending on the
/// server version; both normalize to the string form used by the family table.
fn scalar_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn decode_packed_node_ids(packed: &Value) -> HashSet<i64> {
    let Some(text) = packed.as_str() else {
        return HashSet::new();
    };
    let mut ids = HashSet::new();
    for piece in text.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match piece.parse() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => warn!("skipping unparseable packed node id {piece:?}"),
        }
    }
    ids
}
