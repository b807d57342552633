//! Sparse hierarchical cell storage for one layer plane.
//!
//! Cells live in a recursive `Leaf | Branch` tree keyed by cell token. Only
//! written cells exist; absence is the default state. Reads never create
//! intermediate levels, writes always do.

use crate::core::config::GridConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node in the sparse cell tree.
///
/// JSON objects hydrate as branches, everything else as a leaf payload.
/// A leaf payload that is itself an object is indistinguishable from a
/// branch in the wire form; `to_value` makes the two round-trip identically.
#[derive(Debug, Clone, PartialEq)]
pub enum CellNode {
    Branch(BTreeMap<String, CellNode>),
    Leaf(Value),
}

impl CellNode {
    pub fn empty_branch() -> Self {
        CellNode::Branch(BTreeMap::new())
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => CellNode::Branch(
                map.into_iter()
                    .map(|(key, value)| (key, CellNode::from_value(value)))
                    .collect(),
            ),
            other => CellNode::Leaf(other),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            CellNode::Branch(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, node)| (key.clone(), node.to_value()))
                    .collect(),
            ),
            CellNode::Leaf(value) => value.clone(),
        }
    }
}

/// Sparse cell storage for one `(realm, region, layer)` plane.
///
/// One instance per distinct triple, owned and cached by `MapLayerManager`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub realm: String,
    pub region: String,
    pub layer: u32,
    /// View-state zoom depth, updated by the manager on navigation.
    pub depth: usize,
    pub cells: CellNode,
    pub metadata: serde_json::Map<String, Value>,
}

/// Persisted JSON form of a layer. `precision_meters` is derived on save
/// and ignored on load; it is part of the interop contract only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LayerSnapshot {
    pub realm: String,
    pub region: String,
    pub layer: u32,
    pub depth: usize,
    pub precision_meters: f64,
    pub cells: Value,
    pub metadata: serde_json::Map<String, Value>,
}

impl MapLayer {
    pub fn new(realm: &str, region: &str, layer: u32) -> Self {
        MapLayer {
            realm: realm.to_string(),
            region: region.to_string(),
            layer,
            depth: 0,
            cells: CellNode::empty_branch(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn layer_key(&self) -> String {
        format!("{}-{}-L{}", self.realm, self.region, self.layer)
    }

    /// Hydrate from a static dataset mapping: `{"cells": {...}, "metadata": {...}}`.
    /// Missing keys hydrate as empty; the layer is valid in the empty state.
    pub fn from_dataset(realm: &str, region: &str, layer: u32, data: &Value) -> Self {
        let mut map_layer = MapLayer::new(realm, region, layer);
        if let Some(cells) = data.get("cells") {
            map_layer.cells = CellNode::from_value(cells.clone());
        }
        if let Some(Value::Object(metadata)) = data.get("metadata") {
            map_layer.metadata = metadata.clone();
        }
        map_layer
    }

    /// Walk `path` through the sparse tree. Returns `None` the first time a
    /// segment is missing or the node underfoot is not traversable; never
    /// creates storage.
    pub fn get_path(&self, path: &[String]) -> Option<Value> {
        let mut node = &self.cells;
        for segment in path {
            match node {
                CellNode::Branch(children) => node = children.get(segment)?,
                CellNode::Leaf(_) => return None,
            }
        }
        Some(node.to_value())
    }

    /// Write `value` at `path`, creating intermediate branches as needed.
    /// This is the exclusive mutation path for cell storage; a leaf in the
    /// way of an intermediate segment is replaced by a branch.
    pub fn set_path(&mut self, path: &[String], value: Value) {
        if path.is_empty() {
            self.cells = CellNode::from_value(value);
            return;
        }
        let mut node = &mut self.cells;
        for segment in &path[..path.len() - 1] {
            if !matches!(node, CellNode::Branch(_)) {
                *node = CellNode::empty_branch();
            }
            let CellNode::Branch(children) = node else {
                unreachable!()
            };
            node = children
                .entry(segment.clone())
                .or_insert_with(CellNode::empty_branch);
        }
        if !matches!(node, CellNode::Branch(_)) {
            *node = CellNode::empty_branch();
        }
        let CellNode::Branch(children) = node else {
            unreachable!()
        };
        children.insert(
            path[path.len() - 1].clone(),
            CellNode::from_value(value),
        );
    }

    /// Derived cell-edge precision at the current view depth.
    pub fn precision_meters(&self, config: &GridConfig) -> f64 {
        config.precision_meters(&self.realm, self.layer, self.depth)
    }

    pub fn snapshot(&self, config: &GridConfig) -> LayerSnapshot {
        LayerSnapshot {
            realm: self.realm.clone(),
            region: self.region.clone(),
            layer: self.layer,
            depth: self.depth,
            precision_meters: self.precision_meters(config),
            cells: self.cells.to_value(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn from_snapshot(snapshot: LayerSnapshot) -> Self {
        MapLayer {
            realm: snapshot.realm,
            region: snapshot.region,
            layer: snapshot.layer,
            depth: snapshot.depth,
            cells: CellNode::from_value(snapshot.cells),
            metadata: snapshot.metadata,
        }
    }
}
