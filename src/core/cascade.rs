//! Cascading tile knowledge index.
//!
//! Documents attach to tiles (`"L{layer:03}:{cells}"`) with a per-attachment
//! cascade flag. A lookup at a tile unions the exact-tile attachments with,
//! optionally, every cascading attachment on the tile's ancestor chain.
//!
//! Ancestor chain convention: within-layer prefixes first (dropping the last
//! cell token repeatedly, down to the bare whole-layer tile), then the
//! parent-layer chain from `GridConfig::layer_parents` as whole-layer tiles.
//! Cell grids are not guaranteed to align across layers, so cross-layer
//! inheritance is defined at layer granularity only.

use crate::core::cell;
use crate::core::config::GridConfig;
use crate::core::coordinate::GridCoordinate;
use crate::core::error::CarapaceError;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One tile address: a layer plane plus an optional nested cell chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePath {
    pub layer: u32,
    pub cells: Vec<String>,
}

impl TilePath {
    /// Parse `"L100"`, `"L300:AB34"`, or `"L300:AB34-CD15"`. Layer digits
    /// are accepted unpadded; output re-canonicalizes to 3-digit form.
    pub fn parse(path: &str) -> Result<Self, CarapaceError> {
        let re = Regex::new(r"^L(\d+)(?::([A-Za-z0-9-]+))?$").unwrap();
        let captures = re
            .captures(path)
            .ok_or_else(|| CarapaceError::InvalidLayerFormat(path.to_string()))?;

        let layer: u32 = captures[1]
            .parse()
            .map_err(|_| CarapaceError::InvalidLayerFormat(path.to_string()))?;

        let mut cells = Vec::new();
        if let Some(chain) = captures.get(2) {
            for token in chain.as_str().split('-') {
                cell::parse_cell(token)?;
                cells.push(token.to_string());
            }
        }

        Ok(TilePath { layer, cells })
    }

    pub fn from_coordinate(coordinate: &GridCoordinate) -> Self {
        TilePath {
            layer: coordinate.layer,
            cells: coordinate.cells.clone(),
        }
    }

    pub fn depth(&self) -> usize {
        self.cells.len()
    }

    /// Ancestor tiles, nearest to farthest. See the module docs for the
    /// chain convention.
    pub fn ancestors(&self, config: &GridConfig) -> Vec<TilePath> {
        let mut chain = Vec::new();
        let mut cells = self.cells.clone();
        while !cells.is_empty() {
            cells.pop();
            chain.push(TilePath {
                layer: self.layer,
                cells: cells.clone(),
            });
        }
        let mut layer = self.layer;
        while let Some(parent) = config.parent_layer(layer) {
            chain.push(TilePath {
                layer: parent,
                cells: Vec::new(),
            });
            layer = parent;
        }
        chain
    }
}

impl fmt::Display for TilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cells.is_empty() {
            write!(f, "L{:03}", self.layer)
        } else {
            write!(f, "L{:03}:{}", self.layer, self.cells.join("-"))
        }
    }
}

/// Exact-tile attachment index with cascade flags.
///
/// Pure lookup structure: built once per graph-build pass, queried many
/// times. `rebuild` is idempotent and replaces the whole index.
pub struct TileIndex {
    config: GridConfig,
    /// Canonical tile path -> (document id -> cascades to descendants).
    attachments: FxHashMap<String, BTreeMap<String, bool>>,
}

impl TileIndex {
    pub fn new(config: GridConfig) -> Self {
        TileIndex {
            config,
            attachments: FxHashMap::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Attach a document at an exact tile. Re-attaching the same document
    /// at the same tile OR-merges the cascade flag.
    pub fn attach(&mut self, doc_id: &str, tile: &str, cascade: bool) -> Result<(), CarapaceError> {
        let canonical = TilePath::parse(tile)?.to_string();
        let entry = self
            .attachments
            .entry(canonical)
            .or_default()
            .entry(doc_id.to_string())
            .or_insert(false);
        *entry |= cascade;
        Ok(())
    }

    /// Replace the whole index from a document/frontmatter supplier pass.
    pub fn rebuild<I>(&mut self, docs: I) -> Result<(), CarapaceError>
    where
        I: IntoIterator<Item = (String, Vec<(String, bool)>)>,
    {
        self.attachments.clear();
        for (doc_id, tiles) in docs {
            for (tile, cascade) in tiles {
                self.attach(&doc_id, &tile, cascade)?;
            }
        }
        Ok(())
    }

    /// Documents visible at `tile`: the exact-tile set plus, when
    /// `include_inherited`, every cascading attachment on the ancestor
    /// chain. Documents attached with `cascade = false` are visible only at
    /// their exact tile.
    pub fn documents_at(
        &self,
        tile: &str,
        include_inherited: bool,
    ) -> Result<BTreeSet<String>, CarapaceError> {
        let tile_path = TilePath::parse(tile)?;
        let mut result = BTreeSet::new();

        if let Some(exact) = self.attachments.get(&tile_path.to_string()) {
            result.extend(exact.keys().cloned());
        }

        if include_inherited {
            for ancestor in tile_path.ancestors(&self.config) {
                if let Some(attached) = self.attachments.get(&ancestor.to_string()) {
                    result.extend(
                        attached
                            .iter()
                            .filter(|(_, cascade)| **cascade)
                            .map(|(doc_id, _)| doc_id.clone()),
                    );
                }
            }
        }

        Ok(result)
    }

    /// Presentation helper: the `documents_at` union ordered by descending
    /// quality score (ties by id for deterministic output). Unknown ids
    /// score 0.
    pub fn ranked(
        &self,
        tile: &str,
        include_inherited: bool,
        scores: &BTreeMap<String, f64>,
    ) -> Result<Vec<String>, CarapaceError> {
        let mut docs: Vec<String> = self.documents_at(tile, include_inherited)?.into_iter().collect();
        docs.sort_by(|a, b| {
            let score_a = scores.get(a).copied().unwrap_or(0.0);
            let score_b = scores.get(b).copied().unwrap_or(0.0);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
        Ok(docs)
    }
}
