//! Grid configuration: per-realm precision and ancestor layer grouping.
//!
//! Both tables are configuration data, not algorithm. Realms partition the
//! layer number space (Earth in the 100-300s, Virtual in the 400s, Space in
//! the 500s), and the parent-layer table says which coarser layer a layer
//! nests under for cascade purposes. Defaults match the stock realm set; a
//! `GRID.json` at the store root overrides them.

use crate::core::error::CarapaceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name of the optional config override at a store root.
pub const GRID_CONFIG_NAME: &str = "GRID.json";

/// Fallback base precision when no rule matches a (realm, layer) pair.
pub const DEFAULT_BASE_PRECISION_KM: f64 = 333.0;

/// Shrink factor applied to precision per zoom depth.
pub const ZOOM_FACTOR: f64 = 120.0;

/// Base precision for one realm over an inclusive layer range.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrecisionRule {
    pub realm: String,
    pub layer_min: u32,
    pub layer_max: u32,
    pub base_km: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GridConfig {
    pub precision: Vec<PrecisionRule>,
    /// Layer number -> parent (coarser) layer number.
    pub layer_parents: BTreeMap<u32, u32>,
}

impl GridConfig {
    /// Load config from `GRID.json` under `root`, falling back to defaults
    /// when the file does not exist. A present-but-malformed file is an
    /// error, never a silent fallback.
    pub fn load(root: &Path) -> Result<Self, CarapaceError> {
        let config_path = root.join(GRID_CONFIG_NAME);
        if config_path.exists() {
            let content = fs::read_to_string(config_path).map_err(CarapaceError::StorageError)?;
            serde_json::from_str(&content)
                .map_err(|e| CarapaceError::ValidationError(format!("Invalid GRID.json: {}", e)))
        } else {
            Ok(Self::default_config())
        }
    }

    fn default_config() -> Self {
        let precision = vec![
            PrecisionRule {
                realm: "EARTH".to_string(),
                layer_min: 100,
                layer_max: 399,
                base_km: 333.0,
            },
            PrecisionRule {
                realm: "VIRTUAL".to_string(),
                layer_min: 400,
                layer_max: 499,
                base_km: 0.08,
            },
            PrecisionRule {
                realm: "SPACE".to_string(),
                layer_min: 500,
                layer_max: 599,
                base_km: 8808.0,
            },
        ];

        let mut layer_parents = BTreeMap::new();
        // Earth: local -> regional -> world overview
        layer_parents.insert(320, 310);
        layer_parents.insert(310, 300);
        layer_parents.insert(300, 100);
        // Virtual: dungeon level chain rooted at the realm overview
        layer_parents.insert(401, 400);
        for layer in 402..=455 {
            layer_parents.insert(layer, layer - 1);
        }
        // Space: system detail under the galactic plane
        layer_parents.insert(510, 500);

        GridConfig {
            precision,
            layer_parents,
        }
    }

    /// Base precision in kilometers for one cell at depth 0.
    pub fn base_precision_km(&self, realm: &str, layer: u32) -> f64 {
        self.precision
            .iter()
            .find(|rule| {
                rule.realm.eq_ignore_ascii_case(realm)
                    && layer >= rule.layer_min
                    && layer <= rule.layer_max
            })
            .map(|rule| rule.base_km)
            .unwrap_or(DEFAULT_BASE_PRECISION_KM)
    }

    /// Precision in meters at a given zoom depth (120x shrink per level).
    pub fn precision_meters(&self, realm: &str, layer: u32, depth: usize) -> f64 {
        let base = self.base_precision_km(realm, layer) * 1000.0;
        if depth == 0 {
            base
        } else {
            base / ZOOM_FACTOR.powi(depth as i32)
        }
    }

    /// The coarser layer this layer nests under, if any.
    pub fn parent_layer(&self, layer: u32) -> Option<u32> {
        self.layer_parents.get(&layer).copied()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
