//! Layer cache, hydration, persistence, and navigation.
//!
//! `MapLayerManager` owns one `MapLayer` per `(realm, region, layer)` triple,
//! keyed `"{realm}-{region}-L{layer}"`. Layers hydrate lazily from a static
//! dataset source on first load and fall back to empty when no data exists.
//! Every hydrate, save, and cache reset appends one event to the
//! `grid.events.jsonl` audit trail under the store root.
//!
//! Single-threaded by contract: the cache is owned by one logical caller at
//! a time, with no internal locking.

use crate::core::config::GridConfig;
use crate::core::coordinate::GridCoordinate;
use crate::core::error::CarapaceError;
use crate::core::layer::{LayerSnapshot, MapLayer};
use rustc_hash::FxHashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// File name of the append-only audit trail under the store root.
pub const GRID_EVENTS_NAME: &str = "grid.events.jsonl";

// ---------------------------------------------------------------------------
// Static dataset seam
// ---------------------------------------------------------------------------

/// Read-only provider of static hierarchical layer data.
///
/// Returns a JSON mapping with at least `{"cells": {...}, "metadata": {...}}`
/// for a known triple, or `Ok(None)` when no static data exists for it.
pub trait StaticDataSource {
    fn fetch(&self, realm: &str, region: &str, layer: u32) -> Result<Option<Value>, CarapaceError>;
}

/// Filesystem dataset source: one `{realm}-{region}-L{layer}.json` per triple.
pub struct FsDataSource {
    dir: PathBuf,
}

impl FsDataSource {
    pub fn new(dir: &Path) -> Self {
        FsDataSource {
            dir: dir.to_path_buf(),
        }
    }
}

impl StaticDataSource for FsDataSource {
    fn fetch(&self, realm: &str, region: &str, layer: u32) -> Result<Option<Value>, CarapaceError> {
        let path = self.dir.join(format!("{}-{}-L{}.json", realm, region, layer));
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(CarapaceError::StorageError)?;
        let data = serde_json::from_str(&content).map_err(|e| {
            CarapaceError::ValidationError(format!("Invalid dataset {}: {}", path.display(), e))
        })?;
        Ok(Some(data))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn append_jsonl(path: &Path, value: &Value) -> Result<(), CarapaceError> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(CarapaceError::StorageError)?;
    writeln!(f, "{}", serde_json::to_string(value).unwrap_or_default())
        .map_err(CarapaceError::StorageError)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct MapLayerManager {
    root: PathBuf,
    config: GridConfig,
    source: Box<dyn StaticDataSource>,
    cache: FxHashMap<String, MapLayer>,
    current: Option<GridCoordinate>,
}

impl MapLayerManager {
    /// Construct a manager rooted at `root`, reading `GRID.json` for config
    /// overrides and `datasets/` for static layer data.
    pub fn new(root: &Path) -> Result<Self, CarapaceError> {
        let config = GridConfig::load(root)?;
        let source = Box::new(FsDataSource::new(&root.join("datasets")));
        Ok(MapLayerManager {
            root: root.to_path_buf(),
            config,
            source,
            cache: FxHashMap::default(),
            current: None,
        })
    }

    /// Swap in a different static dataset source (the default reads
    /// `datasets/` under the store root).
    pub fn with_source(mut self, source: Box<dyn StaticDataSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn current_coordinate(&self) -> Option<&GridCoordinate> {
        self.current.as_ref()
    }

    pub fn set_current(&mut self, coordinate: GridCoordinate) {
        self.load_layer(
            &coordinate.realm,
            &coordinate.region,
            coordinate.layer,
            Some(coordinate.cells.as_slice()),
        );
        self.current = Some(coordinate);
    }

    fn layer_key(realm: &str, region: &str, layer: u32) -> String {
        format!("{}-{}-L{}", realm, region, layer)
    }

    fn snapshot_path(&self, key: &str) -> PathBuf {
        self.root.join("layers").join(format!("{}.json", key))
    }

    /// Resolve the layer for a triple, hydrating on first touch.
    ///
    /// Cache hit: when a `cell_path` is supplied, the cached layer's view
    /// depth is updated to its length (view-state, not a data reload).
    /// Cache miss: hydrate from the static dataset source; a missing or
    /// unreadable dataset yields an empty layer (sparse layers are valid
    /// empty). The result is always inserted into the cache.
    pub fn load_layer(
        &mut self,
        realm: &str,
        region: &str,
        layer: u32,
        cell_path: Option<&[String]>,
    ) -> &mut MapLayer {
        let key = Self::layer_key(realm, region, layer);

        if !self.cache.contains_key(&key) {
            let map_layer = match self.source.fetch(realm, region, layer) {
                Ok(Some(data)) => {
                    self.append_event("layer.hydrate", &key, serde_json::json!({}));
                    MapLayer::from_dataset(realm, region, layer, &data)
                }
                Ok(None) => MapLayer::new(realm, region, layer),
                Err(e) => {
                    self.append_event(
                        "layer.hydrate_failed",
                        &key,
                        serde_json::json!({ "error": e.to_string() }),
                    );
                    MapLayer::new(realm, region, layer)
                }
            };
            self.cache.insert(key.clone(), map_layer);
        }

        let map_layer = self.cache.get_mut(&key).unwrap();
        if let Some(path) = cell_path {
            map_layer.depth = path.len();
        }
        map_layer
    }

    /// Read the cell payload addressed by `coordinate`, or `None` when any
    /// path segment is absent. Never creates storage.
    pub fn get_cell(&mut self, coordinate: &GridCoordinate) -> Option<Value> {
        let map_layer = self.load_layer(
            &coordinate.realm,
            &coordinate.region,
            coordinate.layer,
            None,
        );
        map_layer.get_path(&coordinate.cells)
    }

    /// Write a cell payload at `coordinate`, creating intermediate sparse
    /// levels as needed. Well-formed-but-new paths never fail.
    pub fn set_cell(&mut self, coordinate: &GridCoordinate, value: Value) {
        let map_layer = self.load_layer(
            &coordinate.realm,
            &coordinate.region,
            coordinate.layer,
            None,
        );
        map_layer.set_path(&coordinate.cells, value);
    }

    /// Zoom the current coordinate one level into `token` and re-resolve its
    /// layer. `Ok(None)` when there is no current coordinate; invalid tokens
    /// surface as the underlying codec error.
    pub fn zoom_into_cell(&mut self, token: &str) -> Result<Option<GridCoordinate>, CarapaceError> {
        let Some(current) = self.current.clone() else {
            return Ok(None);
        };
        let zoomed = current.zoom_into(token)?;
        self.load_layer(
            &zoomed.realm,
            &zoomed.region,
            zoomed.layer,
            Some(zoomed.cells.as_slice()),
        );
        self.current = Some(zoomed.clone());
        Ok(Some(zoomed))
    }

    /// Zoom the current coordinate out one level. `None` when there is no
    /// current coordinate or it is already at depth 0 (absence, not error).
    pub fn zoom_out_cell(&mut self) -> Option<GridCoordinate> {
        let parent = self.current.clone()?.zoom_out()?;
        self.load_layer(
            &parent.realm,
            &parent.region,
            parent.layer,
            Some(parent.cells.as_slice()),
        );
        self.current = Some(parent.clone());
        Some(parent)
    }

    /// Persist one cached layer as a JSON snapshot under `layers/`.
    /// Save failures surface to the caller; they are never swallowed.
    pub fn save_layer(
        &mut self,
        realm: &str,
        region: &str,
        layer: u32,
    ) -> Result<PathBuf, CarapaceError> {
        let key = Self::layer_key(realm, region, layer);
        let map_layer = self
            .cache
            .get(&key)
            .ok_or_else(|| CarapaceError::ValidationError(format!("Layer not loaded: {}", key)))?;

        let snapshot = map_layer.snapshot(&self.config);
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| CarapaceError::ValidationError(e.to_string()))?;

        let path = self.snapshot_path(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(CarapaceError::StorageError)?;
        }
        fs::write(&path, &content).map_err(CarapaceError::StorageError)?;

        self.append_event(
            "layer.save",
            &key,
            serde_json::json!({
                "path": path.display().to_string(),
                "snapshot_sha256": sha256_hex(content.as_bytes()),
            }),
        );
        Ok(path)
    }

    /// Inverse of [`MapLayerManager::save_layer`]: read a persisted snapshot
    /// back into the cache. `Ok(None)` when no snapshot exists for the triple.
    pub fn restore_layer(
        &mut self,
        realm: &str,
        region: &str,
        layer: u32,
    ) -> Result<Option<&mut MapLayer>, CarapaceError> {
        let key = Self::layer_key(realm, region, layer);
        let path = self.snapshot_path(&key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(CarapaceError::StorageError)?;
        let snapshot: LayerSnapshot = serde_json::from_str(&content).map_err(|e| {
            CarapaceError::ValidationError(format!("Invalid snapshot {}: {}", path.display(), e))
        })?;
        self.cache.insert(key.clone(), MapLayer::from_snapshot(snapshot));
        Ok(self.cache.get_mut(&key))
    }

    /// Drop all cached layers and the current coordinate. The only way a
    /// cached layer is ever discarded.
    pub fn reset_cache(&mut self) {
        let count = self.cache.len();
        self.cache.clear();
        self.current = None;
        self.append_event(
            "cache.reset",
            "*",
            serde_json::json!({ "evicted": count }),
        );
    }

    pub fn cached_layers(&self) -> usize {
        self.cache.len()
    }

    // Audit appends are advisory: a failed append never fails the grid
    // operation it describes.
    fn append_event(&self, op: &str, key: &str, extra: Value) {
        let mut event = serde_json::json!({
            "event_id": Ulid::new().to_string(),
            "ts": now_epoch_z(),
            "op": op,
            "layer": key,
        });
        if let (Some(event_obj), Some(extra_obj)) = (event.as_object_mut(), extra.as_object()) {
            for (k, v) in extra_obj {
                event_obj.insert(k.clone(), v.clone());
            }
        }
        let _ = append_jsonl(&self.root.join(GRID_EVENTS_NAME), &event);
    }
}
