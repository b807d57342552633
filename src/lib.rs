//! Carapace: A Hierarchical Spatial Grid for Local-First Knowledge
//!
//! **Carapace is the coordinate and knowledge-cascade core of an
//! offline-first knowledge OS.**
//!
//! It addresses everything on multi-resolution grid planes: several realms
//! (Earth, Virtual, Space), numbered layers per realm, and a 120x50 cell
//! plane per layer that zooms recursively, each level 120x finer than the
//! last. Knowledge documents attach to tiles and cascade down to finer
//! tiles unless pinned.
//!
//! # Core Principles
//!
//! - **Local-first**: All state is plain JSON on disk, auditable via an
//!   append-only event trail
//! - **Sparse**: Only written cells exist; absence is the default state
//! - **Validated at the edge**: Malformed cells and codes are rejected at
//!   parse time, never clamped
//! - **No hidden state**: Managers and indexes are plain constructible
//!   values; configuration is explicit and overridable
//!
//! # Data Flow
//!
//! A tile-path string is parsed and validated by the cell codec and
//! [`GridCoordinate`], the [`MapLayerManager`] resolves the sparse layer
//! for its `(realm, region, layer)` triple, and the [`TileIndex`] unions
//! document attachments for the exact tile and, on request, its ancestor
//! chain.
//!
//! ```
//! use carapace::{GridConfig, GridCoordinate, TileIndex};
//!
//! let coord = GridCoordinate::parse("EARTH-OC-L100-AB34").unwrap();
//! let zoomed = coord.zoom_into("CD15").unwrap();
//! assert_eq!(zoomed.code(), "EARTH-OC-L100-AB34-CD15");
//!
//! let mut index = TileIndex::new(GridConfig::default());
//! index.attach("field-guide", "L320:AB34", true).unwrap();
//! let docs = index.documents_at("L320:AB34-CD15", true).unwrap();
//! assert!(docs.contains("field-guide"));
//! ```
//!
//! # Crate Structure
//!
//! - [`core::cell`]: the `CCNN` cell token codec
//! - [`core::coordinate`]: hierarchical coordinates with recursive zoom
//! - [`core::config`]: realm precision and layer-grouping tables
//! - [`core::layer`] / [`core::manager`]: sparse layer storage, cache,
//!   hydration, and persistence
//! - [`core::cascade`]: the cascading tile knowledge index

pub mod core;

pub use core::cascade::{TileIndex, TilePath};
pub use core::config::{GridConfig, PrecisionRule};
pub use core::coordinate::GridCoordinate;
pub use core::error::CarapaceError;
pub use core::layer::{CellNode, LayerSnapshot, MapLayer};
pub use core::manager::{FsDataSource, MapLayerManager, StaticDataSource};
