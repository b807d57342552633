//! Hierarchical grid coordinates with recursive zoom.
//!
//! A `GridCoordinate` addresses one location in a realm: a base layer plane
//! plus an ordered chain of nested cell tokens, each level shrinking the
//! covered area 120x. The canonical string form round-trips exactly:
//! `EARTH-OC-L100-AB34-CD15` parses back to an equal coordinate.

use crate::core::cell;
use crate::core::config::GridConfig;
use crate::core::error::CarapaceError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCoordinate {
    pub realm: String,
    pub region: String,
    pub layer: u32,
    /// Nested cell tokens, coarsest first. Empty means "whole layer".
    pub cells: Vec<String>,
}

impl GridCoordinate {
    pub fn new(realm: &str, region: &str, layer: u32) -> Self {
        GridCoordinate {
            realm: realm.to_string(),
            region: region.to_string(),
            layer,
            cells: Vec::new(),
        }
    }

    /// Parse a canonical code: `REALM-REGION-L<digits>[-CELL]*`.
    pub fn parse(code: &str) -> Result<Self, CarapaceError> {
        let segments: Vec<&str> = code.split('-').collect();
        if segments.len() < 3 {
            return Err(CarapaceError::InvalidCode(format!(
                "'{}' has fewer than 3 segments",
                code
            )));
        }

        let layer_segment = segments[2];
        let layer: u32 = layer_segment
            .strip_prefix('L')
            .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| CarapaceError::InvalidLayerFormat(layer_segment.to_string()))?;

        let mut cells = Vec::new();
        for token in &segments[3..] {
            cell::parse_cell(token)?;
            cells.push(token.to_string());
        }

        Ok(GridCoordinate {
            realm: segments[0].to_string(),
            region: segments[1].to_string(),
            layer,
            cells,
        })
    }

    /// Canonical string form; exact inverse of [`GridCoordinate::parse`].
    pub fn code(&self) -> String {
        let mut code = format!("{}-{}-L{}", self.realm, self.region, self.layer);
        for token in &self.cells {
            code.push('-');
            code.push_str(token);
        }
        code
    }

    /// Number of nested zoom levels. Depth 0 is the whole layer.
    pub fn depth(&self) -> usize {
        self.cells.len()
    }

    /// Cache key shared with `MapLayerManager`: `{realm}-{region}-L{layer}`.
    pub fn layer_key(&self) -> String {
        format!("{}-{}-L{}", self.realm, self.region, self.layer)
    }

    /// Return a new coordinate zoomed one level into `token`. The receiver
    /// is never mutated; the token is validated before it is appended.
    pub fn zoom_into(&self, token: &str) -> Result<Self, CarapaceError> {
        cell::parse_cell(token)?;
        let mut zoomed = self.clone();
        zoomed.cells.push(token.to_string());
        Ok(zoomed)
    }

    /// Return the parent coordinate, or `None` when already at depth 0.
    pub fn zoom_out(&self) -> Option<Self> {
        if self.cells.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.cells.pop();
        Some(parent)
    }

    /// Cell-edge precision in meters at this coordinate's depth.
    pub fn precision_meters(&self, config: &GridConfig) -> f64 {
        config.precision_meters(&self.realm, self.layer, self.depth())
    }

    /// Approximate distance in meters to another coordinate at the same
    /// realm, region, layer, and depth. Comparing partial zooms is undefined
    /// and fails with `IncompatibleCoordinates`.
    pub fn distance_to(
        &self,
        other: &GridCoordinate,
        config: &GridConfig,
    ) -> Result<f64, CarapaceError> {
        if self.realm != other.realm || self.region != other.region || self.layer != other.layer {
            return Err(CarapaceError::IncompatibleCoordinates(format!(
                "{} vs {}",
                self.layer_key(),
                other.layer_key()
            )));
        }
        if self.depth() != other.depth() {
            return Err(CarapaceError::IncompatibleCoordinates(format!(
                "depth {} vs depth {}",
                self.depth(),
                other.depth()
            )));
        }

        let (Some(a), Some(b)) = (self.cells.last(), other.cells.last()) else {
            // Both at depth 0: same base coordinate
            return Ok(0.0);
        };

        let (col_a, row_a) = cell::parse_cell(a)?;
        let (col_b, row_b) = cell::parse_cell(b)?;
        let dx = cell::column_to_index(&col_a)? as f64 - cell::column_to_index(&col_b)? as f64;
        let dy = row_a as f64 - row_b as f64;

        let precision = self.precision_meters(config);
        Ok((dx * dx + dy * dy).sqrt() * precision)
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth() -> GridCoordinate {
        GridCoordinate::new("EARTH", "OC", 100)
    }

    #[test]
    fn test_parse_round_trip() {
        for code in [
            "EARTH-OC-L100",
            "EARTH-OC-L100-AB34",
            "EARTH-OC-L100-AB34-CD15",
            "VIRTUAL-NETHACK-L412-AA00",
            "SPACE-MILKYWAY-L500-DT49",
        ] {
            let coord = GridCoordinate::parse(code).unwrap();
            assert_eq!(coord.code(), code);
            assert_eq!(GridCoordinate::parse(&coord.code()).unwrap(), coord);
        }
    }

    #[test]
    fn test_parse_rejects_short_codes() {
        assert!(matches!(
            GridCoordinate::parse("EARTH-OC"),
            Err(CarapaceError::InvalidCode(_))
        ));
        assert!(matches!(
            GridCoordinate::parse("EARTH"),
            Err(CarapaceError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_layer_segment() {
        for code in ["EARTH-OC-100", "EARTH-OC-LX", "EARTH-OC-L", "EARTH-OC-L1A"] {
            assert!(matches!(
                GridCoordinate::parse(code),
                Err(CarapaceError::InvalidLayerFormat(_))
            ));
        }
    }

    #[test]
    fn test_parse_validates_cell_tokens() {
        assert!(matches!(
            GridCoordinate::parse("EARTH-OC-L100-ZZ99"),
            Err(CarapaceError::InvalidColumn(_))
        ));
        assert!(matches!(
            GridCoordinate::parse("EARTH-OC-L100-AB34-AB99"),
            Err(CarapaceError::InvalidRow(_))
        ));
    }

    #[test]
    fn test_zoom_into_is_pure_and_validated() {
        let base = earth();
        let zoomed = base.zoom_into("AB34").unwrap();
        assert_eq!(zoomed.depth(), 1);
        assert_eq!(zoomed.code(), "EARTH-OC-L100-AB34");
        assert_eq!(base.depth(), 0);
        assert!(base.zoom_into("ZZ99").is_err());
    }

    #[test]
    fn test_zoom_inverse() {
        let base = earth();
        let deep = base.zoom_into("AB34").unwrap().zoom_into("CD15").unwrap();
        assert_eq!(deep.code(), "EARTH-OC-L100-AB34-CD15");
        assert_eq!(deep.depth(), 2);
        let once_out = deep.zoom_out().unwrap();
        assert_eq!(once_out.code(), "EARTH-OC-L100-AB34");
        assert_eq!(once_out.depth(), 1);
        assert_eq!(once_out.zoom_out().unwrap(), base);
    }

    #[test]
    fn test_zoom_out_at_root_is_absence() {
        assert_eq!(earth().zoom_out(), None);
    }

    #[test]
    fn test_distance_zero_and_symmetry() {
        let config = GridConfig::default();
        let a = GridCoordinate::parse("EARTH-OC-L100-AA00").unwrap();
        let b = GridCoordinate::parse("EARTH-OC-L100-AD04").unwrap();
        assert_eq!(a.distance_to(&a, &config).unwrap(), 0.0);
        assert_eq!(
            a.distance_to(&b, &config).unwrap(),
            b.distance_to(&a, &config).unwrap()
        );
        // 3 columns + 4 rows apart: a 3-4-5 triangle at depth-1 precision,
        // which is already one 120x shrink below the base table value
        assert!((a.distance_to(&b, &config).unwrap() - 5.0 * 333_000.0 / 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_at_depth_zero_is_zero() {
        let config = GridConfig::default();
        assert_eq!(earth().distance_to(&earth(), &config).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_scales_with_depth() {
        let config = GridConfig::default();
        let shallow_a = GridCoordinate::parse("EARTH-OC-L100-AA00").unwrap();
        let shallow_b = GridCoordinate::parse("EARTH-OC-L100-AA01").unwrap();
        let deep_a = GridCoordinate::parse("EARTH-OC-L100-AB34-AA00").unwrap();
        let deep_b = GridCoordinate::parse("EARTH-OC-L100-AB34-AA01").unwrap();

        let shallow = shallow_a.distance_to(&shallow_b, &config).unwrap();
        let deep = deep_a.distance_to(&deep_b, &config).unwrap();
        // One adjacent-row step, precision = base / 120^depth
        assert!((shallow - 333_000.0 / 120.0).abs() < 1e-6);
        assert!((deep - 333_000.0 / (120.0 * 120.0)).abs() < 1e-6);
        assert!((shallow / deep - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_incompatible() {
        let config = GridConfig::default();
        let a = GridCoordinate::parse("EARTH-OC-L100-AB34").unwrap();
        let other_layer = GridCoordinate::parse("EARTH-OC-L300-AB34").unwrap();
        let other_depth = GridCoordinate::parse("EARTH-OC-L100-AB34-CD15").unwrap();
        let other_realm = GridCoordinate::parse("SPACE-OC-L100-AB34").unwrap();
        for other in [&other_layer, &other_depth, &other_realm] {
            assert!(matches!(
                a.distance_to(other, &config),
                Err(CarapaceError::IncompatibleCoordinates(_))
            ));
        }
    }

    #[test]
    fn test_precision_uses_realm_table() {
        let config = GridConfig::default();
        let dungeon = GridCoordinate::parse("VIRTUAL-NETHACK-L412-AA00").unwrap();
        assert!((dungeon.precision_meters(&config) - 80.0 / 120.0).abs() < 1e-9);
    }
}
