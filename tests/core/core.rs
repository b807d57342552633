use carapace::core::manager::GRID_EVENTS_NAME;
use carapace::{GridConfig, GridCoordinate, MapLayerManager, TileIndex, TilePath};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

#[test]
fn coordinate_codes_round_trip_bit_exact() {
    for code in [
        "EARTH-OC-L100",
        "EARTH-OC-L100-AB34-CD15",
        "VIRTUAL-NETHACK-L412-AA00-BB11-CC22",
        "SPACE-MILKYWAY-L500-DT49",
    ] {
        let coord = GridCoordinate::parse(code).expect("valid code should parse");
        assert_eq!(coord.code(), code);
        assert_eq!(GridCoordinate::parse(&coord.code()).unwrap(), coord);
    }
}

#[test]
fn zoom_navigation_scenario() {
    // EARTH-OC-L100-AB34 zoomed into CD15 is depth 2; one zoom out returns
    let base = GridCoordinate::parse("EARTH-OC-L100-AB34").unwrap();
    let zoomed = base.zoom_into("CD15").unwrap();
    assert_eq!(zoomed.code(), "EARTH-OC-L100-AB34-CD15");
    assert_eq!(zoomed.depth(), 2);

    let back = zoomed.zoom_out().unwrap();
    assert_eq!(back.code(), "EARTH-OC-L100-AB34");
    assert_eq!(back.depth(), 1);
    assert_eq!(back, base);
}

#[test]
fn dataset_hydration_persistence_and_audit_flow() {
    let tmp = tempdir().unwrap();
    let datasets = tmp.path().join("datasets");
    fs::create_dir_all(&datasets).unwrap();
    fs::write(
        datasets.join("EARTH-OC-L100.json"),
        json!({
            "cells": { "AB34": { "CD15": { "name": "atoll", "population": 0 } } },
            "metadata": { "source": "static-earth-pack" }
        })
        .to_string(),
    )
    .unwrap();

    let mut manager = MapLayerManager::new(tmp.path()).unwrap();

    // Hydrated from the static dataset on first touch
    let coord = GridCoordinate::parse("EARTH-OC-L100-AB34-CD15").unwrap();
    assert_eq!(
        manager.get_cell(&coord),
        Some(json!({"name": "atoll", "population": 0}))
    );

    // Mutate, persist, and restore through a fresh manager
    let edited = coord.zoom_out().unwrap().zoom_into("CD16").unwrap();
    manager.set_cell(&edited, json!({"name": "survey-site"}));
    let snapshot_path = manager.save_layer("EARTH", "OC", 100).unwrap();
    assert!(snapshot_path.exists());

    let mut fresh = MapLayerManager::new(tmp.path()).unwrap();
    let restored = fresh.restore_layer("EARTH", "OC", 100).unwrap().unwrap();
    assert_eq!(
        restored.get_path(&edited.cells),
        Some(json!({"name": "survey-site"}))
    );

    // Audit trail saw the hydrate and the save
    let audit = fs::read_to_string(tmp.path().join(GRID_EVENTS_NAME)).unwrap();
    assert!(audit.contains("layer.hydrate"));
    assert!(audit.contains("layer.save"));
    for line in audit.lines() {
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(ulid::Ulid::from_string(event["event_id"].as_str().unwrap()).is_ok());
        assert!(event["ts"].as_str().unwrap().ends_with('Z'));
    }
}

#[test]
fn config_override_drives_distance_and_cascade() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join("GRID.json"),
        json!({
            "precision": [
                { "realm": "EARTH", "layer_min": 100, "layer_max": 399, "base_km": 100.0 }
            ],
            "layer_parents": { "210": 200 }
        })
        .to_string(),
    )
    .unwrap();

    let manager = MapLayerManager::new(tmp.path()).unwrap();
    let a = GridCoordinate::parse("EARTH-OC-L100-AA00").unwrap();
    let b = GridCoordinate::parse("EARTH-OC-L100-AA01").unwrap();
    // Adjacent depth-1 rows: overridden 100 km base, one 120x shrink
    let distance = a.distance_to(&b, manager.config()).unwrap();
    assert!((distance - 100_000.0 / 120.0).abs() < 1e-6);

    // The override replaces the stock grouping table entirely
    let mut index = TileIndex::new(manager.config().clone());
    index.attach("doc", "L200", true).unwrap();
    assert!(index.documents_at("L210:AA00", true).unwrap().contains("doc"));
    index.attach("earth-doc", "L300", true).unwrap();
    assert!(!index.documents_at("L310:AA00", true).unwrap().contains("earth-doc"));
}

#[test]
fn frontmatter_supplier_to_ranked_lookup() {
    // The external supplier yields (document_id, [(tile_path, cascade)])
    let supplier = vec![
        (
            "oceania-atlas".to_string(),
            vec![("L300".to_string(), true)],
        ),
        (
            "reef-survey".to_string(),
            vec![("L320:AB34".to_string(), true)],
        ),
        (
            "draft-notes".to_string(),
            vec![("L320:AB34".to_string(), false)],
        ),
    ];

    let mut index = TileIndex::new(GridConfig::default());
    index.rebuild(supplier).unwrap();

    let coord = GridCoordinate::parse("EARTH-OC-L320-AB34-CD15").unwrap();
    let tile = TilePath::from_coordinate(&coord).to_string();
    let inherited = index.documents_at(&tile, true).unwrap();
    assert!(inherited.contains("oceania-atlas"));
    assert!(inherited.contains("reef-survey"));
    assert!(!inherited.contains("draft-notes"));

    let exact = index.documents_at(&tile, false).unwrap();
    assert!(exact.is_empty());

    let mut scores = std::collections::BTreeMap::new();
    scores.insert("oceania-atlas".to_string(), 0.4);
    scores.insert("reef-survey".to_string(), 0.9);
    assert_eq!(
        index.ranked(&tile, true, &scores).unwrap(),
        vec!["reef-survey", "oceania-atlas"]
    );
}
