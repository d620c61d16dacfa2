#![allow(missing_docs)]

use helios::simulation::ecosystem::Ecosystem;
use helios::simulation::error::SimError;
use helios::simulation::level::LevelConfig;
use helios::simulation::params::Params;
use std::fs;

#[test]
fn test_save_and_load_level() {
    let level = LevelConfig::forest();
    let save_path = std::env::temp_dir().join("helios_test_forest.json");

    level.save_to_file(&save_path).unwrap();
    assert!(save_path.exists());

    let loaded = LevelConfig::from_file(&save_path).unwrap();
    assert_eq!(loaded.name, level.name);
    assert_eq!(loaded.species.len(), level.species.len());
    for (a, b) in loaded.species.iter().zip(&level.species) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.prey, b.prey);
        assert_eq!(a.goal, b.goal);
        assert_eq!(a.initial_population, b.initial_population);
    }

    // A loaded level runs like the built-in one
    let from_disk = Ecosystem::new(&loaded, Params::default(), 5).unwrap();
    let built_in = Ecosystem::new(&level, Params::default(), 5).unwrap();
    assert_eq!(from_disk.summary().populations, built_in.summary().populations);

    fs::remove_file(&save_path).unwrap();
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("helios_no_such_level.json");
    assert!(matches!(LevelConfig::from_file(&path), Err(SimError::Io { .. })));
}

#[test]
fn test_load_malformed_file() {
    let path = std::env::temp_dir().join("helios_malformed_level.json");
    fs::write(&path, "{ \"name\": \"broken\", \"species\": [").unwrap();

    assert!(matches!(LevelConfig::from_file(&path), Err(SimError::Json(_))));
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_load_rejects_invalid_level() {
    let path = std::env::temp_dir().join("helios_empty_level.json");
    fs::write(&path, r#"{ "name": "empty", "species": [] }"#).unwrap();

    assert!(matches!(
        LevelConfig::from_file(&path),
        Err(SimError::InvalidLevel(_))
    ));
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_params_json_defaults() {
    let params: Params = serde_json::from_str(r#"{ "max_animals": 12, "rebalance_interval": null }"#).unwrap();
    assert_eq!(params.max_animals, 12);
    assert!(params.rebalance_interval.is_none());
    assert_eq!(params.starting_energy, Params::default().starting_energy);
}
