//! Store factory tests: backend selection via environment and config file.

mod support;

#[cfg(feature = "json-repo")]
use std::io::Write;

#[cfg(feature = "json-repo")]
use sps_rust::db::repository::OccupancyLogRepository;
#[cfg(feature = "json-repo")]
use sps_rust::db::StoreFactory;
use sps_rust::db::StoreType;
use support::with_scoped_env;

#[test]
fn test_env_defaults_to_local_without_data_dir() {
    with_scoped_env(
        &[("STORE_TYPE", None), ("SPS_DATA_DIR", None)],
        || assert_eq!(StoreType::from_env(), StoreType::Local),
    );
}

#[test]
fn test_env_data_dir_selects_json() {
    with_scoped_env(
        &[("STORE_TYPE", None), ("SPS_DATA_DIR", Some("/tmp/sps"))],
        || assert_eq!(StoreType::from_env(), StoreType::Json),
    );
}

#[test]
fn test_env_store_type_overrides() {
    with_scoped_env(
        &[("STORE_TYPE", Some("local")), ("SPS_DATA_DIR", Some("/tmp/sps"))],
        || assert_eq!(StoreType::from_env(), StoreType::Local),
    );
}

#[cfg(feature = "json-repo")]
#[tokio::test]
async fn test_from_env_builds_working_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_str().unwrap().to_string();

    let store = with_scoped_env(
        &[
            ("STORE_TYPE", Some("json")),
            ("SPS_DATA_DIR", Some(&data_dir)),
            ("SPS_LOCK_TIMEOUT_MS", Some("100")),
        ],
        StoreFactory::from_env,
    )
    .unwrap();

    assert!(store.health_check().await.unwrap());
    assert!(dir.path().join("combined_occupancy.json").exists());
}

#[cfg(feature = "json-repo")]
#[tokio::test]
async fn test_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("docs");
    let config_path = dir.path().join("store.toml");

    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "[store]").unwrap();
    writeln!(file, "type = \"json\"").unwrap();
    writeln!(file, "[json]").unwrap();
    writeln!(file, "data_dir = {:?}", data_dir.to_str().unwrap()).unwrap();

    let store = StoreFactory::from_config_file(&config_path).unwrap();
    assert!(store.health_check().await.unwrap());
    assert!(data_dir.join("combined_occupancy.json").exists());
}
