//! Integration tests for the configuration system

use super::test_utils::{reply, with_env, with_isolated_config};
use quilt::config::{ConfigLoader, QuiltConfig};
use quilt::scheduling::Scheduler;
use quilt::store::Datastore;
use tempfile::TempDir;

fn write_config(root: &std::path::Path, name: &str, contents: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_isolated_config(&temp_dir, || ConfigLoader::load(temp_dir.path())).unwrap();
    assert_eq!(config, QuiltConfig::default());
}

#[test]
fn test_environment_specific_file_overrides_base() {
    let temp_dir = TempDir::new().unwrap();
    write_config(
        temp_dir.path(),
        "config.toml",
        "[scheduler]\nmax_automated_steps = 25\nmax_depth = 4\n",
    );
    write_config(temp_dir.path(), "test.toml", "[scheduler]\nmax_depth = 6\n");

    let config_home = temp_dir.path().join("xdg");
    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", config_home.to_str()),
            ("QUILT_ENV", Some("test")),
        ],
        || ConfigLoader::load(temp_dir.path()),
    )
    .unwrap();
    assert_eq!(config.scheduler.max_automated_steps, 25);
    assert_eq!(config.scheduler.max_depth, Some(6));
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path(), "config.toml", "[logging]\noutput = \"syslog\"\n");
    let result = with_isolated_config(&temp_dir, || ConfigLoader::load(temp_dir.path()));
    assert!(result.is_err());
}

#[test]
fn test_loaded_config_drives_scheduler() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("quilt.toml");
    std::fs::write(&config_file, "[scheduler]\nautomation = false\n").unwrap();
    let config = ConfigLoader::load_from_file(&config_file).unwrap();

    let mut scheduler = Scheduler::with_config(Datastore::new(), config.scheduler);
    {
        let mut session = scheduler.open_session("Root?").unwrap();
        session.act(reply("42")).unwrap();
    }
    let session = scheduler.open_session("Root?").unwrap();
    assert!(!session.is_fulfilled());
}
