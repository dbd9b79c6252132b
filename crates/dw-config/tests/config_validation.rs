//! Configuration loading + resolution tests against real files.
//!
//! Covers:
//! - Resolution order (CLI > DW_CONFIG > DW_CONFIG_DIR)
//! - JSON and TOML loading with validation
//! - Preset determinism

use dw_config::preset::{get_preset, PresetName};
use dw_config::resolve::{resolve_config, ConfigSource, ENV_CONFIG_DIR, ENV_CONFIG_PATH};
use dw_config::{ConfigError, ConfigSnapshot, DetectorConfig};
use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

#[test]
fn env_path_beats_env_dir() {
    with_env_lock(|| {
        let _env = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let tmp = TempDir::new().expect("tempdir");
        let direct = tmp.path().join("direct.json");
        fs::write(&direct, "{}").expect("write direct");
        let dir = tmp.path().join("dir");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("dropwatch.toml"), "").expect("write dir config");

        env::set_var(ENV_CONFIG_PATH, &direct);
        env::set_var(ENV_CONFIG_DIR, &dir);
        let resolved = resolve_config(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.as_deref(), Some(direct.as_path()));

        env::remove_var(ENV_CONFIG_PATH);
        let resolved = resolve_config(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path, Some(dir.join("dropwatch.toml")));
    });
}

#[test]
fn cli_beats_environment() {
    with_env_lock(|| {
        let _env = EnvGuard::new(&[ENV_CONFIG_PATH]);
        let tmp = TempDir::new().expect("tempdir");
        let from_env = tmp.path().join("env.json");
        fs::write(&from_env, "{}").expect("write env config");
        env::set_var(ENV_CONFIG_PATH, &from_env);

        let cli = tmp.path().join("cli.toml");
        let resolved = resolve_config(Some(&cli));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path, Some(cli));
    });
}

#[test]
fn missing_env_path_falls_through() {
    with_env_lock(|| {
        let _env = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        env::set_var(ENV_CONFIG_PATH, "/nonexistent/dropwatch.json");
        env::remove_var(ENV_CONFIG_DIR);
        let resolved = resolve_config(None);
        assert_ne!(resolved.source, ConfigSource::Environment);
    });
}

#[test]
fn toml_file_loads_and_validates() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("dropwatch.toml");
    fs::write(
        &path,
        "taps = [1]\n\n[filter]\nparticle_count = 300\ncensorship_std_factor = 20.0\n",
    )
    .expect("write config");

    let (config, content) = DetectorConfig::from_file(&path).expect("load toml");
    assert_eq!(config.taps.to_string(), "1");
    assert_eq!(config.filter.particle_count, 300);
    assert_eq!(config.filter.censorship_std_factor, 20.0);
    assert!(content.contains("particle_count"));
}

#[test]
fn json_with_bad_taps_is_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("dropwatch.json");
    fs::write(&path, r#"{"taps": [7, 7]}"#).expect("write config");

    let err = DetectorConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::JsonError { .. }), "{}", err);
}

#[test]
fn invalid_probability_maps_to_filter_error_code() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("dropwatch.json");
    fs::write(&path, r#"{"filter": {"censorship_prior": 1.5}}"#).expect("write config");

    let err: dw_common::Error = DetectorConfig::from_file(&path).unwrap_err().into();
    assert_eq!(err.code(), 11);
}

#[test]
fn presets_are_deterministic() {
    for name in PresetName::ALL {
        let a = ConfigSnapshot::new(&get_preset(*name), &Default::default(), None, None);
        let b = ConfigSnapshot::new(&get_preset(*name), &Default::default(), None, None);
        assert!(a.matches(&b), "preset {} not deterministic", name);
    }
    let standard = ConfigSnapshot::new(&get_preset(PresetName::Standard), &Default::default(), None, None);
    let quick = ConfigSnapshot::new(&get_preset(PresetName::Quick), &Default::default(), None, None);
    assert!(!standard.matches(&quick));
}
