use crate::config::Config;
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

// Environment mutation is unsafe in edition 2024; the lock serialises it
fn set(key: &str, value: &str) {
    unsafe { env::set_var(key, value) }
}

fn unset(key: &str) {
    unsafe { env::remove_var(key) }
}

#[test]
fn test_env_overrides_sections() {
    let _guard = get_env_lock().lock().unwrap();
    set("CRYPTOSTAT_DATA_DIR", "/srv/ohlcv");
    set("INITIAL_BALANCE", "2500");
    set("MLP_HIDDEN_LAYERS", "32, 16, 8");
    set("SIGNIFICANCE_LEVEL", "0.01");

    let config = Config::from_env().unwrap();

    assert_eq!(config.data.data_dir, PathBuf::from("/srv/ohlcv"));
    assert_eq!(config.simulation.initial_balance, 2500.0);
    assert_eq!(config.model.hidden_layers, vec![32, 16, 8]);
    assert!((config.stats.significance_level - 0.01).abs() < 1e-12);
    assert_eq!(config.simulation.params().initial_balance, 2500.0);

    // Cleanup
    unset("CRYPTOSTAT_DATA_DIR");
    unset("INITIAL_BALANCE");
    unset("MLP_HIDDEN_LAYERS");
    unset("SIGNIFICANCE_LEVEL");
}

#[test]
fn test_malformed_scalars_fall_back_to_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    set("ANOMALY_MULTIPLE", "ten");
    set("TEST_FRACTION", "1.5");
    set("RANDOM_SEED", "-3");

    let config = Config::from_env().unwrap();

    assert_eq!(config.simulation.anomaly_multiple, 10.0);
    assert_eq!(config.model.test_fraction, 0.2);
    assert_eq!(config.model.random_seed, 42);

    // Cleanup
    unset("ANOMALY_MULTIPLE");
    unset("TEST_FRACTION");
    unset("RANDOM_SEED");
}

#[test]
fn test_malformed_list_returns_error() {
    let _guard = get_env_lock().lock().unwrap();
    set("POLY_DEGREES", "2,three,4");

    let result = Config::from_env();

    assert!(result.is_err());
    let err_msg = format!("{:?}", result.err().unwrap());
    assert!(err_msg.contains("Failed to parse POLY_DEGREES"));

    // Cleanup
    unset("POLY_DEGREES");
}

#[test]
fn test_poly_degrees_from_env() {
    let _guard = get_env_lock().lock().unwrap();
    set("POLY_DEGREES", "2,4");

    let config = Config::from_env().unwrap();
    assert_eq!(config.model.poly_degrees, vec![2, 4]);

    // Cleanup
    unset("POLY_DEGREES");
}
