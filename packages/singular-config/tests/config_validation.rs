use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use singular_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("singular_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads_and_normalizes_identity_header() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = singular_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.security.identity_header, "x-singular-user-id");
	assert_eq!(cfg.listing.default_limit, 20);
	assert_eq!(cfg.storage.postgres.pool_max_conns, 8);
}

#[test]
fn missing_optional_sections_fall_back_to_defaults() {
	let payload = r#"
[service]
http_bind = "127.0.0.1:9000"

[storage.postgres]
dsn            = "postgres://localhost/singular"
pool_max_conns = 2
"#;
	let cfg: Config = toml::from_str(payload).expect("Failed to parse minimal config.");

	assert!(singular_config::validate(&cfg).is_ok());
	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.storage.postgres.acquire_timeout_ms, 5_000);
	assert_eq!(cfg.listing.tag_default_limit, 50);
	assert_eq!(cfg.listing.user_default_limit, 25);
	assert!(cfg.security.bind_localhost_only);
}

#[test]
fn default_limit_must_not_exceed_page_cap() {
	let payload = sample_with("listing", "default_limit", Value::Integer(101));
	let path = write_temp_config(payload);
	let result = singular_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected default_limit validation error.");

	assert!(
		err.to_string().contains("listing.default_limit must be in the range 1-100."),
		"Unexpected error: {err}"
	);
}

#[test]
fn tag_default_limit_must_be_positive() {
	let mut cfg = base_config();

	cfg.listing.tag_default_limit = 0;

	let err = singular_config::validate(&cfg).expect_err("Expected tag limit validation error.");

	assert!(
		err.to_string().contains("listing.tag_default_limit must be in the range 1-100."),
		"Unexpected error: {err}"
	);
}

#[test]
fn pool_size_must_be_positive() {
	let payload = sample_with("storage.postgres", "pool_max_conns", Value::Integer(0));
	let path = write_temp_config(payload);
	let result = singular_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected pool size validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");
}

#[test]
fn identity_header_rejects_invalid_characters() {
	let mut cfg = base_config();

	cfg.security.identity_header = "x user".to_string();

	let err = singular_config::validate(&cfg).expect_err("Expected header validation error.");

	assert!(
		err.to_string().contains("security.identity_header must contain only"),
		"Unexpected error: {err}"
	);
}

#[test]
fn unreadable_path_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("singular_config_test_missing_file.toml");

	let err = singular_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err:?}");
	assert!(
		err.to_string().contains("singular_config_test_missing_file.toml"),
		"Message should name the file: {err}"
	);
}

#[test]
fn malformed_toml_reports_parse_error() {
	let path = write_temp_config("[service\nhttp_bind = ".to_string());
	let result = singular_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err:?}");
	assert!(err.to_string().contains("is not valid TOML"), "Unexpected message: {err}");
}
