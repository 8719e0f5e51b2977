use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Option<Value>) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{section}]."));

	match value {
		Some(value) => {
			table.insert(key.to_string(), value);
		},
		None => {
			table.remove(key);
		},
	}

	toml::to_string(&root).expect("Failed to render template config.")
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

	path.push(format!("qsn_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> qsn_config::Result<qsn_config::Config> {
	let path = write_temp_config(payload);
	let result = qsn_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_error(payload: String, field: &str, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert_eq!(err.field(), Some(field));
	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn loads_template_and_normalizes_api_base() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Template config should load.");

	assert_eq!(cfg.remote.api_base, "https://simple-note.appspot.com");
	assert_eq!(cfg.credentials.pair(), Some(("user@example.com", "hunter2")));
	assert_eq!(cfg.queue.fetch_concurrency, 3);
	assert_eq!(cfg.queue.poll_interval().as_millis(), 1_000);
	assert_eq!(cfg.queue.status_clear_delay().as_millis(), 2_000);
}

#[test]
fn queue_section_is_optional() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove("queue");

	let cfg = load_payload(toml::to_string(&root).expect("Failed to render config."))
		.expect("Config without [queue] should load.");

	assert_eq!(cfg.queue.poll_interval_ms, 1_000);
	assert_eq!(cfg.queue.status_clear_delay_ms, 2_000);
	assert_eq!(cfg.queue.fetch_concurrency, 3);
}

#[test]
fn blank_credentials_load_as_missing() {
	let payload =
		sample_toml_with("credentials", "username", Some(Value::String("   ".to_string())));
	let cfg = load_payload(payload).expect("Blank credentials are not a load error.");

	assert_eq!(cfg.credentials.username, None);
	assert_eq!(cfg.credentials.pair(), None);
}

#[test]
fn missing_password_loads_as_missing() {
	let cfg = load_payload(sample_toml_with("credentials", "password", None))
		.expect("Missing password is not a load error.");

	assert_eq!(cfg.credentials.password, None);
	assert!(cfg.credentials.pair().is_none());
}

#[test]
fn password_whitespace_is_preserved() {
	let payload =
		sample_toml_with("credentials", "password", Some(Value::String(" pad ".to_string())));
	let cfg = load_payload(payload).expect("Config should load.");

	assert_eq!(cfg.credentials.password.as_deref(), Some(" pad "));
}

#[test]
fn fetch_concurrency_must_be_positive() {
	expect_validation_error(
		sample_toml_with("queue", "fetch_concurrency", Some(Value::Integer(0))),
		"queue.fetch_concurrency",
		"queue.fetch_concurrency must be greater than zero.",
	);
}

#[test]
fn poll_interval_must_be_positive() {
	expect_validation_error(
		sample_toml_with("queue", "poll_interval_ms", Some(Value::Integer(0))),
		"queue.poll_interval_ms",
		"queue.poll_interval_ms must be greater than zero.",
	);
}

#[test]
fn api_base_must_be_http() {
	expect_validation_error(
		sample_toml_with("remote", "api_base", Some(Value::String("ftp://notes".to_string()))),
		"remote.api_base",
		"remote.api_base must start with http:// or https://.",
	);
}

#[test]
fn default_headers_must_be_strings() {
	let mut headers = toml::map::Map::new();

	headers.insert("X-Retry".to_string(), Value::Integer(3));

	expect_validation_error(
		sample_toml_with("remote", "default_headers", Some(Value::Table(headers))),
		"remote.default_headers",
		"remote.default_headers entry X-Retry must be a string.",
	);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("qsn_config_test_does_not_exist.toml");
	let err = qsn_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, qsn_config::Error::ReadConfig { .. }));
	assert_eq!(err.field(), None);
	assert!(err.to_string().contains("qsn_config_test_does_not_exist.toml"));
}
