mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Credentials, Mirror, Queue, Remote, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(invalid("service.log_level", "must be non-empty."));
	}

	let api_base = cfg.remote.api_base.as_str();

	if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
		return Err(invalid("remote.api_base", "must start with http:// or https://."));
	}
	if cfg.remote.timeout_ms == 0 {
		return Err(invalid("remote.timeout_ms", "must be greater than zero."));
	}

	for (key, value) in &cfg.remote.default_headers {
		if !value.is_string() {
			return Err(invalid(
				"remote.default_headers",
				format!("entry {key} must be a string."),
			));
		}
	}

	if cfg.mirror.temp_dir.as_os_str().is_empty() {
		return Err(invalid("mirror.temp_dir", "must be non-empty."));
	}
	if cfg.queue.poll_interval_ms == 0 {
		return Err(invalid("queue.poll_interval_ms", "must be greater than zero."));
	}
	if cfg.queue.status_clear_delay_ms == 0 {
		return Err(invalid("queue.status_clear_delay_ms", "must be greater than zero."));
	}
	if cfg.queue.fetch_concurrency == 0 {
		return Err(invalid("queue.fetch_concurrency", "must be greater than zero."));
	}

	Ok(())
}

fn invalid(field: &'static str, message: impl Into<String>) -> Error {
	Error::Validation { field, message: message.into() }
}

fn normalize(cfg: &mut Config) {
	cfg.remote.api_base = cfg.remote.api_base.trim().trim_end_matches('/').to_string();

	cfg.credentials.username = cfg
		.credentials
		.username
		.take()
		.map(|username| username.trim().to_string())
		.filter(|username| !username.is_empty());

	// Passwords keep their whitespace; only an all-blank value counts as missing.
	if cfg.credentials.password.as_deref().map(|password| password.trim().is_empty()).unwrap_or(false)
	{
		cfg.credentials.password = None;
	}
}
