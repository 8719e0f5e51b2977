use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub credentials: Credentials,
	pub remote: Remote,
	pub mirror: Mirror,
	#[serde(default)]
	pub queue: Queue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
	/// Start syncing as soon as the front end comes up.
	#[serde(default)]
	pub autostart: bool,
}

/// Account used against the remote note service.
///
/// Both fields are optional at load time. A session refuses to start until both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
	pub username: Option<String>,
	pub password: Option<String>,
}
impl Credentials {
	pub fn pair(&self) -> Option<(&str, &str)> {
		match (self.username.as_deref(), self.password.as_deref()) {
			(Some(username), Some(password)) => Some((username, password)),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
	pub api_base: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mirror {
	/// Directory holding one file per note. It is wiped on every start.
	pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Queue {
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default = "default_status_clear_delay_ms")]
	pub status_clear_delay_ms: u64,
	#[serde(default = "default_fetch_concurrency")]
	pub fetch_concurrency: usize,
}
impl Queue {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn status_clear_delay(&self) -> Duration {
		Duration::from_millis(self.status_clear_delay_ms)
	}
}
impl Default for Queue {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval_ms(),
			status_clear_delay_ms: default_status_clear_delay_ms(),
			fetch_concurrency: default_fetch_concurrency(),
		}
	}
}

fn default_poll_interval_ms() -> u64 {
	1_000
}

fn default_status_clear_delay_ms() -> u64 {
	2_000
}

fn default_fetch_concurrency() -> usize {
	3
}
