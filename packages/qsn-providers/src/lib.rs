pub mod simplenote;

mod error;

pub use error::{Error, Result};
pub use simplenote::SimplenoteClient;

use std::{future::Future, pin::Pin};

use reqwest::header::{HeaderMap, HeaderName};
use serde_json::{Map, Value};

use qsn_domain::Note;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The remote note service. Every call is one round trip and nothing is retried here.
pub trait NoteClient
where
	Self: Send + Sync,
{
	/// Creates a note and returns it with the server-assigned key.
	fn add_note<'a>(&'a self, content: &'a str) -> BoxFuture<'a, Result<Note>>;

	fn get_note<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Note>>;

	/// Lists every note, trashed ones included. Entries usually carry no content.
	fn get_note_list(&self) -> BoxFuture<'_, Result<Vec<Note>>>;

	/// Sends the full record. The response does not echo `content` back.
	fn update_note<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>>;

	fn trash_note<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>>;
}

pub fn default_headers(extra: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in extra {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
