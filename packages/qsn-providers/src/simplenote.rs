use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::{BoxFuture, Error, NoteClient, Result};
use qsn_domain::Note;

const INDEX_PAGE_LENGTH: &str = "100";

pub struct SimplenoteClient {
	http: Client,
	api_base: String,
	username: String,
	password: String,
	token: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct IndexPage {
	#[serde(default)]
	data: Vec<Note>,
	#[serde(default)]
	mark: Option<String>,
}

impl SimplenoteClient {
	pub fn new(remote: &qsn_config::Remote, username: &str, password: &str) -> Result<Self> {
		let http = Client::builder()
			.timeout(Duration::from_millis(remote.timeout_ms))
			.default_headers(crate::default_headers(&remote.default_headers)?)
			.build()?;

		Ok(Self {
			http,
			api_base: remote.api_base.trim_end_matches('/').to_string(),
			username: username.to_string(),
			password: password.to_string(),
			token: OnceCell::new(),
		})
	}

	pub fn data_url(&self, key: Option<&str>) -> String {
		match key {
			Some(key) => format!("{}/api2/data/{}", self.api_base, urlencoding::encode(key)),
			None => format!("{}/api2/data", self.api_base),
		}
	}

	pub async fn add_note(&self, content: &str) -> Result<Note> {
		let body = serde_json::json!({ "content": content });
		let request = self.http.post(self.data_url(None)).json(&body);
		let mut note: Note = self.send_json(request).await?;

		if note.key.is_empty() {
			return Err(Error::InvalidResponse {
				message: "Created note is missing its key.".to_string(),
			});
		}
		if note.content.is_none() {
			note.content = Some(content.to_string());
		}

		Ok(note)
	}

	pub async fn get_note(&self, key: &str) -> Result<Note> {
		let request = self.http.get(self.data_url(Some(key)));

		self.send_json(request).await
	}

	pub async fn get_note_list(&self) -> Result<Vec<Note>> {
		let url = format!("{}/api2/index", self.api_base);
		let mut notes = Vec::new();
		let mut mark: Option<String> = None;

		loop {
			let mut request = self.http.get(&url).query(&[("length", INDEX_PAGE_LENGTH)]);

			if let Some(mark) = mark.as_deref() {
				request = request.query(&[("mark", mark)]);
			}

			let page: IndexPage = self.send_json(request).await?;

			notes.extend(page.data);

			match page.mark {
				Some(next) if !next.is_empty() => mark = Some(next),
				_ => break,
			}
		}

		tracing::debug!(count = notes.len(), "Fetched note index.");

		Ok(notes)
	}

	pub async fn update_note(&self, note: &Note) -> Result<Note> {
		if note.key.is_empty() {
			return Err(Error::InvalidConfig {
				message: "Cannot update a note without a key.".to_string(),
			});
		}

		let request = self.http.post(self.data_url(Some(&note.key))).json(note);

		self.send_json(request).await
	}

	pub async fn trash_note(&self, key: &str) -> Result<()> {
		let body = serde_json::json!({ "deleted": 1 });
		let request = self.http.post(self.data_url(Some(key))).json(&body);
		let _: Note = self.send_json(request).await?;

		Ok(())
	}

	async fn token(&self) -> Result<&str> {
		let token = self.token.get_or_try_init(|| self.login()).await?;

		Ok(token.as_str())
	}

	async fn login(&self) -> Result<String> {
		let url = format!("{}/api/login", self.api_base);
		let res = self
			.http
			.post(url)
			.body(login_body(&self.username, &self.password))
			.send()
			.await?;

		if !res.status().is_success() {
			return Err(Error::Auth {
				message: format!("Login rejected with status {}.", res.status()),
			});
		}

		let token = res.text().await?.trim().to_string();

		if token.is_empty() {
			return Err(Error::Auth { message: "Login returned an empty token.".to_string() });
		}

		tracing::info!(username = %self.username, "Authenticated against the note service.");

		Ok(token)
	}

	async fn send_json<T>(&self, request: RequestBuilder) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let token = self.token().await?;
		let res = request.query(&[("auth", token), ("email", self.username.as_str())]).send().await?;
		let bytes = res.error_for_status()?.bytes().await?;

		Ok(serde_json::from_slice(&bytes)?)
	}
}

impl NoteClient for SimplenoteClient {
	fn add_note<'a>(&'a self, content: &'a str) -> BoxFuture<'a, Result<Note>> {
		Box::pin(SimplenoteClient::add_note(self, content))
	}

	fn get_note<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Note>> {
		Box::pin(SimplenoteClient::get_note(self, key))
	}

	fn get_note_list(&self) -> BoxFuture<'_, Result<Vec<Note>>> {
		Box::pin(SimplenoteClient::get_note_list(self))
	}

	fn update_note<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>> {
		Box::pin(SimplenoteClient::update_note(self, note))
	}

	fn trash_note<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(SimplenoteClient::trash_note(self, key))
	}
}

/// The login endpoint takes a base64-encoded form body rather than a plain form.
pub fn login_body(username: &str, password: &str) -> String {
	let form =
		format!("email={}&password={}", urlencoding::encode(username), urlencoding::encode(password));

	STANDARD.encode(form)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_index_page_with_mark() {
		let json = serde_json::json!({
			"count": 2,
			"mark": "next-page",
			"data": [
				{ "key": "a", "modifydate": "10.5", "deleted": 0 },
				{ "key": "b", "modifydate": 11, "deleted": 1, "systemtags": ["pinned"] }
			]
		});
		let page: IndexPage = serde_json::from_value(json).expect("parse failed");

		assert_eq!(page.mark.as_deref(), Some("next-page"));
		assert_eq!(page.data.len(), 2);
		assert!(page.data[1].deleted);
		assert!(page.data[1].is_pinned());
	}

	#[test]
	fn parses_last_index_page_without_mark() {
		let json = serde_json::json!({ "count": 0, "data": [] });
		let page: IndexPage = serde_json::from_value(json).expect("parse failed");

		assert!(page.mark.is_none());
		assert!(page.data.is_empty());
	}
}
