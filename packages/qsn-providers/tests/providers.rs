use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::USER_AGENT;
use serde_json::{Map, Value};

use qsn_providers::{Error, SimplenoteClient, simplenote};

fn remote(api_base: &str, default_headers: Map<String, Value>) -> qsn_config::Remote {
	qsn_config::Remote { api_base: api_base.to_string(), timeout_ms: 1_000, default_headers }
}

#[test]
fn builds_default_headers() {
	let mut extra = Map::new();

	extra.insert("User-Agent".to_string(), Value::String("quick-simplenote".to_string()));

	let headers = qsn_providers::default_headers(&extra).expect("Failed to build headers.");
	let value = headers.get(USER_AGENT).expect("Missing user agent header.");

	assert_eq!(value, "quick-simplenote");
}

#[test]
fn rejects_non_string_header_values() {
	let mut extra = Map::new();

	extra.insert("X-Retry".to_string(), Value::from(3));

	let err = qsn_providers::default_headers(&extra).expect_err("Expected header error.");

	assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[test]
fn login_body_is_base64_form() {
	let body = simplenote::login_body("me+notes@example.com", "p&ss word");
	let decoded = STANDARD.decode(body).expect("Body must be base64.");
	let form = String::from_utf8(decoded).expect("Body must be UTF-8.");

	assert_eq!(form, "email=me%2Bnotes%40example.com&password=p%26ss%20word");
}

#[test]
fn data_urls_trim_trailing_slash() {
	let client = SimplenoteClient::new(&remote("https://notes.test/", Map::new()), "u", "p")
		.expect("Failed to build client.");

	assert_eq!(client.data_url(None), "https://notes.test/api2/data");
	assert_eq!(client.data_url(Some("abc")), "https://notes.test/api2/data/abc");
}
