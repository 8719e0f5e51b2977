use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use time::OffsetDateTime;

pub const PINNED_TAG: &str = "pinned";
pub const UNTITLED: &str = "untitled";

/// A note as the remote service stores it.
///
/// `key` is the only identity. `content` is `None` when the server did not echo it back, which is
/// always the case for update responses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
	pub key: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	#[serde(default, deserialize_with = "deserialize_timestamp")]
	pub modifydate: f64,
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		deserialize_with = "deserialize_optional_timestamp"
	)]
	pub createdate: Option<f64>,
	#[serde(default)]
	pub systemtags: Vec<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default, deserialize_with = "deserialize_flag", serialize_with = "serialize_flag")]
	pub deleted: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub syncnum: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub minversion: Option<u64>,
}
impl Note {
	pub fn is_pinned(&self) -> bool {
		self.systemtags.iter().any(|tag| tag == PINNED_TAG)
	}

	pub fn content(&self) -> &str {
		self.content.as_deref().unwrap_or_default()
	}

	/// First line of the content, or [`UNTITLED`] when that line is blank.
	pub fn title(&self) -> &str {
		let first_line = self.content().split('\n').next().unwrap_or_default();
		let first_line = first_line.strip_suffix('\r').unwrap_or(first_line);

		if first_line.trim().is_empty() { UNTITLED } else { first_line }
	}

	pub fn touch(&mut self, now: OffsetDateTime) {
		self.modifydate = unix_seconds(now);
	}
}

pub fn unix_seconds(ts: OffsetDateTime) -> f64 {
	ts.unix_timestamp_nanos() as f64 / 1_000_000_000.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
	Number(f64),
	Text(String),
}
impl RawTimestamp {
	fn into_seconds<E>(self) -> Result<f64, E>
	where
		E: serde::de::Error,
	{
		match self {
			Self::Number(value) => Ok(value),
			Self::Text(text) => text
				.trim()
				.parse::<f64>()
				.map_err(|_| E::custom(format!("Timestamp {text:?} is not numeric."))),
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
	Bool(bool),
	Int(i64),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
	D: Deserializer<'de>,
{
	RawTimestamp::deserialize(deserializer)?.into_seconds()
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<RawTimestamp>::deserialize(deserializer)?.map(RawTimestamp::into_seconds).transpose()
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
	D: Deserializer<'de>,
{
	match RawFlag::deserialize(deserializer)? {
		RawFlag::Bool(value) => Ok(value),
		RawFlag::Int(0) => Ok(false),
		RawFlag::Int(1) => Ok(true),
		RawFlag::Int(other) => Err(D::Error::custom(format!("Flag value {other} must be 0 or 1."))),
	}
}

// The service speaks 0/1 for flags.
fn serialize_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_u8(u8::from(*value))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn note_with_content(content: Option<&str>) -> Note {
		Note { key: "k".to_string(), content: content.map(str::to_string), ..Default::default() }
	}

	#[test]
	fn title_is_first_line() {
		assert_eq!(note_with_content(Some("Groceries\nmilk\neggs")).title(), "Groceries");
		assert_eq!(note_with_content(Some("single line")).title(), "single line");
		assert_eq!(note_with_content(Some("windows\r\nline")).title(), "windows");
	}

	#[test]
	fn title_falls_back_to_untitled() {
		assert_eq!(note_with_content(None).title(), UNTITLED);
		assert_eq!(note_with_content(Some("")).title(), UNTITLED);
		assert_eq!(note_with_content(Some("\nbody")).title(), UNTITLED);
	}

	#[test]
	fn touch_stamps_fractional_seconds() {
		let mut note = note_with_content(None);

		note.touch(OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_500_000_000).unwrap());

		assert_eq!(note.modifydate, 1_700_000_000.5);
	}
}
