use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read config file {path:?}.")]
	ReadConfig { path: PathBuf, source: io::Error },
	#[error("Config file {path:?} is not valid TOML.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	/// A value that parsed but cannot be used. `field` is the dotted TOML path.
	#[error("{field} {message}")]
	Validation { field: &'static str, message: String },
}
impl Error {
	/// The dotted path of the rejected setting, for validation errors.
	pub fn field(&self) -> Option<&'static str> {
		match self {
			Self::Validation { field, .. } => Some(*field),
			_ => None,
		}
	}
}
