use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Username and password are not configured.")]
	MissingCredentials,
	#[error("Session has not been started.")]
	NotStarted,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Mirror error at {path:?}: {source}")]
	Mirror { path: PathBuf, source: std::io::Error },
	#[error("Operation error: {message}")]
	Operation { message: String },
}
impl From<qsn_providers::Error> for Error {
	fn from(err: qsn_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
