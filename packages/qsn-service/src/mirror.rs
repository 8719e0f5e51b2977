use std::{
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use crate::{Error, Result};
use qsn_domain::Note;

/// Directory created inside the configured temp dir. Only this directory is ever wiped.
pub const MIRROR_DIR_NAME: &str = "quick-simplenote";

/// One plain-text file per note, named by the note key.
///
/// Files are never authoritative. They are created from the in-memory record when a note is
/// opened and read back only on save.
#[derive(Debug, Clone)]
pub struct NoteMirror {
	dir: PathBuf,
}
impl NoteMirror {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Mirrors into a dedicated directory under `base` rather than `base` itself.
	pub fn within(base: &Path) -> Self {
		Self::new(base.join(MIRROR_DIR_NAME))
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Creates the directory if needed and removes every file left in it.
	pub fn prepare(&self) -> Result<()> {
		fs::create_dir_all(&self.dir).map_err(|err| self.io_error(&self.dir, err))?;

		let entries = fs::read_dir(&self.dir).map_err(|err| self.io_error(&self.dir, err))?;
		let mut removed = 0_usize;

		for entry in entries {
			let path = entry.map_err(|err| self.io_error(&self.dir, err))?.path();

			if path.is_file() {
				fs::remove_file(&path).map_err(|err| self.io_error(&path, err))?;

				removed += 1;
			}
		}

		tracing::debug!(dir = %self.dir.display(), removed, "Prepared note mirror.");

		Ok(())
	}

	pub fn path_for(&self, key: &str) -> Result<PathBuf> {
		if !is_safe_key(key) {
			return Err(Error::InvalidRequest {
				message: format!("Note key {key:?} cannot be used as a file name."),
			});
		}

		Ok(self.dir.join(key))
	}

	/// Maps a file back to the key it mirrors. Files outside the mirror directory map to nothing.
	pub fn key_for_path(&self, path: &Path) -> Option<String> {
		let parent = path.parent()?;

		if parent != self.dir {
			let same_dir = match (fs::canonicalize(parent), fs::canonicalize(&self.dir)) {
				(Ok(parent), Ok(dir)) => parent == dir,
				_ => false,
			};

			if !same_dir {
				return None;
			}
		}

		let key = path.file_name()?.to_str()?;

		is_safe_key(key).then(|| key.to_string())
	}

	/// Writes the note content to its file unless the file already exists.
	pub fn materialize(&self, note: &Note) -> Result<PathBuf> {
		let path = self.path_for(&note.key)?;

		if !path.exists() {
			fs::write(&path, note.content()).map_err(|err| self.io_error(&path, err))?;

			tracing::debug!(key = %note.key, "Materialized note file.");
		}

		Ok(path)
	}

	/// Reads a mirror file. A file that no longer exists reads as `None`.
	pub fn read(&self, path: &Path) -> Result<Option<String>> {
		match fs::read_to_string(path) {
			Ok(content) => Ok(Some(content)),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(self.io_error(path, err)),
		}
	}

	/// Removes the file for `key`. Returns whether a file was actually removed.
	pub fn remove(&self, key: &str) -> Result<bool> {
		let path = self.path_for(key)?;

		match fs::remove_file(&path) {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
			Err(err) => Err(self.io_error(&path, err)),
		}
	}

	fn io_error(&self, path: &Path, source: std::io::Error) -> Error {
		Error::Mirror { path: path.to_path_buf(), source }
	}
}

fn is_safe_key(key: &str) -> bool {
	!key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\', '\0'])
}
