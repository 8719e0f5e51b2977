use std::{
	path::{Path, PathBuf},
	sync::Mutex,
};

use qsn_service::EditorHost;

/// Stands in for an editor on a plain terminal. Views are reported rather than opened.
pub struct TerminalEditor {
	settings_path: PathBuf,
	last_status: Mutex<Option<String>>,
}
impl TerminalEditor {
	pub fn new(settings_path: PathBuf) -> Self {
		Self { settings_path, last_status: Mutex::new(None) }
	}
}
impl EditorHost for TerminalEditor {
	fn set_status(&self, message: Option<&str>) {
		let mut last = self.last_status.lock().unwrap_or_else(|err| err.into_inner());

		if last.as_deref() == message {
			return;
		}

		*last = message.map(str::to_string);

		if let Some(message) = message {
			eprintln!("[{message}]");
		}
	}

	fn open_file(&self, path: &Path) {
		println!("open {}", path.display());
	}

	fn close_file(&self, path: &Path) {
		println!("closed {}", path.display());
	}

	fn open_settings(&self) {
		println!(
			"Set credentials.username and credentials.password in {}.",
			self.settings_path.display()
		);
	}
}
