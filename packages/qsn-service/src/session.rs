use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use crate::{
	Error, Result,
	mirror::NoteMirror,
	operation::{BackgroundOperation, Operation, OperationContext, OperationKind, OperationOutcome},
	queue::{OperationQueue, QueueEvent, STATUS_PREFIX},
	reconcile::{NoteCollection, Reconciled},
};
use qsn_config::Config;
use qsn_domain::Note;
use qsn_providers::{NoteClient, SimplenoteClient};

/// The editor the notes are edited in. Calls arrive from the coordinating loop only.
pub trait EditorHost
where
	Self: Send + Sync,
{
	/// Shows `message` in every open view, or clears the status when `None`.
	fn set_status(&self, message: Option<&str>);

	fn open_file(&self, path: &Path);

	/// Closes any view showing `path` without prompting to save.
	fn close_file(&self, path: &Path);

	/// Brings up the settings so the user can fill in credentials.
	fn open_settings(&self);
}

/// Application state for one editor process: the note collection, its file mirror and the queue
/// that feeds both.
///
/// All mutation happens through `&mut self` on the coordinating loop. Background operations only
/// ever see the remote client and the fetch permits.
pub struct Session {
	cfg: Config,
	editor: Arc<dyn EditorHost>,
	client: Option<Arc<dyn NoteClient>>,
	context: Option<OperationContext>,
	collection: NoteCollection,
	mirror: NoteMirror,
	queue: OperationQueue,
}
impl Session {
	pub fn new(cfg: Config, editor: Arc<dyn EditorHost>) -> Self {
		let mirror = NoteMirror::within(&cfg.mirror.temp_dir);
		let queue = OperationQueue::new(cfg.queue.status_clear_delay());

		Self {
			cfg,
			editor,
			client: None,
			context: None,
			collection: NoteCollection::default(),
			mirror,
			queue,
		}
	}

	/// Uses `client` instead of building a Simplenote client from the credentials.
	pub fn with_client(
		cfg: Config,
		editor: Arc<dyn EditorHost>,
		client: Arc<dyn NoteClient>,
	) -> Self {
		Self { client: Some(client), ..Self::new(cfg, editor) }
	}

	pub fn is_started(&self) -> bool {
		self.context.is_some()
	}

	/// Whether an operation is running or waiting.
	pub fn is_busy(&self) -> bool {
		self.queue.is_running()
	}

	pub fn notes(&self) -> &[Note] {
		self.collection.notes()
	}

	pub fn collection(&self) -> &NoteCollection {
		&self.collection
	}

	pub fn mirror(&self) -> &NoteMirror {
		&self.mirror
	}

	/// Connects and begins downloading every note.
	///
	/// Returns `Ok(false)` without doing anything when already started.
	pub fn start(&mut self) -> Result<bool> {
		if self.is_started() {
			return Ok(false);
		}

		let Some((username, password)) = self.cfg.credentials.pair() else {
			tracing::warn!("Credentials are missing; opening settings.");

			self.show_status("Please configure username/password");
			self.editor.open_settings();
			self.queue.schedule_status_clear();

			return Err(Error::MissingCredentials);
		};
		let client = match self.client.clone() {
			Some(client) => client,
			None => Arc::new(SimplenoteClient::new(&self.cfg.remote, username, password)?),
		};

		self.show_status("Setting up");
		self.mirror.prepare()?;

		self.context = Some(OperationContext::new(client, self.cfg.queue.fetch_concurrency));

		self.show_status("Downloading notes");
		self.enqueue(Operation::FetchAll)?;

		tracing::info!(mirror = %self.mirror.dir().display(), "Session started.");

		Ok(true)
	}

	/// Titles of every note in display order. Starts the session first when needed.
	pub fn show_notes(&mut self) -> Result<Vec<String>> {
		if !self.is_started() {
			self.start()?;
		}

		Ok(self.collection.notes().iter().map(|note| note.title().to_string()).collect())
	}

	/// Opens the note at `index` in display order, writing its file first if it does not exist.
	pub fn open_note(&mut self, index: usize) -> Result<PathBuf> {
		let note = self.collection.get_index(index).ok_or_else(|| Error::InvalidRequest {
			message: format!("No note at index {index}."),
		})?;
		let path = self.mirror.materialize(note)?;

		self.editor.open_file(&path);

		Ok(path)
	}

	pub fn create_note(&mut self) -> Result<()> {
		self.enqueue(Operation::Create)?;
		self.show_status("Creating note");

		Ok(())
	}

	/// Pushes the saved file content into its note and uploads it.
	///
	/// Files that are not bound to a known note are ignored and `Ok(false)` is returned.
	pub fn on_save(&mut self, path: &Path) -> Result<bool> {
		let Some(key) = self.bound_key(path) else {
			return Ok(false);
		};
		let Some(content) = self.mirror.read(path)? else {
			tracing::debug!(key = %key, "Saved file is gone; skipping upload.");

			return Ok(false);
		};
		let Some(note) = self.collection.set_content(&key, content).cloned() else {
			return Ok(false);
		};

		self.enqueue(Operation::Update { note })?;

		Ok(true)
	}

	/// Trashes the note bound to `path`. Unbound files are ignored and `Ok(false)` is returned.
	pub fn delete_note(&mut self, path: &Path) -> Result<bool> {
		let Some(key) = self.bound_key(path) else {
			return Ok(false);
		};

		self.enqueue(Operation::Delete { key })?;
		self.show_status("Deleting note");

		Ok(true)
	}

	/// One step of the coordinating loop. Call it on the configured poll interval.
	pub async fn tick(&mut self) {
		match self.queue.poll().await {
			QueueEvent::Idle => {},
			QueueEvent::Progress { status, .. } => self.editor.set_status(Some(&status)),
			QueueEvent::Finished { kind, outcome } => {
				self.finish(kind, outcome);
				self.queue.advance();
			},
			QueueEvent::StatusCleared => self.editor.set_status(None),
		}
	}

	/// Ticks until the queue has nothing left to run.
	pub async fn run_until_idle(&mut self) {
		let interval = self.cfg.queue.poll_interval();

		while self.queue.is_running() {
			tokio::time::sleep(interval).await;

			self.tick().await;
		}
	}

	fn enqueue(&mut self, operation: Operation) -> Result<()> {
		let context = self.context.clone().ok_or(Error::NotStarted)?;

		self.queue.enqueue(BackgroundOperation::new(operation, context));

		Ok(())
	}

	fn finish(&mut self, kind: OperationKind, outcome: OperationOutcome) {
		let completion = match outcome {
			Ok(completion) => completion,
			Err(err) => {
				tracing::error!(operation = %kind, error = %err, "Background operation failed.");

				self.show_status(&format!("{} failed: {err}", kind.progress_label()));

				return;
			},
		};

		match self.collection.reconcile(completion) {
			Reconciled::Replaced { count } => {
				tracing::debug!(count, "Replaced note collection.");
			},
			Reconciled::Added { key } =>
				if let Some(index) = self.collection.notes().iter().position(|note| note.key == key)
					&& let Err(err) = self.open_note(index)
				{
					tracing::warn!(key = %key, error = %err, "Failed to open created note.");
				},
			Reconciled::Updated { key } => {
				tracing::debug!(key = %key, "Merged note update.");
			},
			Reconciled::Removed { key } => self.retire_mirror(&key),
		}

		self.show_status("Done");
	}

	fn retire_mirror(&self, key: &str) {
		let path = match self.mirror.path_for(key) {
			Ok(path) => path,
			Err(err) => {
				tracing::warn!(key = %key, error = %err, "Deleted note has no mirror path.");

				return;
			},
		};

		if let Err(err) = self.mirror.remove(key) {
			tracing::warn!(key = %key, error = %err, "Failed to remove mirror file.");
		}

		self.editor.close_file(&path);
	}

	fn bound_key(&self, path: &Path) -> Option<String> {
		let key = self.mirror.key_for_path(path)?;

		if self.collection.get(&key).is_none() {
			tracing::debug!(key = %key, "File is not bound to a known note.");

			return None;
		}

		Some(key)
	}

	fn show_status(&self, message: &str) {
		self.editor.set_status(Some(&format!("{STATUS_PREFIX}: {message}")));
	}
}
