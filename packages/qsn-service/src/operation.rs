use std::{fmt, sync::Arc};

use time::OffsetDateTime;
use tokio::{sync::Semaphore, task::JoinHandle};

use crate::{Error, Result, fanout};
use qsn_domain::Note;
use qsn_providers::{BoxFuture, NoteClient};

/// What a background operation should do.
#[derive(Debug, Clone)]
pub enum Operation {
	Create,
	FetchOne { key: String },
	FetchAll,
	Update { note: Note },
	Delete { key: String },
}
impl Operation {
	pub fn kind(&self) -> OperationKind {
		match self {
			Self::Create => OperationKind::Create,
			Self::FetchOne { .. } => OperationKind::FetchOne,
			Self::FetchAll => OperationKind::FetchAll,
			Self::Update { .. } => OperationKind::Update,
			Self::Delete { .. } => OperationKind::Delete,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
	Create,
	FetchOne,
	FetchAll,
	Update,
	Delete,
}
impl OperationKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Create => "create",
			Self::FetchOne => "fetch_one",
			Self::FetchAll => "fetch_all",
			Self::Update => "update",
			Self::Delete => "delete",
		}
	}

	/// Status text shown while the operation runs.
	pub fn progress_label(self) -> &'static str {
		match self {
			Self::Create => "Creating note",
			Self::FetchOne => "Downloading note",
			Self::FetchAll => "Downloading notes",
			Self::Update => "Uploading note",
			Self::Delete => "Deleting note",
		}
	}
}
impl fmt::Display for OperationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The successful result of a background operation.
#[derive(Debug)]
pub enum Completion {
	Created(Note),
	Fetched(Note),
	FetchedAll(Vec<Note>),
	/// The server's copy after an update. It carries no content.
	Updated(Note),
	Deleted {
		key: String,
	},
}

pub type OperationOutcome = Result<Completion>;

/// Everything a running operation may touch. Nothing here is the note collection.
#[derive(Clone)]
pub struct OperationContext {
	pub client: Arc<dyn NoteClient>,
	pub fetch_permits: Arc<Semaphore>,
}
impl OperationContext {
	pub fn new(client: Arc<dyn NoteClient>, fetch_concurrency: usize) -> Self {
		Self { client, fetch_permits: Arc::new(Semaphore::new(fetch_concurrency)) }
	}
}

/// One unit of remote work, run as its own task once started.
pub struct BackgroundOperation {
	operation: Operation,
	context: OperationContext,
	handle: Option<JoinHandle<OperationOutcome>>,
}
impl BackgroundOperation {
	pub fn new(operation: Operation, context: OperationContext) -> Self {
		Self { operation, context, handle: None }
	}

	pub fn kind(&self) -> OperationKind {
		self.operation.kind()
	}

	/// Spawns the operation. Starting twice is a no-op.
	pub fn start(&mut self) {
		if self.handle.is_some() {
			return;
		}

		tracing::debug!(operation = %self.kind(), "Starting background operation.");

		self.handle = Some(tokio::spawn(execute(self.operation.clone(), self.context.clone())));
	}

	pub fn is_started(&self) -> bool {
		self.handle.is_some()
	}

	/// Whether the operation has been started and has not finished yet. Never blocks.
	pub fn is_alive(&self) -> bool {
		self.handle.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
	}

	/// Waits for the operation and returns its outcome. A panicked task becomes an error outcome.
	pub async fn join(self) -> OperationOutcome {
		let kind = self.kind();
		let Some(handle) = self.handle else {
			return Err(Error::Operation { message: format!("{kind} operation was never started.") });
		};

		match handle.await {
			Ok(outcome) => outcome,
			Err(err) => Err(Error::Operation { message: format!("{kind} task failed: {err}") }),
		}
	}
}

// Boxed because FetchAll spawns FetchOne operations that run this same function.
fn execute(
	operation: Operation,
	context: OperationContext,
) -> BoxFuture<'static, OperationOutcome> {
	Box::pin(async move {
		match operation {
			Operation::Create => {
				let note = context.client.add_note("").await?;

				tracing::info!(key = %note.key, "Created note.");

				Ok(Completion::Created(note))
			},
			Operation::FetchOne { key } => {
				let note = fanout::fetch_one(context.client.as_ref(), &context.fetch_permits, &key)
					.await?;

				Ok(Completion::Fetched(note))
			},
			Operation::FetchAll => {
				let notes = fanout::fetch_all(&context).await?;

				tracing::info!(count = notes.len(), "Downloaded notes.");

				Ok(Completion::FetchedAll(notes))
			},
			Operation::Update { mut note } => {
				note.touch(OffsetDateTime::now_utc());

				let updated = context.client.update_note(&note).await?;

				tracing::info!(key = %updated.key, "Uploaded note.");

				Ok(Completion::Updated(updated))
			},
			Operation::Delete { key } => {
				context.client.trash_note(&key).await?;

				tracing::info!(key = %key, "Trashed note.");

				Ok(Completion::Deleted { key })
			},
		}
	})
}
