use tokio::sync::Semaphore;

use crate::{
	Error, Result,
	operation::{BackgroundOperation, Completion, Operation, OperationContext},
};
use qsn_domain::Note;
use qsn_providers::NoteClient;

/// Fetches one note while holding a permit. The permit is released on every exit path.
pub async fn fetch_one(client: &dyn NoteClient, permits: &Semaphore, key: &str) -> Result<Note> {
	let _permit = permits
		.acquire()
		.await
		.map_err(|_| Error::Operation { message: "Fetch permits are closed.".to_string() })?;

	Ok(client.get_note(key).await?)
}

/// Lists every note and downloads the ones that are not trashed.
pub async fn fetch_all(context: &OperationContext) -> Result<Vec<Note>> {
	let index = context.client.get_note_list().await?;
	let total = index.len();
	let keys = index.into_iter().filter(|note| !note.deleted).map(|note| note.key).collect::<Vec<_>>();

	tracing::debug!(total, live = keys.len(), "Listed notes.");

	BoundedFetcher::new(context.clone()).fetch(keys).await
}

/// Starts one fetch per key right away and lets the shared semaphore cap how many reach the
/// remote service at once.
pub struct BoundedFetcher {
	context: OperationContext,
}
impl BoundedFetcher {
	pub fn new(context: OperationContext) -> Self {
		Self { context }
	}

	/// Returns notes in the order the keys were given. Every spawned fetch is joined before
	/// returning, and the first failure fails the whole batch.
	pub async fn fetch(&self, keys: Vec<String>) -> Result<Vec<Note>> {
		let operations = keys
			.into_iter()
			.map(|key| {
				let mut operation =
					BackgroundOperation::new(Operation::FetchOne { key }, self.context.clone());

				operation.start();

				operation
			})
			.collect::<Vec<_>>();
		let mut notes = Vec::with_capacity(operations.len());
		let mut first_error = None;

		for operation in operations {
			match operation.join().await {
				Ok(Completion::Fetched(note)) => notes.push(note),
				Ok(other) => {
					first_error.get_or_insert(Error::Operation {
						message: format!("Unexpected fetch completion: {other:?}."),
					});
				},
				Err(err) => {
					tracing::warn!(error = %err, "Note download failed.");

					first_error.get_or_insert(err);
				},
			}
		}

		match first_error {
			Some(err) => Err(err),
			None => Ok(notes),
		}
	}
}
