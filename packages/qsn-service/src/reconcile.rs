use crate::operation::Completion;
use qsn_domain::{Note, sort_notes};

/// The authoritative in-memory list of notes.
///
/// Keys are unique and the list is re-sorted after every mutation, so readers always see display
/// order.
#[derive(Debug, Default)]
pub struct NoteCollection {
	notes: Vec<Note>,
}

/// What folding a completion changed.
#[derive(Debug, PartialEq)]
pub enum Reconciled {
	Replaced { count: usize },
	Added { key: String },
	Updated { key: String },
	Removed { key: String },
}

impl NoteCollection {
	pub fn notes(&self) -> &[Note] {
		&self.notes
	}

	pub fn len(&self) -> usize {
		self.notes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.notes.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&Note> {
		self.notes.iter().find(|note| note.key == key)
	}

	pub fn get_index(&self, index: usize) -> Option<&Note> {
		self.notes.get(index)
	}

	/// Folds one successful operation result into the collection.
	pub fn reconcile(&mut self, completion: Completion) -> Reconciled {
		let reconciled = match completion {
			Completion::FetchedAll(notes) => self.replace_all(notes),
			Completion::Created(note) | Completion::Fetched(note) => self.upsert(note),
			Completion::Updated(note) => self.merge_update(note),
			Completion::Deleted { key } => self.remove(key),
		};

		sort_notes(&mut self.notes);

		reconciled
	}

	/// Applies a local edit. Order does not depend on content, so no re-sort is needed.
	pub fn set_content(&mut self, key: &str, content: String) -> Option<&Note> {
		let note = self.notes.iter_mut().find(|note| note.key == key)?;

		note.content = Some(content);

		Some(note)
	}

	fn replace_all(&mut self, notes: Vec<Note>) -> Reconciled {
		let mut unique: Vec<Note> = Vec::with_capacity(notes.len());

		for note in notes {
			if unique.iter().any(|kept| kept.key == note.key) {
				tracing::warn!(key = %note.key, "Dropping duplicate note from batch.");

				continue;
			}

			unique.push(note);
		}

		self.notes = unique;

		Reconciled::Replaced { count: self.notes.len() }
	}

	fn upsert(&mut self, note: Note) -> Reconciled {
		let key = note.key.clone();

		match self.notes.iter_mut().find(|existing| existing.key == key) {
			Some(existing) => {
				let content = note.content.or_else(|| existing.content.take());

				*existing = Note { content, ..note };

				Reconciled::Updated { key }
			},
			None => {
				self.notes.push(note);

				Reconciled::Added { key }
			},
		}
	}

	// The server never echoes content on update, so the local copy is kept. Whatever the local
	// record holds when the update lands wins.
	fn merge_update(&mut self, response: Note) -> Reconciled {
		let key = response.key.clone();
		let Some(existing) = self.notes.iter_mut().find(|existing| existing.key == key) else {
			tracing::warn!(key = %key, "Update finished for a note that is no longer present.");

			return Reconciled::Updated { key };
		};
		let content = existing.content.take();

		*existing = Note { content, ..response };

		Reconciled::Updated { key }
	}

	fn remove(&mut self, key: String) -> Reconciled {
		self.notes.retain(|note| note.key != key);

		Reconciled::Removed { key }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn note(key: &str, content: Option<&str>, modifydate: f64) -> Note {
		Note {
			key: key.to_string(),
			content: content.map(str::to_string),
			modifydate,
			..Default::default()
		}
	}

	#[test]
	fn fetched_batch_drops_duplicate_keys() {
		let mut collection = NoteCollection::default();
		let reconciled = collection.reconcile(Completion::FetchedAll(vec![
			note("a", Some("first"), 1.0),
			note("a", Some("second"), 2.0),
			note("b", Some("other"), 3.0),
		]));

		assert_eq!(reconciled, Reconciled::Replaced { count: 2 });
		assert_eq!(collection.get("a").and_then(|note| note.content.as_deref()), Some("first"));
	}

	#[test]
	fn created_note_with_existing_key_replaces_instead_of_duplicating() {
		let mut collection = NoteCollection::default();

		collection.reconcile(Completion::Created(note("a", Some("local"), 1.0)));
		collection.reconcile(Completion::Created(note("a", None, 5.0)));

		assert_eq!(collection.len(), 1);
		assert_eq!(collection.get("a").map(|note| note.modifydate), Some(5.0));
		assert_eq!(collection.get("a").and_then(|note| note.content.as_deref()), Some("local"));
	}

	#[test]
	fn update_for_missing_note_is_ignored() {
		let mut collection = NoteCollection::default();

		collection.reconcile(Completion::FetchedAll(vec![note("a", Some("x"), 1.0)]));

		let reconciled = collection.reconcile(Completion::Updated(note("gone", None, 9.0)));

		assert_eq!(reconciled, Reconciled::Updated { key: "gone".to_string() });
		assert_eq!(collection.len(), 1);
		assert!(collection.get("gone").is_none());
	}

	#[test]
	fn set_content_reports_unknown_keys() {
		let mut collection = NoteCollection::default();

		assert!(collection.set_content("missing", "text".to_string()).is_none());
	}
}
