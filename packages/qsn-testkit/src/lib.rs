mod error;

pub use error::{Error, Result};

use std::{
	collections::{HashMap, HashSet},
	env, fs,
	path::{Path, PathBuf},
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use time::OffsetDateTime;
use tokio::time as tokio_time;
use uuid::Uuid;

use qsn_domain::{Note, note};
use qsn_providers::{BoxFuture, NoteClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
	Add,
	Get,
	List,
	Update,
	Trash,
}
impl CallKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Add => "add",
			Self::Get => "get",
			Self::List => "list",
			Self::Update => "update",
			Self::Trash => "trash",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
	Start,
	End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEvent {
	pub kind: CallKind,
	pub key: Option<String>,
	pub phase: Phase,
}

/// In-memory stand-in for the remote note service.
///
/// Every call sleeps for the configured latency so concurrent callers genuinely overlap. A key can
/// be given its own latency to make calls naming it finish earlier or later than the rest. Calls
/// are logged with start and end events, and concurrent `get_note` calls are counted.
pub struct FakeNoteClient {
	latency: Duration,
	key_latency: Mutex<HashMap<String, Duration>>,
	notes: Mutex<Vec<Note>>,
	failing: Mutex<HashSet<CallKind>>,
	failing_keys: Mutex<HashSet<String>>,
	events: Mutex<Vec<CallEvent>>,
	in_flight_gets: AtomicUsize,
	max_in_flight_gets: AtomicUsize,
}
impl FakeNoteClient {
	pub fn new() -> Self {
		Self::with_latency(Duration::from_millis(5))
	}

	pub fn with_latency(latency: Duration) -> Self {
		Self {
			latency,
			key_latency: Mutex::new(HashMap::new()),
			notes: Mutex::new(Vec::new()),
			failing: Mutex::new(HashSet::new()),
			failing_keys: Mutex::new(HashSet::new()),
			events: Mutex::new(Vec::new()),
			in_flight_gets: AtomicUsize::new(0),
			max_in_flight_gets: AtomicUsize::new(0),
		}
	}

	pub fn seed(&self, notes: impl IntoIterator<Item = Note>) {
		lock(&self.notes).extend(notes);
	}

	/// Makes every later call of `kind` fail.
	pub fn fail(&self, kind: CallKind) {
		lock(&self.failing).insert(kind);
	}

	/// Overrides the latency of calls that name `key`.
	pub fn delay_key(&self, key: &str, latency: Duration) {
		lock(&self.key_latency).insert(key.to_string(), latency);
	}

	/// Makes later calls that name `key` fail.
	pub fn fail_key(&self, key: &str) {
		lock(&self.failing_keys).insert(key.to_string());
	}

	pub fn stored(&self, key: &str) -> Option<Note> {
		lock(&self.notes).iter().find(|note| note.key == key).cloned()
	}

	pub fn events(&self) -> Vec<CallEvent> {
		lock(&self.events).clone()
	}

	pub fn calls(&self, kind: CallKind) -> usize {
		lock(&self.events)
			.iter()
			.filter(|event| event.kind == kind && event.phase == Phase::Start)
			.count()
	}

	pub fn max_concurrent_gets(&self) -> usize {
		self.max_in_flight_gets.load(Ordering::SeqCst)
	}

	/// Keys of `kind` calls in the order they finished.
	pub fn finished(&self, kind: CallKind) -> Vec<String> {
		lock(&self.events)
			.iter()
			.filter(|event| event.kind == kind && event.phase == Phase::End)
			.filter_map(|event| event.key.clone())
			.collect()
	}

	fn latency_for(&self, key: Option<&str>) -> Duration {
		key.and_then(|key| lock(&self.key_latency).get(key).copied()).unwrap_or(self.latency)
	}

	fn record(&self, kind: CallKind, key: Option<&str>, phase: Phase) {
		lock(&self.events).push(CallEvent { kind, key: key.map(str::to_string), phase });
	}

	fn check_failure(&self, kind: CallKind, key: Option<&str>) -> qsn_providers::Result<()> {
		let kind_fails = lock(&self.failing).contains(&kind);
		let key_fails = key.map(|key| lock(&self.failing_keys).contains(key)).unwrap_or(false);

		if kind_fails || key_fails {
			return Err(qsn_providers::Error::Remote {
				message: format!("Injected {} failure.", kind.as_str()),
			});
		}

		Ok(())
	}

	async fn call<T>(
		&self,
		kind: CallKind,
		key: Option<&str>,
		op: impl FnOnce(&Self) -> qsn_providers::Result<T>,
	) -> qsn_providers::Result<T> {
		self.record(kind, key, Phase::Start);

		tokio_time::sleep(self.latency_for(key)).await;

		let result = self.check_failure(kind, key).and_then(|()| op(self));

		self.record(kind, key, Phase::End);

		result
	}
}
impl Default for FakeNoteClient {
	fn default() -> Self {
		Self::new()
	}
}
impl NoteClient for FakeNoteClient {
	fn add_note<'a>(&'a self, content: &'a str) -> BoxFuture<'a, qsn_providers::Result<Note>> {
		Box::pin(self.call(CallKind::Add, None, move |this| {
			let now = note::unix_seconds(OffsetDateTime::now_utc());
			let created = Note {
				key: Uuid::new_v4().simple().to_string(),
				content: Some(content.to_string()),
				modifydate: now,
				createdate: Some(now),
				version: Some(1),
				syncnum: Some(1),
				..Default::default()
			};

			lock(&this.notes).push(created.clone());

			Ok(created)
		}))
	}

	fn get_note<'a>(&'a self, key: &'a str) -> BoxFuture<'a, qsn_providers::Result<Note>> {
		Box::pin(async move {
			let now = self.in_flight_gets.fetch_add(1, Ordering::SeqCst) + 1;

			self.max_in_flight_gets.fetch_max(now, Ordering::SeqCst);

			let result = self
				.call(CallKind::Get, Some(key), |this| {
					this.stored(key).ok_or_else(|| qsn_providers::Error::Remote {
						message: format!("Note {key} not found."),
					})
				})
				.await;

			self.in_flight_gets.fetch_sub(1, Ordering::SeqCst);

			result
		})
	}

	fn get_note_list(&self) -> BoxFuture<'_, qsn_providers::Result<Vec<Note>>> {
		Box::pin(self.call(CallKind::List, None, |this| {
			Ok(lock(&this.notes)
				.iter()
				.map(|note| Note { content: None, ..note.clone() })
				.collect())
		}))
	}

	fn update_note<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, qsn_providers::Result<Note>> {
		Box::pin(self.call(CallKind::Update, Some(&note.key), move |this| {
			let mut notes = lock(&this.notes);
			let stored = notes.iter_mut().find(|stored| stored.key == note.key).ok_or_else(|| {
				qsn_providers::Error::Remote { message: format!("Note {} not found.", note.key) }
			})?;
			let version = stored.version.unwrap_or(0) + 1;

			*stored = Note {
				version: Some(version),
				syncnum: Some(stored.syncnum.unwrap_or(0) + 1),
				..note.clone()
			};

			Ok(Note { content: None, ..stored.clone() })
		}))
	}

	fn trash_note<'a>(&'a self, key: &'a str) -> BoxFuture<'a, qsn_providers::Result<()>> {
		Box::pin(self.call(CallKind::Trash, Some(key), move |this| {
			let mut notes = lock(&this.notes);
			let stored = notes.iter_mut().find(|stored| stored.key == key).ok_or_else(|| {
				qsn_providers::Error::Remote { message: format!("Note {key} not found.") }
			})?;

			stored.deleted = true;

			Ok(())
		}))
	}
}

/// A uniquely named scratch directory that is removed on drop.
pub struct TestDir {
	path: PathBuf,
}
impl TestDir {
	pub fn new(prefix: &str) -> Result<Self> {
		let path = env::temp_dir().join(format!("{prefix}_{}", Uuid::new_v4().simple()));

		fs::create_dir_all(&path)?;

		Ok(Self { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl Drop for TestDir {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_dir_all(&self.path)
			&& err.kind() != std::io::ErrorKind::NotFound
		{
			eprintln!("Test directory cleanup failed: {err}.");
		}
	}
}

pub fn sample_note(key: &str, content: &str, modifydate: f64) -> Note {
	Note {
		key: key.to_string(),
		content: Some(content.to_string()),
		modifydate,
		..Default::default()
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
