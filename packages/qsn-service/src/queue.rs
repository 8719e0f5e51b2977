use std::{collections::VecDeque, time::Duration};

use tokio::time::Instant;

use crate::operation::{BackgroundOperation, OperationKind, OperationOutcome};

pub const STATUS_PREFIX: &str = "QuickSimplenote";

const PROGRESS_STEPS: usize = 4;

/// What a single poll of the queue observed.
#[derive(Debug)]
pub enum QueueEvent {
	/// Nothing is running and no status clear is due.
	Idle,
	/// The current operation is still running.
	Progress { kind: OperationKind, status: String },
	/// The current operation finished and was joined.
	Finished { kind: OperationKind, outcome: OperationOutcome },
	/// The delayed status clear came due.
	StatusCleared,
}

/// Runs background operations one at a time, in the order they were enqueued. The queue stays
/// running between a finish and the following [`OperationQueue::advance`].
///
/// The queue never blocks on a running operation. It is driven by [`OperationQueue::poll`], which
/// the owner calls on a fixed interval.
pub struct OperationQueue {
	pending: VecDeque<BackgroundOperation>,
	current: Option<BackgroundOperation>,
	running: bool,
	progress: usize,
	status_clear_delay: Duration,
	clear_status_at: Option<Instant>,
}
impl OperationQueue {
	pub fn new(status_clear_delay: Duration) -> Self {
		Self {
			pending: VecDeque::new(),
			current: None,
			running: false,
			progress: 0,
			status_clear_delay,
			clear_status_at: None,
		}
	}

	/// Appends an operation. When nothing is running it starts immediately instead of waiting for
	/// the next poll.
	pub fn enqueue(&mut self, operation: BackgroundOperation) {
		tracing::debug!(
			operation = %operation.kind(),
			pending = self.pending.len(),
			"Enqueued operation."
		);

		self.pending.push_back(operation);

		if !self.running {
			self.start_next();
		}
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn pending_len(&self) -> usize {
		self.pending.len()
	}

	pub fn current_kind(&self) -> Option<OperationKind> {
		self.current.as_ref().map(BackgroundOperation::kind)
	}

	pub fn schedule_status_clear(&mut self) {
		self.clear_status_at = Some(Instant::now() + self.status_clear_delay);
	}

	/// Inspects the current operation.
	///
	/// A finished operation is joined and handed back without starting the next one. The caller
	/// folds the outcome in, then calls [`OperationQueue::advance`]. A poll that finds the queue
	/// still parked after a finish advances it first.
	pub async fn poll(&mut self) -> QueueEvent {
		if self.current.is_none() && self.running {
			self.advance();
		}

		let Some(current) = self.current.as_ref() else {
			return self.poll_idle();
		};
		let kind = current.kind();

		if current.is_alive() {
			self.progress = (self.progress + 1) % PROGRESS_STEPS;

			return QueueEvent::Progress { kind, status: progress_text(kind, self.progress) };
		}

		let Some(finished) = self.current.take() else {
			return QueueEvent::Idle;
		};

		QueueEvent::Finished { kind, outcome: finished.join().await }
	}

	/// Moves past a finished operation: starts the next pending one, or schedules the status
	/// clear once nothing is left. Does nothing while an operation is current.
	pub fn advance(&mut self) {
		if self.current.is_some() {
			return;
		}
		if self.pending.is_empty() {
			if self.running {
				self.running = false;

				self.schedule_status_clear();
			}

			return;
		}

		self.start_next();
	}

	fn poll_idle(&mut self) -> QueueEvent {
		if let Some(deadline) = self.clear_status_at
			&& Instant::now() >= deadline
		{
			self.clear_status_at = None;

			return QueueEvent::StatusCleared;
		}

		QueueEvent::Idle
	}

	fn start_next(&mut self) {
		let Some(mut next) = self.pending.pop_front() else {
			self.running = false;

			return;
		};

		next.start();

		self.current = Some(next);
		self.running = true;
		self.progress = 0;
		self.clear_status_at = None;
	}
}

pub fn progress_text(kind: OperationKind, step: usize) -> String {
	format!("{STATUS_PREFIX}: {}{}", kind.progress_label(), ".".repeat(step % PROGRESS_STEPS))
}
