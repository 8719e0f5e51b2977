pub mod fanout;
pub mod mirror;
pub mod operation;
pub mod queue;
pub mod reconcile;
pub mod session;

mod error;

pub use error::{Error, Result};
pub use fanout::BoundedFetcher;
pub use mirror::NoteMirror;
pub use operation::{
	BackgroundOperation, Completion, Operation, OperationContext, OperationKind, OperationOutcome,
};
pub use queue::{OperationQueue, QueueEvent, STATUS_PREFIX};
pub use reconcile::{NoteCollection, Reconciled};
pub use session::{EditorHost, Session};
