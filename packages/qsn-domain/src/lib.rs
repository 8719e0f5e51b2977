pub mod note;
pub mod ordering;

pub use note::{Note, PINNED_TAG, UNTITLED};
pub use ordering::sort_notes;
