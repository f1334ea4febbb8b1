//! Editor state.

pub mod command;
pub mod editor;

pub use editor::{run_editor, EditorSession};
