//! Diagram source editing.
//!
//! The app only needs a small contract from the editor, captured by
//! [`TextSource`]; [`EditorBuffer`] is the rope-backed implementation used by
//! the terminal UI.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer, INDENT};

/// An editable document the preview can observe.
pub trait TextSource {
    /// Full current text.
    fn text(&self) -> String;

    /// Counter that advances on every change to the text.
    fn revision(&self) -> u64;

    /// Replace the whole document.
    ///
    /// Returns `false` and leaves the document untouched when `text` equals
    /// the current content, so pushing the same text back never registers as
    /// a change.
    fn replace_content(&mut self, text: &str) -> bool;
}
