use std::ops::{Deref, DerefMut};

use crate::error::BoxError;

/// An open, forward-only handle over the rows of one executed query.
///
/// This is the surface the row decoder consumes. Implementations must tolerate
/// `close` being the last call they receive; the decoder calls it exactly once.
pub trait Cursor {
    /// Column names in result order.
    ///
    /// # Errors
    /// Returns the driver error if the result metadata cannot be read.
    fn column_names(&mut self) -> Result<Vec<String>, BoxError>;

    /// Move to the next row. Returns `false` when the rows are exhausted or the
    /// cursor failed; check [`Cursor::last_error`] to tell the two apart.
    fn advance(&mut self) -> bool;

    /// Copy the current row into `buffers`, one slot per column. `None` is NULL,
    /// otherwise the value's textual bytes.
    ///
    /// # Errors
    /// Returns the driver error if the current row cannot be read.
    fn scan_into(&mut self, buffers: &mut [Option<Vec<u8>>]) -> Result<(), BoxError>;

    /// Terminal error hit while advancing, if any.
    fn last_error(&mut self) -> Option<BoxError>;

    /// Release the cursor.
    fn close(&mut self);
}

/// Owns a cursor for the duration of a decode call and closes it on drop, so the
/// cursor is released on every exit path including unwinding.
pub(crate) struct CursorGuard<C: Cursor> {
    cursor: C,
}

impl<C: Cursor> CursorGuard<C> {
    pub(crate) fn new(cursor: C) -> Self {
        Self { cursor }
    }
}

impl<C: Cursor> Deref for CursorGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.cursor
    }
}

impl<C: Cursor> DerefMut for CursorGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.cursor
    }
}

impl<C: Cursor> Drop for CursorGuard<C> {
    fn drop(&mut self) {
        self.cursor.close();
    }
}
