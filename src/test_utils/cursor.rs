use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::cursor::Cursor;
use crate::error::BoxError;

type RawRow = Vec<Option<Vec<u8>>>;

/// In-memory cursor with scriptable failures and counters for `advance`/`close`.
#[derive(Debug, Default)]
pub struct ScriptedCursor {
    columns: Vec<String>,
    rows: VecDeque<RawRow>,
    current: Option<RawRow>,
    position: usize,
    column_error: Option<String>,
    scan_error: Option<(usize, String)>,
    terminal_error: Option<String>,
    exhausted: bool,
    closed: bool,
    advances: Rc<Cell<usize>>,
    closes: Rc<Cell<usize>>,
}

impl ScriptedCursor {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Append a row of text values, `None` meaning NULL.
    #[must_use]
    pub fn row<const N: usize>(self, values: [Option<&str>; N]) -> Self {
        let raw = values
            .iter()
            .map(|value| value.map(|s| s.as_bytes().to_vec()))
            .collect();
        self.raw_row(raw)
    }

    #[must_use]
    pub fn raw_row(mut self, values: RawRow) -> Self {
        self.rows.push_back(values);
        self
    }

    #[must_use]
    pub fn fail_columns(mut self, message: &str) -> Self {
        self.column_error = Some(message.to_owned());
        self
    }

    /// Fail `scan_into` on the `row`-th row (1-based).
    #[must_use]
    pub fn fail_scan_at(mut self, row: usize, message: &str) -> Self {
        self.scan_error = Some((row, message.to_owned()));
        self
    }

    /// Report `message` from `last_error` once the rows are exhausted.
    #[must_use]
    pub fn terminal_error(mut self, message: &str) -> Self {
        self.terminal_error = Some(message.to_owned());
        self
    }

    #[must_use]
    pub fn close_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }

    #[must_use]
    pub fn advance_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.advances)
    }
}

impl Cursor for ScriptedCursor {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError> {
        match &self.column_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(self.columns.clone()),
        }
    }

    fn advance(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.advances.set(self.advances.get() + 1);
        self.current = self.rows.pop_front();
        if self.current.is_some() {
            self.position += 1;
            true
        } else {
            self.exhausted = true;
            false
        }
    }

    fn scan_into(&mut self, buffers: &mut [Option<Vec<u8>>]) -> Result<(), BoxError> {
        if let Some((row, message)) = &self.scan_error
            && *row == self.position
        {
            return Err(message.clone().into());
        }
        let current = self.current.as_ref().ok_or("scan without a current row")?;
        if current.len() != buffers.len() {
            return Err(format!(
                "expected {} destination buffers, got {}",
                current.len(),
                buffers.len()
            )
            .into());
        }
        buffers.clone_from_slice(current);
        Ok(())
    }

    fn last_error(&mut self) -> Option<BoxError> {
        if self.exhausted {
            self.terminal_error.take().map(Into::into)
        } else {
            None
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
        self.closes.set(self.closes.get() + 1);
    }
}
