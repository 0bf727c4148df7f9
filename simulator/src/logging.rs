use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::writer::MakeWriter;

/// Tees formatted log output to stdout and, when `--log` is given, a file.
#[derive(Clone, Default)]
pub(crate) struct LogWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl LogWriter {
    pub(crate) fn new(path: Option<&Path>) -> io::Result<Self> {
        let file = path.map(File::create).transpose()?;
        Ok(Self {
            file: file.map(|f| Arc::new(Mutex::new(f))),
        })
    }

    fn with_file(&self, f: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
        match &self.file {
            Some(file) => f(&mut file.lock().unwrap_or_else(PoisonError::into_inner)),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.with_file(|file| file.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.with_file(Write::flush)
    }
}

/// Keeps the first `first` and the last `tail` step messages of a run.
pub(crate) struct EventLog {
    first: usize,
    tail: usize,
    head: Vec<String>,
    recent: VecDeque<String>,
    dropped: u64,
}

impl EventLog {
    pub(crate) fn new(first: usize, tail: usize) -> Self {
        Self {
            first,
            tail,
            head: Vec::with_capacity(first),
            recent: VecDeque::with_capacity(tail),
            dropped: 0,
        }
    }

    pub(crate) fn record(&mut self, message: String) {
        if self.head.len() < self.first {
            self.head.push(message);
            return;
        }
        if self.tail == 0 {
            self.dropped += 1;
            return;
        }
        if self.recent.len() == self.tail {
            self.recent.pop_front();
            self.dropped += 1;
        }
        self.recent.push_back(message);
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let mut lines = self.head.clone();
        if self.dropped > 0 {
            lines.push(format!("... {} steps omitted ...", self.dropped));
        }
        lines.extend(self.recent.iter().cloned());
        lines
    }

    pub(crate) fn dump_failure(&self, reason: &str) {
        tracing::error!("divergence: {reason}");
        for line in self.lines() {
            tracing::error!("  {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EventLog;

    #[test]
    fn keeps_head_and_tail() {
        let mut log = EventLog::new(2, 2);
        for i in 0..6 {
            log.record(format!("step {i}"));
        }
        assert_eq!(
            log.lines(),
            ["step 0", "step 1", "... 2 steps omitted ...", "step 4", "step 5"]
        );
    }

    #[test]
    fn short_runs_are_complete() {
        let mut log = EventLog::new(4, 4);
        log.record("a".to_string());
        log.record("b".to_string());
        assert_eq!(log.lines(), ["a", "b"]);
    }
}
