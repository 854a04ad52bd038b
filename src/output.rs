//! User-facing message sink
//!
//! Every function that prints for the user takes an [`Output`]. While an
//! editor owns the terminal the sink is switched to buffering, and the
//! buffered text is replayed once the editor is gone. Writes and mode
//! switches take the same lock, so a message from the save task can never
//! land between "stop buffering" and "replay buffer".

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

enum Mode {
    Direct,
    Buffered(Vec<u8>),
}

struct Sink {
    target: Box<dyn Write + Send>,
    mode: Mode,
}

/// Shared handle to the message sink; clones write to the same place
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    pub fn new(target: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink {
                target: Box::new(target),
                mode: Mode::Direct,
            })),
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write one line, buffered or not depending on the current mode
    pub fn println(&self, message: impl fmt::Display) {
        let mut guard = self.lock();
        let sink = &mut *guard;
        let line = format!("{}\n", message);
        match &mut sink.mode {
            Mode::Buffered(buffer) => buffer.extend_from_slice(line.as_bytes()),
            Mode::Direct => {
                let _ = sink.target.write_all(line.as_bytes());
                let _ = sink.target.flush();
            }
        }
    }

    /// Write one line straight to the target, bypassing any buffer
    pub fn println_direct(&self, message: impl fmt::Display) {
        let mut sink = self.lock();
        let _ = writeln!(sink.target, "{}", message);
        let _ = sink.target.flush();
    }

    /// Start holding messages back
    pub fn begin_buffering(&self) {
        let mut sink = self.lock();
        if matches!(sink.mode, Mode::Direct) {
            sink.mode = Mode::Buffered(Vec::new());
        }
    }

    /// Go back to direct mode and replay what was held back
    pub fn end_buffering(&self) -> io::Result<()> {
        let mut sink = self.lock();
        if let Mode::Buffered(buffer) = std::mem::replace(&mut sink.mode, Mode::Direct) {
            sink.target.write_all(&buffer)?;
            sink.target.flush()?;
        }
        Ok(())
    }

    pub fn is_buffering(&self) -> bool {
        matches!(self.lock().mode, Mode::Buffered(_))
    }
}

/// In-memory writer whose contents stay readable after being handed to
/// [`Output::new`]
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buffer = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
