//! Interactive edit session
//!
//! The paste is written to a temporary file and handed to an external
//! editor. While the editor runs, a watch task polls the file and publishes
//! every saved revision as a new paste chained to the previous one. User
//! messages are buffered until the editor exits so they do not scribble over
//! its screen.
//!
//! Lifecycle: spawn editor → watch and save (any number of times) → editor
//! exits → stop watch task and wait for it → replay messages → delete file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime};

use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::error::{PastilaError, Result};
use crate::output::Output;
use crate::service::PasteService;
use crate::types::{Paste, WriteOptions};

const QUICK_EXIT_PROMPT: &str =
    "Your editor exited too quickly. Does it run in background? Press any key to continue";

/// Size and modification time of the watched file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl Snapshot {
    pub async fn of(path: &Path) -> std::io::Result<Self> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    /// A save happened: the file is non-empty and its size or mtime moved
    pub fn changed_from(&self, last: &Snapshot) -> bool {
        self.len != 0 && (self.len != last.len || self.modified != last.modified)
    }
}

type KeyPress = Box<dyn AsyncRead + Send + Unpin>;

/// Edits one paste in an external editor
pub struct EditSession {
    service: PasteService,
    output: Output,
    config: EditorConfig,
    key_press: Mutex<KeyPress>,
}

impl EditSession {
    pub fn new(service: PasteService, output: Output, config: EditorConfig) -> Self {
        Self {
            service,
            output,
            config,
            key_press: Mutex::new(Box::new(tokio::io::stdin())),
        }
    }

    /// Read the quick-exit acknowledgment from `reader` instead of stdin
    pub fn with_key_press(mut self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.key_press = Mutex::new(Box::new(reader));
        self
    }

    /// Run the editor on `paste` and return the last saved revision
    ///
    /// Returns `paste` itself when nothing was saved. Failing to prepare the
    /// temporary file or to start the editor ends the session with an error;
    /// a failed save is only reported and editing goes on.
    pub async fn run(&self, paste: Paste) -> Result<Paste> {
        let file = materialize(&paste)?;
        let path = file.path().to_path_buf();
        let initial = Snapshot::of(&path).await?;

        let started = Instant::now();
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(&path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| PastilaError::Editor {
                program: self.config.program.clone(),
                source,
            })?;

        info!(
            program = %self.config.program,
            path = %path.display(),
            "Launched editor"
        );

        self.output.begin_buffering();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let watcher = tokio::spawn(
            FileWatch {
                path: path.clone(),
                last: initial,
                current: paste.clone(),
                service: self.service.clone(),
                output: self.output.clone(),
                poll_interval: self.config.poll_interval,
                shutdown: shutdown_rx,
            }
            .run(),
        );

        let status = child.wait().await;
        let elapsed = started.elapsed();
        debug!(elapsed_ms = elapsed.as_millis() as u64, "Editor exited");

        match &status {
            Ok(status) if status.success() => {
                if elapsed < self.config.quick_exit_threshold {
                    // Launchers like `code` return at once and keep editing in
                    // a detached process; hold the session open until told.
                    self.output.println_direct(QUICK_EXIT_PROMPT);
                    self.wait_for_key_press().await;
                }
            }
            Ok(status) => self.output.println(format!("Editor exited with {}", status)),
            Err(e) => self.output.println(format!("Failed to wait for editor: {}", e)),
        }

        let _ = shutdown_tx.send(()).await;
        let latest = match watcher.await {
            Ok(latest) => latest,
            Err(e) => {
                warn!(error = %e, "File watch task failed");
                self.output.println(format!("File watch task failed: {}", e));
                paste
            }
        };

        if let Err(e) = self.output.end_buffering() {
            warn!(error = %e, "Failed to replay buffered output");
        }

        if let Err(e) = file.close() {
            self.output
                .println(format!("Failed to remove temporary file: {}", e));
        }

        status?;
        Ok(latest)
    }

    async fn wait_for_key_press(&self) {
        let mut reader = self.key_press.lock().await;
        let mut byte = [0u8; 1];
        let _ = reader.read(&mut byte).await;
    }
}

/// Write the paste's plaintext into a fresh temporary file
fn materialize(paste: &Paste) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("pastila-{}-", paste.locator.hash_hex()))
        .tempfile()?;
    file.write_all(paste.content())?;
    file.flush()?;
    Ok(file)
}


/// Polling task state; owns the current paste until it is stopped
struct FileWatch {
    path: PathBuf,
    last: Snapshot,
    current: Paste,
    service: PasteService,
    output: Output,
    poll_interval: Duration,
    shutdown: mpsc::Receiver<()>,
}

impl FileWatch {
    /// Poll until shut down, then hand back the newest paste
    async fn run(mut self) -> Paste {
        loop {
            let stopping = tokio::select! {
                biased;
                _ = self.shutdown.recv() => true,
                _ = tokio::time::sleep(self.poll_interval) => false,
            };

            // One more look after shutdown catches a save made right before exit
            self.poll().await;

            if stopping {
                break;
            }
        }
        self.current
    }

    async fn poll(&mut self) {
        let snapshot = match Snapshot::of(&self.path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Editors that save via rename leave a short gap
                debug!(error = %e, "Temporary file not readable");
                return;
            }
        };

        if !snapshot.changed_from(&self.last) {
            return;
        }
        self.last = snapshot;
        self.save().await;
    }

    async fn save(&mut self) {
        let file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) => {
                self.output
                    .println(format!("Failed to open temporary file: {}", e));
                return;
            }
        };

        let options = WriteOptions::new().with_previous_paste(Some(&self.current));
        match self.service.write(file, &options).await {
            Ok(paste) => {
                self.output.println(paste.url());
                self.current = paste;
            }
            Err(e) => {
                warn!(error = %e, "Failed to save revision");
                self.output.println(e);
            }
        }
    }
}
