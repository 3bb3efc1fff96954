//! Line sources: the producer side of a record stream
//!
//! A source pushes lines into a [`LineSink`] and can be paused and resumed by
//! the buffer. [`ReaderSource`] adapts any [`AsyncRead`] (file, socket, stdin)
//! by splitting it into lines on a spawned task.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::buffer::LineSink;
use crate::error::{StreamError, StreamResult};

/// Flow control surface the buffer drives.
///
/// `pause` and `resume` are called with the buffer lock held, from inside
/// the producer's own push callback as well as from the consumer. They must
/// not re-enter the sink and should return promptly. `resume` may arrive
/// while already running.
pub trait SourceAdapter: Send + Sync + 'static {
    /// Stop pushing lines until resumed.
    fn pause(&self);

    /// Continue pushing lines.
    fn resume(&self);

    /// Stop producing for good. Called when the stream is dropped, cancelled
    /// or halted.
    fn shutdown(&self) {}
}

/// Byte input for a record stream.
pub enum Input {
    /// A file opened at construction
    Path(PathBuf),
    /// Any ready-made byte stream
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl Input {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path(path.into())
    }

    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Open the input, checking that a path exists.
    pub(crate) fn open(self) -> StreamResult<Box<dyn AsyncRead + Send + Unpin>> {
        match self {
            Input::Path(path) => open_file(&path),
            Input::Reader(reader) => Ok(reader),
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Reader(_) => f.debug_tuple("Reader").field(&"..").finish(),
        }
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

fn open_file(path: &Path) -> StreamResult<Box<dyn AsyncRead + Send + Unpin>> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StreamError::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(StreamError::Io(e)),
    };

    if metadata.is_dir() {
        return Err(StreamError::config(format!(
            "{} is a directory",
            path.display()
        )));
    }

    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StreamError::SourceNotFound(path.to_path_buf()),
        _ => StreamError::Io(e),
    })?;

    Ok(Box::new(tokio::fs::File::from_std(file)))
}

/// Pause flag a producer task waits on.
#[derive(Debug, Clone)]
pub struct PauseGate {
    tx: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn pause(&self) {
        self.tx.send_replace(true);
    }

    pub fn resume(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspend while paused. Returns `false` if the gate was torn down.
    pub async fn wait_resumed(&self) -> bool {
        let mut rx = self.tx.subscribe();
        rx.wait_for(|paused| !*paused).await.is_ok()
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Source adapter that splits an [`AsyncRead`] into lines on its own task.
#[derive(Debug, Default)]
pub struct ReaderSource {
    gate: PauseGate,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ReaderSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// Spawn the line pump on `handle`, feeding `sink`.
    pub(crate) fn start<R>(
        &self,
        handle: &Handle,
        reader: Box<dyn AsyncRead + Send + Unpin>,
        sink: LineSink<R>,
    ) where
        R: Send + 'static,
    {
        let task = handle.spawn(pump(reader, self.gate.clone(), sink));
        *self.task.lock() = Some(task);
    }
}

impl SourceAdapter for ReaderSource {
    fn pause(&self) {
        self.gate.pause();
    }

    fn resume(&self) {
        self.gate.resume();
    }

    fn shutdown(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

async fn pump<R>(reader: Box<dyn AsyncRead + Send + Unpin>, gate: PauseGate, sink: LineSink<R>)
where
    R: Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    sink.begin();

    loop {
        if !gate.wait_resumed().await {
            break;
        }

        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!(len = line.len(), "line received");
                if !sink.on_line(line) {
                    debug!("sink stopped accepting lines");
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                sink.on_error(e);
                break;
            }
        }
    }

    sink.on_closed();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_is_source_not_found() {
        let result = Input::path("/definitely/not/here.tsv").open();
        assert!(matches!(result, Err(StreamError::SourceNotFound(_))));
    }

    #[test]
    fn test_directory_path_is_rejected() {
        let dir = std::env::temp_dir();
        let result = Input::path(dir).open();
        assert!(matches!(result, Err(StreamError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_pause_gate_blocks_until_resumed() {
        let gate = PauseGate::new();
        assert!(!gate.is_paused());
        assert!(gate.wait_resumed().await);

        gate.pause();
        assert!(gate.is_paused());

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_resumed().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        gate.resume();
        assert!(matches!(waiter.await, Ok(true)));
    }
}
