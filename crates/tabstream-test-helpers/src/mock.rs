//! Mock source adapters for testing flow control.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tabstream::{LineSink, PauseGate, SourceAdapter};
use tokio::task::JoinHandle;

/// A flow-control call received by [`ScriptedSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    Pause,
    Resume,
    Shutdown,
}

/// Source adapter driven by the test: records every pause/resume request and
/// can feed a scripted list of lines while honoring them.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    gate: PauseGate,
    events: Mutex<Vec<SourceEvent>>,
    shut_down: AtomicBool,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SourceEvent> {
        self.events.lock().clone()
    }

    pub fn pause_count(&self) -> usize {
        self.count(SourceEvent::Pause)
    }

    pub fn resume_count(&self) -> usize {
        self.count(SourceEvent::Resume)
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn count(&self, kind: SourceEvent) -> usize {
        self.events.lock().iter().filter(|e| **e == kind).count()
    }

    /// Spawn a producer that pushes `lines` one at a time, waiting while
    /// paused, then signals closure. Resolves to the number of lines pushed.
    pub fn feed<R>(self: &Arc<Self>, sink: LineSink<R>, lines: Vec<String>) -> JoinHandle<usize>
    where
        R: Send + 'static,
    {
        let source = Arc::clone(self);
        tokio::spawn(async move {
            let mut pushed = 0usize;
            sink.begin();
            for line in lines {
                if !source.gate.wait_resumed().await || source.is_shut_down() {
                    break;
                }
                if !sink.on_line(line) {
                    break;
                }
                pushed += 1;
                tokio::task::yield_now().await;
            }
            sink.on_closed();
            pushed
        })
    }

    /// Push `lines` back to back, ignoring pause requests, as a source with
    /// lines already in flight would. Returns the number accepted.
    pub fn burst<R>(sink: &LineSink<R>, lines: impl IntoIterator<Item = String>) -> usize
    where
        R: Send + 'static,
    {
        lines.into_iter().take_while(|line| sink.on_line(line.clone())).count()
    }
}

impl SourceAdapter for ScriptedSource {
    fn pause(&self) {
        self.events.lock().push(SourceEvent::Pause);
        self.gate.pause();
    }

    fn resume(&self) {
        self.events.lock().push(SourceEvent::Resume);
        self.gate.resume();
    }

    fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            self.events.lock().push(SourceEvent::Shutdown);
        }
        // Wake a producer parked on the gate so it can observe shutdown.
        self.gate.resume();
    }
}
