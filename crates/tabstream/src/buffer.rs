//! Flow-controlled record buffer
//!
//! The buffer sits between a push-driven [`SourceAdapter`] and the pull-driven
//! [`RecordStream`](crate::RecordStream). Lines arrive through a [`LineSink`],
//! are parsed by the record model and queued in arrival order. When the queue
//! reaches capacity the source is paused; the consumer resumes it once
//! occupancy falls to the low-water mark or the queue runs dry.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::config::{MalformedPolicy, StreamConfig};
use crate::error::{MalformedRecordError, StreamError, StreamResult};
use crate::lifecycle::{IterationStatus, Lifecycle, SourceState};
use crate::model::RecordModel;
use crate::source::SourceAdapter;
use crate::stats::StreamStats;

/// One queued delivery: a record, or an error delivered in its place.
pub(crate) enum Entry<R> {
    Record(R),
    Failed(StreamError),
}

impl<R> Entry<R> {
    pub(crate) fn into_result(self) -> StreamResult<R> {
        match self {
            Entry::Record(record) => Ok(record),
            Entry::Failed(err) => Err(err),
        }
    }
}

/// Outcome of a non-blocking dequeue attempt.
pub(crate) enum Take<R> {
    Ready(Entry<R>),
    Exhausted,
    Empty,
}

struct Inner<R> {
    queue: VecDeque<Entry<R>>,
    lifecycle: Lifecycle,
    paused: bool,
    line_number: u64,
    stats: StreamStats,
}

/// State shared by the producer-side sink and the consumer.
pub(crate) struct Shared<R> {
    inner: Mutex<Inner<R>>,
    ready: Notify,
    model: Arc<dyn RecordModel<Record = R>>,
    source: Arc<dyn SourceAdapter>,
    capacity: usize,
    resume_threshold: usize,
    policy: MalformedPolicy,
}

impl<R> Shared<R> {
    pub(crate) fn source(&self) -> &Arc<dyn SourceAdapter> {
        &self.source
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wake-up notification for a waiting consumer.
    pub(crate) fn ready(&self) -> &Notify {
        &self.ready
    }
}

impl<R: Send + 'static> Shared<R> {
    pub(crate) fn new(
        model: Arc<dyn RecordModel<Record = R>>,
        source: Arc<dyn SourceAdapter>,
        config: &StreamConfig,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(config.max_capacity),
                lifecycle: Lifecycle::new(),
                paused: false,
                line_number: 0,
                stats: StreamStats::default(),
            }),
            ready: Notify::new(),
            model,
            source,
            capacity: config.max_capacity,
            resume_threshold: config.resume_threshold(),
            policy: config.on_malformed,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub(crate) fn state(&self) -> SourceState {
        self.inner.lock().lifecycle.state()
    }

    pub(crate) fn status(&self) -> IterationStatus {
        let inner = self.inner.lock();
        inner.lifecycle.status(inner.queue.len())
    }

    pub(crate) fn stats(&self) -> StreamStats {
        self.inner.lock().stats
    }

    /// Dequeue the oldest entry without waiting, resuming the source when
    /// occupancy has fallen far enough.
    ///
    /// An empty queue always asks the source to resume, whether or not this
    /// buffer paused it. Adapter calls happen under the lock so a pause and a
    /// resume can never be applied out of order.
    pub(crate) fn try_take(&self) -> Take<R> {
        let mut inner = self.inner.lock();

        let taken = match inner.queue.pop_front() {
            Some(entry) => {
                inner.stats.delivered = inner.stats.delivered.saturating_add(1);
                Take::Ready(entry)
            }
            None if inner.lifecycle.status(0).is_exhausted() => return Take::Exhausted,
            None => Take::Empty,
        };

        if inner.lifecycle.is_halted() {
            return taken;
        }

        let buffered = inner.queue.len();
        if inner.paused && buffered <= self.resume_threshold {
            inner.paused = false;
            inner.stats.resumes = inner.stats.resumes.saturating_add(1);
            debug!(buffered, "resuming source");
            self.source.resume();
        } else if buffered == 0 {
            self.source.resume();
        }
        taken
    }

    /// Stop producing and wake the consumer. Used on drop and cancellation.
    pub(crate) fn shutdown(&self) {
        self.source.shutdown();
        self.ready.notify_one();
    }

    /// Queue an entry and pause the source on the transition to full.
    fn push(&self, inner: &mut Inner<R>, entry: Entry<R>) {
        inner.queue.push_back(entry);
        let buffered = inner.queue.len();
        inner.stats.observe_occupancy(buffered);

        if buffered == self.capacity && !inner.paused {
            inner.paused = true;
            inner.stats.pauses = inner.stats.pauses.saturating_add(1);
            debug!(buffered, capacity = self.capacity, "buffer full, pausing source");
            self.source.pause();
        }
    }
}

/// Producer-side handle: the push callback surface of the buffer.
pub struct LineSink<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for LineSink<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: Send + 'static> LineSink<R> {
    pub(crate) fn new(shared: Arc<Shared<R>>) -> Self {
        Self { shared }
    }

    /// Mark the source as started. Implied by the first line or closure.
    pub fn begin(&self) {
        if self.shared.inner.lock().lifecycle.activate() {
            debug!("source active");
        }
    }

    /// Deliver one line. Blank lines are counted and dropped.
    ///
    /// Never suspends. Returns `false` once the stream no longer accepts
    /// lines (closed, halted by a fail-fast error); the producer should stop.
    pub fn on_line(&self, line: String) -> bool {
        let line_number = {
            let mut inner = self.shared.inner.lock();
            inner.lifecycle.activate();
            if !inner.lifecycle.accepts_lines() {
                return false;
            }
            inner.line_number = inner.line_number.saturating_add(1);
            inner.stats.lines_received = inner.stats.lines_received.saturating_add(1);
            if line.is_empty() {
                inner.stats.blank_lines = inner.stats.blank_lines.saturating_add(1);
                return true;
            }
            inner.line_number
        };

        let parsed = self.shared.model.parse_line(&line);

        let mut inner = self.shared.inner.lock();
        if !inner.lifecycle.accepts_lines() {
            return false;
        }

        let (entry, halt) = match parsed {
            Ok(record) => {
                inner.stats.records_parsed = inner.stats.records_parsed.saturating_add(1);
                (Entry::Record(record), false)
            }
            Err(reason) => {
                inner.stats.malformed_lines = inner.stats.malformed_lines.saturating_add(1);
                let err = MalformedRecordError {
                    line_number,
                    line,
                    reason,
                };
                match self.shared.policy {
                    MalformedPolicy::Skip => {
                        warn!(line_number, error = %err.reason, "skipping malformed line");
                        return true;
                    }
                    MalformedPolicy::Surface => {
                        (Entry::Failed(StreamError::Malformed(err)), false)
                    }
                    MalformedPolicy::FailFast => {
                        warn!(line_number, error = %err.reason, "malformed line, halting stream");
                        (Entry::Failed(StreamError::Malformed(err)), true)
                    }
                }
            }
        };

        self.shared.push(&mut inner, entry);
        if halt {
            inner.lifecycle.halt();
            self.shared.source.pause();
        }
        drop(inner);

        self.shared.ready.notify_one();
        !halt
    }

    /// Deliver a read failure. It is queued like a record and does not close
    /// the stream; the adapter is expected to signal closure afterwards.
    pub fn on_error(&self, err: io::Error) {
        let mut inner = self.shared.inner.lock();
        inner.lifecycle.activate();
        if !inner.lifecycle.accepts_lines() {
            return;
        }
        warn!(error = %err, "source read failed");
        self.shared.push(&mut inner, Entry::Failed(StreamError::Io(err)));
        drop(inner);
        self.shared.ready.notify_one();
    }

    /// One-shot closure signal: no further lines will arrive.
    pub fn on_closed(&self) {
        let closed = self.shared.inner.lock().lifecycle.close();
        if closed {
            debug!("source closed");
        }
        self.shared.ready.notify_one();
    }

    /// Whether the stream still accepts lines.
    pub fn is_open(&self) -> bool {
        self.shared.inner.lock().lifecycle.accepts_lines()
    }
}
