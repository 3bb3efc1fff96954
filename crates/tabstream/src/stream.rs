//! Pull iterator over a flow-controlled record buffer

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::buffer::{LineSink, Shared, Take};
use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};
use crate::lifecycle::{IterationStatus, SourceState};
use crate::model::{ColumnModel, ColumnSpec, RecordModel, Row};
use crate::source::{Input, ReaderSource, SourceAdapter};
use crate::stats::StreamStats;

/// Option-driven construction for column-model streams.
///
/// Exactly one of `model`/`columns` and an `input` must be supplied.
#[derive(Default)]
pub struct StreamOptions {
    /// Pre-built record model
    pub model: Option<Arc<dyn RecordModel<Record = Row>>>,
    /// Columns for the default [`ColumnModel`]
    pub columns: Option<Vec<ColumnSpec>>,
    /// Byte input
    pub input: Option<Input>,
    /// Buffer and parsing configuration
    pub config: StreamConfig,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pre-built record model
    pub fn model(mut self, model: impl RecordModel<Record = Row>) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Build the default model from columns
    pub fn columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Read from a file
    pub fn path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.input = Some(Input::path(path));
        self
    }

    /// Read from a ready-made byte stream
    pub fn reader(mut self, reader: impl tokio::io::AsyncRead + Send + Unpin + 'static) -> Self {
        self.input = Some(Input::reader(reader));
        self
    }

    /// Set the input
    pub fn input(mut self, input: Input) -> Self {
        self.input = Some(input);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the buffer capacity
    pub fn max_capacity(mut self, capacity: usize) -> Self {
        self.config.max_capacity = capacity;
        self
    }

    fn resolve_model(&mut self) -> StreamResult<Arc<dyn RecordModel<Record = Row>>> {
        match (self.model.take(), self.columns.take()) {
            (Some(model), None) => Ok(model),
            (None, Some(columns)) => Ok(Arc::new(ColumnModel::new(
                columns,
                self.config.separator,
            )?)),
            (Some(_), Some(_)) => Err(StreamError::config(
                "`model` and `columns` are mutually exclusive",
            )),
            (None, None) => Err(StreamError::config(
                "either `model` or `columns` must be supplied",
            )),
        }
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("model", &self.model.as_ref().map(|_| ".."))
            .field("columns", &self.columns)
            .field("input", &self.input)
            .field("config", &self.config)
            .finish()
    }
}

/// Pull-based, backpressured sequence of records from a line source.
///
/// `next` takes `&mut self`, so at most one call can be in flight per stream.
/// Dropping the stream stops the source.
pub struct RecordStream<R> {
    shared: Arc<Shared<R>>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
    finished: bool,
}

impl RecordStream<Row> {
    /// Open a column-model stream from options.
    ///
    /// Must be called inside a tokio runtime; the file (if any) is opened and
    /// the line pump spawned before returning.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Configuration`] when neither or both of `model` and
    ///   `columns` are given, no input is given, or the config is invalid
    /// - [`StreamError::SourceNotFound`] when the input path does not exist
    pub fn open(mut options: StreamOptions) -> StreamResult<Self> {
        options.config.validate()?;
        let model = options.resolve_model()?;
        let input = options.input.take().ok_or_else(|| {
            StreamError::config("either a file path or a reader must be supplied")
        })?;
        Self::spawn(model, input, options.config)
    }
}

impl<R: Send + 'static> RecordStream<R> {
    /// Open a stream over a custom record model.
    ///
    /// # Errors
    ///
    /// See [`RecordStream::open`].
    pub fn with_model<M>(model: M, input: Input, config: StreamConfig) -> StreamResult<Self>
    where
        M: RecordModel<Record = R>,
    {
        config.validate()?;
        Self::spawn(Arc::new(model), input, config)
    }

    /// Connect a caller-driven source. The returned sink is the push surface;
    /// `adapter` receives pause/resume requests.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn attach<M>(
        model: M,
        adapter: Arc<dyn SourceAdapter>,
        config: StreamConfig,
    ) -> StreamResult<(Self, LineSink<R>)>
    where
        M: RecordModel<Record = R>,
    {
        config.validate()?;
        Ok(Self::connect(Arc::new(model), adapter, &config))
    }

    fn spawn(
        model: Arc<dyn RecordModel<Record = R>>,
        input: Input,
        config: StreamConfig,
    ) -> StreamResult<Self> {
        let handle = Handle::try_current().map_err(|_| {
            StreamError::config("record streams must be created inside a tokio runtime")
        })?;
        let reader = input.open()?;

        let source = Arc::new(ReaderSource::new());
        let (stream, sink) = Self::connect(model, source.clone(), &config);
        sink.begin();
        source.start(&handle, reader, sink);
        Ok(stream)
    }

    fn connect(
        model: Arc<dyn RecordModel<Record = R>>,
        adapter: Arc<dyn SourceAdapter>,
        config: &StreamConfig,
    ) -> (Self, LineSink<R>) {
        let shared = Arc::new(Shared::new(model, adapter, config));
        let sink = LineSink::new(Arc::clone(&shared));
        let stream = Self {
            shared,
            cancel: CancellationToken::new(),
            timeout: config.timeout(),
            finished: false,
        };
        (stream, sink)
    }

    /// Next record, an error delivered in a record's place, or `None` once
    /// the source has closed and the buffer is drained.
    ///
    /// Suspends while the buffer is empty. After `None` is returned every
    /// later call returns `None` as well.
    pub async fn next(&mut self) -> Option<StreamResult<R>> {
        if self.finished {
            return None;
        }

        loop {
            if self.cancel.is_cancelled() {
                self.finish();
                return None;
            }

            match self.shared.try_take() {
                Take::Ready(entry) => return Some(entry.into_result()),
                Take::Exhausted => {
                    self.finish();
                    return None;
                }
                Take::Empty => {}
            }

            if let Err(err) = self.wait().await {
                if matches!(err, StreamError::Cancelled) {
                    self.finish();
                }
                return Some(Err(err));
            }
        }
    }

    async fn wait(&self) -> StreamResult<()> {
        // Notify keeps a permit for a wake-up that raced ahead of us, so a
        // push between `try_take` and here is not lost.
        let notified = self.shared.ready().notified();
        let cancelled = self.cancel.cancelled();

        match self.timeout {
            Some(limit) => tokio::select! {
                woken = tokio::time::timeout(limit, notified) => {
                    woken.map_err(|_| StreamError::timeout(limit))
                }
                () = cancelled => Err(StreamError::Cancelled),
            },
            None => tokio::select! {
                () = notified => Ok(()),
                () = cancelled => Err(StreamError::Cancelled),
            },
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            debug!(stats = ?self.shared.stats(), "record stream finished");
            self.shared.shutdown();
        }
    }

    /// Derived iteration status.
    pub fn status(&self) -> IterationStatus {
        if self.finished {
            return IterationStatus::Exhausted;
        }
        self.shared.status()
    }

    pub fn source_state(&self) -> SourceState {
        self.shared.state()
    }

    /// Records (and queued errors) awaiting delivery.
    pub fn buffered(&self) -> usize {
        self.shared.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn stats(&self) -> StreamStats {
        self.shared.stats()
    }

    /// Token that, when cancelled, makes a pending or future `next()` give up.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain into a vector, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error delivered by the stream.
    pub async fn collect_records(mut self) -> StreamResult<Vec<R>> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }

    /// Adapt into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = StreamResult<R>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|item| (item, stream))
        })
    }
}

impl<R> Drop for RecordStream<R> {
    fn drop(&mut self) {
        self.shared.source().shutdown();
    }
}

impl<R> fmt::Debug for RecordStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("capacity", &self.shared.capacity())
            .field("timeout", &self.timeout)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
