//! Execution engine module
//!
//! Main read loop for a listing stream.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - drives pagination, cursor filtering and checkpoint merging
//! - `MessageStream` - the lazy stream of messages a sync produces
//! - Message types for output (Record, State, Log)
//!
//! Pages are fetched one at a time, only when the consumer has drained the
//! messages of the previous page. A sync ends with at most one checkpoint.

mod types;

pub use types::{Message, SyncStats};

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::incremental::{CursorFilter, StateMerger};
use crate::pagination::{Page, PageFetcher, PageToken, PaginationState};
use crate::state::StreamState;
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Type alias for the message stream returned by a sync
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Source of the current time for first checkpoints
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sync engine for one listing stream
pub struct SyncEngine {
    stream: String,
    fetcher: PageFetcher,
    filter: CursorFilter,
    merger: StateMerger,
    prior: Option<StreamState>,
    clock: Clock,
}

impl SyncEngine {
    /// Create an engine for `config`, resuming from `state` if given
    pub fn new(client: Arc<HttpClient>, config: &StreamConfig, state: Option<StreamState>) -> Self {
        let fetcher = PageFetcher::new(
            client,
            &config.path,
            config.query_params(),
            Box::new(config.decoder()),
            Box::new(config.paginator()),
        );

        Self {
            stream: config.name.clone(),
            fetcher,
            filter: config.cursor_filter(state.as_ref()),
            merger: config.state_merger(),
            prior: state,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used for first checkpoints
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Stream name
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Start the sync; nothing is requested until the stream is polled
    pub fn read(self) -> MessageStream {
        let run = SyncRun::new(self);
        Box::pin(stream::try_unfold(run, |mut run| async move {
            loop {
                if let Some(message) = run.pending.pop_front() {
                    return Ok::<_, Error>(Some((message, run)));
                }
                if run.finished {
                    return Ok(None);
                }
                run.advance().await?;
            }
        }))
    }

    /// Run the sync to completion and collect every message
    pub async fn collect(self) -> Result<Vec<Message>> {
        self.read().try_collect().await
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("stream", &self.stream)
            .field("fetcher", &self.fetcher)
            .field("filter", &self.filter)
            .field("has_prior_state", &self.prior.is_some())
            .finish_non_exhaustive()
    }
}

/// Progress of one sync
struct SyncRun {
    engine: SyncEngine,
    pending: VecDeque<Message>,
    next: Option<PageToken>,
    pagination: PaginationState,
    checkpoint: StreamState,
    stats: SyncStats,
    started: Instant,
    finished: bool,
}

impl SyncRun {
    fn new(engine: SyncEngine) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(Message::info(format!(
            "Starting sync for stream: {}",
            engine.stream
        )));

        info!(
            stream = %engine.stream,
            threshold = ?engine.filter.threshold(),
            "Starting sync"
        );

        Self {
            checkpoint: engine.prior.clone().unwrap_or_default(),
            engine,
            pending,
            next: None,
            pagination: PaginationState::new(),
            stats: SyncStats::new(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Fetch and process one page, or finish when pagination is exhausted
    async fn advance(&mut self) -> Result<()> {
        if self.pagination.done {
            self.finish();
            return Ok(());
        }

        if let Some(token) = &self.next {
            self.pagination.claim(token)?;
        }

        let Page { records, next } = self.engine.fetcher.fetch_page(self.next.as_ref()).await?;
        let fetched = records.len();
        self.pagination.add_page(fetched);
        self.stats.add_page(fetched);

        let before = self.stats.records_emitted;
        for record in self.engine.filter.filter(records) {
            let record = record?;
            self.engine
                .merger
                .merge_into(&mut self.checkpoint, &record, (self.engine.clock)())?;
            self.stats.add_record();
            self.pending
                .push_back(Message::record(&self.engine.stream, record));
        }

        debug!(
            stream = %self.engine.stream,
            page = self.pagination.pages,
            fetched,
            emitted = self.stats.records_emitted - before,
            "Processed page"
        );

        match next {
            Some(token) => self.next = Some(token),
            None => {
                self.next = None;
                self.pagination.mark_done();
            }
        }

        Ok(())
    }

    fn finish(&mut self) {
        // With nothing accepted the prior checkpoint is repeated as-is
        let checkpoint = if self.stats.records_emitted > 0 {
            Some(std::mem::take(&mut self.checkpoint))
        } else {
            self.engine.prior.take()
        };

        #[allow(clippy::cast_possible_truncation)]
        self.stats
            .set_duration(self.started.elapsed().as_millis() as u64);

        info!(
            stream = %self.engine.stream,
            pages = self.stats.pages_fetched,
            read = self.stats.records_read,
            emitted = self.stats.records_emitted,
            duration_ms = self.stats.duration_ms,
            "Completed sync"
        );

        self.pending.push_back(Message::info(format!(
            "Completed sync for {}: {} records emitted ({} filtered) in {} pages",
            self.engine.stream,
            self.stats.records_emitted,
            self.stats.records_filtered(),
            self.stats.pages_fetched
        )));

        if let Some(data) = checkpoint {
            self.stats.add_state();
            self.pending
                .push_back(Message::state(&self.engine.stream, data));
        }

        self.finished = true;
    }
}

#[cfg(test)]
mod tests;
