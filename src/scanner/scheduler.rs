//! Scan scheduler - the batch loop driving a scan
//!
//! Each iteration dispatches one contiguous batch of page indices to parallel
//! fetch/extract tasks, waits for all of them, and then, on this task only:
//! - Folds the results into the scan state in page-index order
//! - Records and announces any watch-list matches
//! - Advances the checkpoint, or counts the batch towards the idle limit

use crate::config::Config;
use crate::notify::{build_notifier, format_match_message, Notifier};
use crate::scanner::extractor::{LinkTextExtractor, PageExtractor};
use crate::scanner::fetcher::{build_http_client, FetchResult, PageFetcher, RetryPolicy};
use crate::scanner::rate_limiter::RateLimiter;
use crate::scanner::report::ScanReport;
use crate::state::{AddressSet, PageOutcome, PageResult, ScanPhase, ScanState};
use crate::storage::{
    load_previously_seen, load_watchlist, CheckpointStore, CsvMatchLog, FileCheckpointStore,
    MatchRecord, MatchSink, SeenLog,
};
use crate::ScanError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Page the scan starts from when no checkpoint exists
pub const FIRST_PAGE: u64 = 1;

/// What one batch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Page indices dispatched
    pub pages: Range<u64>,

    /// Pages that contributed new addresses
    pub productive_pages: Vec<u64>,

    /// Match records written
    pub matches: usize,

    /// Checkpoint persisted after the batch, if any
    pub checkpoint: Option<u64>,
}

/// Everything the scanner writes to
pub struct ScanSinks {
    pub checkpoint: Box<dyn CheckpointStore>,
    pub matches: Box<dyn MatchSink>,
    pub seen_log: Option<SeenLog>,
    pub notifier: Box<dyn Notifier>,
}

/// Drives a scan from the checkpoint until the idle limit is reached
pub struct Scanner {
    threads: u64,
    idle_batch_limit: u32,
    fetcher: Arc<PageFetcher>,
    extractor: Arc<dyn PageExtractor>,
    state: ScanState,
    sinks: ScanSinks,
    cursor: u64,
    phase: ScanPhase,
    report: ScanReport,
}

impl Scanner {
    /// Assembles a scanner from already constructed parts
    ///
    /// The starting page is read from the checkpoint store.
    pub fn new(
        threads: u32,
        idle_batch_limit: u32,
        fetcher: PageFetcher,
        extractor: Arc<dyn PageExtractor>,
        state: ScanState,
        sinks: ScanSinks,
    ) -> Result<Self, ScanError> {
        let cursor = sinks.checkpoint.load()?.unwrap_or(FIRST_PAGE).max(FIRST_PAGE);

        Ok(Self {
            threads: u64::from(threads.max(1)),
            idle_batch_limit: idle_batch_limit.max(1),
            fetcher: Arc::new(fetcher),
            extractor,
            state,
            sinks,
            cursor,
            phase: ScanPhase::Running,
            report: ScanReport::new(cursor),
        })
    }

    /// Builds a scanner from configuration
    ///
    /// This method:
    /// 1. Loads the watch-list
    /// 2. Rebuilds the seen-address set from the match log (and seen log)
    /// 3. Opens the match log, seen log and checkpoint
    /// 4. Builds the HTTP client, rate limiter and notifier
    pub fn from_config(config: &Config) -> Result<Self, ScanError> {
        let files = &config.files;
        let seen_path = files.seen_path.as_deref().map(Path::new);

        let watchlist = load_watchlist(Path::new(&files.watchlist_path))?;
        if watchlist.is_empty() {
            tracing::warn!(
                "Watch-list {} is empty; no matches can be reported",
                files.watchlist_path
            );
        }

        let previously_seen = load_previously_seen(Path::new(&files.matches_path), seen_path)?;
        let state = ScanState::new(watchlist, previously_seen);
        tracing::info!(
            "Loaded {} watch-list addresses, {} previously seen",
            state.watchlist().len(),
            state.seen_count()
        );

        let client = build_http_client(&config.fetcher)?;
        let limiter = Arc::new(RateLimiter::new(config.scanner.max_requests_per_second));
        let fetcher = PageFetcher::new(
            client.clone(),
            config.scanner.base_url.clone(),
            limiter,
            RetryPolicy::from(&config.fetcher),
        );
        let extractor = Arc::new(LinkTextExtractor::new(config.extractor.link_pattern.clone()));

        let sinks = ScanSinks {
            checkpoint: Box::new(FileCheckpointStore::new(&files.checkpoint_path)),
            matches: Box::new(CsvMatchLog::open(&files.matches_path)?),
            seen_log: seen_path.map(SeenLog::open).transpose()?,
            notifier: build_notifier(client, config.telegram.as_ref()),
        };
        tracing::info!("Match notifications via {}", sinks.notifier.name());

        Self::new(
            config.scanner.threads,
            config.scanner.idle_batch_limit,
            fetcher,
            extractor,
            state,
            sinks,
        )
    }

    /// Next page index to dispatch
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Runs batches until the scan halts
    ///
    /// Per-page failures never end the run; only storage errors do.
    pub async fn run(&mut self) -> Result<ScanReport, ScanError> {
        tracing::info!(
            "Starting scan at page {} with {} workers",
            self.cursor,
            self.threads
        );

        while !self.phase.is_halted() {
            self.run_batch().await?;
        }

        self.report.finished_at = Some(Utc::now());
        self.report.phase = self.phase;

        tracing::info!(
            "Scan halted after {} idle batches; next page {}",
            self.idle_batch_limit,
            self.cursor
        );
        if !self.report.failed_pages.is_empty() {
            tracing::warn!(
                "{} page(s) failed and will not be revisited: {:?}",
                self.report.failed_pages.len(),
                self.report.failed_pages
            );
        }

        Ok(self.report.clone())
    }

    /// Runs a single batch starting at the cursor
    pub async fn run_batch(&mut self) -> Result<BatchSummary, ScanError> {
        let pages = self.cursor..self.cursor + self.threads;
        self.report.batches += 1;
        tracing::debug!("Dispatching pages {}..{}", pages.start, pages.end);

        let fetched = self.fetch_batch(pages.clone()).await;

        let mut productive = Vec::new();
        for (page, addresses) in fetched {
            let Some(addresses) = addresses else {
                self.report.failed_pages.insert(page);
                continue;
            };
            self.report.failed_pages.remove(&page);
            self.report.pages_fetched += 1;

            let result = self.state.apply(page, addresses);
            match result.outcome() {
                PageOutcome::Empty => tracing::debug!("Page {} has no addresses", page),
                PageOutcome::NothingNew => {
                    tracing::debug!("Page {} has no new addresses", page)
                }
                PageOutcome::New => productive.push(result),
            }
        }

        if productive.is_empty() {
            let streak = self.phase.idle_streak() + 1;
            self.phase = self.phase.after_idle_batch(self.idle_batch_limit);
            self.cursor = pages.end;
            tracing::info!(
                "Pages {}..{} had nothing new ({}/{} idle batches)",
                pages.start,
                pages.end,
                streak,
                self.idle_batch_limit
            );
            return Ok(BatchSummary {
                pages,
                productive_pages: Vec::new(),
                matches: 0,
                checkpoint: None,
            });
        }

        self.phase = self.phase.after_productive_batch();
        let matches = self.commit(&productive).await?;

        let next = productive
            .iter()
            .map(|result| result.page + 1)
            .max()
            .unwrap_or(pages.end)
            .max(self.cursor);
        self.sinks.checkpoint.save(next)?;
        self.cursor = next;
        self.report.checkpoint = Some(next);

        tracing::info!(
            "Pages {}..{}: {} with new addresses, {} match(es); checkpoint {}",
            pages.start,
            pages.end,
            productive.len(),
            matches,
            next
        );

        Ok(BatchSummary {
            pages,
            productive_pages: productive.iter().map(|result| result.page).collect(),
            matches,
            checkpoint: Some(next),
        })
    }

    /// Fetches and extracts every page in `pages` in parallel
    ///
    /// Returns one entry per page in page order; `None` marks a failed fetch.
    async fn fetch_batch(&self, pages: Range<u64>) -> BTreeMap<u64, Option<AddressSet>> {
        let mut outcomes: BTreeMap<u64, Option<AddressSet>> =
            pages.clone().map(|page| (page, None)).collect();
        let mut tasks = JoinSet::new();

        for page in pages {
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            tasks.spawn(async move {
                let addresses = match fetcher.fetch(page).await {
                    FetchResult::Success { body, .. } => Some(extractor.extract(&body)),
                    FetchResult::HttpError {
                        status_code,
                        attempts,
                    } => {
                        tracing::warn!(
                            "Page {} unavailable (status {} after {} attempt(s))",
                            page,
                            status_code,
                            attempts
                        );
                        None
                    }
                    FetchResult::NetworkError { error, attempts } => {
                        tracing::warn!(
                            "Page {} request failed after {} attempt(s): {}",
                            page,
                            attempts,
                            error
                        );
                        None
                    }
                };
                (page, addresses)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((page, addresses)) => {
                    outcomes.insert(page, addresses);
                }
                Err(e) => tracing::error!("Page worker failed: {}", e),
            }
        }

        outcomes
    }

    /// Records, logs and announces the productive pages of one batch
    ///
    /// Seen-log lines are written only after every match row of the batch
    /// is durable.
    ///
    /// Returns the number of match records written.
    async fn commit(&mut self, productive: &[PageResult]) -> Result<usize, ScanError> {
        let mut written = 0;

        for result in productive {
            self.report.pages_with_new_addresses += 1;

            if !result.has_matches() {
                continue;
            }

            tracing::info!(
                "Page {} has {} matching address(es)",
                result.page,
                result.matches.len()
            );
            for address in &result.matches {
                self.sinks
                    .matches
                    .append(&MatchRecord::new(result.page, address.as_str()))?;
                written += 1;
            }
            self.sinks.matches.flush()?;

            self.sinks
                .notifier
                .notify(&format_match_message(result))
                .await;
        }

        if let Some(seen_log) = self.sinks.seen_log.as_mut() {
            for result in productive {
                seen_log.append_all(&result.newly_observed)?;
            }
            seen_log.flush()?;
        }

        self.report.matches_recorded += written as u64;
        Ok(written)
    }
}
