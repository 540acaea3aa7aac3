use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::cache::UrlCache;
use crate::config::CheckerConfig;
use crate::outcome::{CheckOutcome, CheckState, ProbeMetadata};
use crate::playlist::{Playlist, PlaylistItem};
use crate::probe::{classify_with_state, extract_reason, ProbeCommand, ProbeRunner, ProcessRunner};

/// Where an item ended up after a batch check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Online { metadata: ProbeMetadata },
    Offline { reason: String },
    Duplicate,
}

impl From<CheckOutcome> for ItemStatus {
    fn from(outcome: CheckOutcome) -> Self {
        match outcome {
            CheckOutcome::Success { metadata } => Self::Online { metadata },
            CheckOutcome::Failure { reason } => Self::Offline { reason },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    /// Position of the item in the source playlist.
    pub index: usize,
    pub item: PlaylistItem,
    #[serde(flatten)]
    pub status: ItemStatus,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub duplicates: usize,
}

impl CheckSummary {
    pub fn from_reports(reports: &[ItemReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Default::default()
        };
        for r in reports {
            match r.status {
                ItemStatus::Online { .. } => summary.online += 1,
                ItemStatus::Offline { .. } => summary.offline += 1,
                ItemStatus::Duplicate => summary.duplicates += 1,
            }
        }
        summary
    }
}

/// Verifies playlist items by running the probing tool against each URL.
pub struct Checker {
    config: CheckerConfig,
    runner: Arc<dyn ProbeRunner>,
}

impl Checker {
    pub fn new(config: CheckerConfig, runner: Arc<dyn ProbeRunner>) -> Self {
        Self { config, runner }
    }

    pub fn from_config(config: CheckerConfig) -> Self {
        Self::new(config, Arc::new(ProcessRunner))
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single item. Every failure mode is returned as [`CheckOutcome::Failure`].
    pub async fn check(&self, item: &PlaylistItem) -> CheckOutcome {
        self.check_with_state(item).await.1
    }

    /// Like [`Checker::check`], also returning the terminal state the check reached.
    pub async fn check_with_state(&self, item: &PlaylistItem) -> (CheckState, CheckOutcome) {
        let mut state = CheckState::Pending;
        let command = ProbeCommand::build(item, &self.config);

        debug!("EXECUTING: \"{}\"", command.to_command_line());
        advance(&mut state, CheckState::Running, &item.url);

        let (terminal, outcome) = match self.runner.run(&command, self.config.timeout).await {
            Ok(stdout) => classify_with_state(&stdout),
            Err(e) => {
                let terminal = if e.is_timeout() {
                    CheckState::TimedOut
                } else {
                    CheckState::ProcessFailed
                };
                let reason = extract_reason(&e.to_string(), &item.url);
                (terminal, CheckOutcome::Failure { reason })
            }
        };
        advance(&mut state, terminal, &item.url);

        (state, outcome)
    }

    /// Check every item of `playlist`, reporting repeated URLs as duplicates.
    ///
    /// Reports come back in playlist order.
    pub async fn check_playlist(&self, playlist: &Playlist, cache: &UrlCache) -> Vec<ItemReport> {
        self.check_playlist_with_progress(playlist, cache, |_| {}).await
    }

    /// Like [`Checker::check_playlist`], calling `on_report` as each item finishes.
    pub async fn check_playlist_with_progress<F>(
        &self,
        playlist: &Playlist,
        cache: &UrlCache,
        on_report: F,
    ) -> Vec<ItemReport>
    where
        F: Fn(&ItemReport) + Sync,
    {
        let concurrency = self.config.max_concurrent_checks.max(1);
        info!(items = playlist.len(), concurrency, "Checking playlist");

        let on_report = &on_report;
        // Claiming happens while the stream is driven in playlist order, so the
        // first occurrence of a URL is the one that gets probed.
        let checks = playlist.items.iter().enumerate().map(|(index, item)| {
            let fresh = cache.claim(item);
            async move {
                let status = if fresh {
                    ItemStatus::from(self.check(item).await)
                } else {
                    debug!(url = %item.url, "Skipping duplicate");
                    ItemStatus::Duplicate
                };
                let report = ItemReport {
                    index,
                    item: item.clone(),
                    status,
                    checked_at: Utc::now(),
                };
                on_report(&report);
                report
            }
        });

        let mut reports: Vec<ItemReport> = stream::iter(checks)
            .buffer_unordered(concurrency)
            .collect()
            .await;
        reports.sort_by_key(|r| r.index);

        let summary = CheckSummary::from_reports(&reports);
        info!(
            total = summary.total,
            online = summary.online,
            offline = summary.offline,
            duplicates = summary.duplicates,
            "Playlist check finished"
        );
        reports
    }
}

fn advance(state: &mut CheckState, next: CheckState, url: &str) {
    debug_assert!(state.can_transition_to(next), "{} -> {}", state, next);
    trace!(url, from = %state, to = %next, "Check state");
    *state = next;
}
