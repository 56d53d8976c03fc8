//! Cycle scheduler.
//!
//! ```text
//!   not live at start ──► one cycle ──► stop
//!   live ──► tick ──► cycle ──► end passed? ──yes──► stop
//!              ▲                    │ no
//!              └────────────────────┘      (cancel ──► stop at any tick)
//! ```
//!
//! Each cycle is awaited before the next tick is taken, so cycles never
//! overlap. The cycle that first observes the declared end is the terminal
//! fetch-and-render.

use chrono::Utc;
use std::{sync::Arc, time::Duration, time::Instant};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::derive;
use crate::fetch::SnapshotFetcher;
use crate::render::{Board, RenderSink};
use crate::session::SessionContext;
use crate::store::StateStore;
use crate::summary::summarize;
use crate::types::Timestamp;

pub struct Tracker {
    store: StateStore,
    fetcher: Arc<dyn SnapshotFetcher>,
    sinks: Vec<Arc<dyn RenderSink>>,
    ctx: SessionContext,
    poll_interval: Duration,
}

impl Tracker {
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        sinks: Vec<Arc<dyn RenderSink>>,
        ctx: SessionContext,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store: StateStore::new(),
            fetcher,
            sinks,
            ctx,
            poll_interval,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Switch to another session. All competitor state is discarded.
    pub fn begin_session(&mut self, ctx: SessionContext) {
        info!(
            from = self.ctx.session_key(),
            to = ctx.session_key(),
            "switching session; store reset"
        );
        self.store.reset();
        self.ctx = ctx;
    }

    /// One fetch → merge → derive → summarize → paint pass.
    ///
    /// A total fetch failure skips merge and derivation but still paints a
    /// board with no rows, so the header clock keeps moving.
    pub async fn run_cycle(&mut self, live: bool, now: Timestamp) -> Board {
        let started = Instant::now();
        let session_key = self.ctx.session_key();
        let snapshot = self.fetcher.fetch_snapshot(session_key).await;

        let (rows, track_status) = match &snapshot {
            Some(snap) => {
                let report = self.store.merge(snap, now);
                if !report.retired.is_empty() {
                    info!(session_key, retired = ?report.retired, "competitors retired");
                }
                debug!(
                    session_key,
                    seen = report.seen,
                    created = report.created,
                    tracked = self.store.len(),
                    "merged snapshot"
                );
                (derive::compute(&self.store), snap.track_status.as_slice())
            }
            None => {
                warn!(session_key, "no data this cycle; painting empty board");
                (Vec::new(), &[][..])
            }
        };

        let summary = summarize(track_status, &rows, &self.ctx, live, now);
        let board = Board::new(self.ctx.header(), summary, &rows);
        for sink in &self.sinks {
            sink.paint(&board);
        }

        info!(
            session_key,
            rows = board.rows.len(),
            lap = %board.laps_label,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cycle complete"
        );
        board
    }

    /// Poll until the session ends or `cancel` flips to `true`.
    pub async fn run(&mut self, mut cancel: watch::Receiver<bool>) {
        let session_key = self.ctx.session_key();
        if !self.ctx.is_live_at(Utc::now()) {
            info!(session_key, "session not live; single refresh");
            self.run_cycle(false, Utc::now()).await;
            return;
        }

        info!(
            session_key,
            poll_ms = self.poll_interval.as_millis() as u64,
            "session live; polling"
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let board = self.run_cycle(true, Utc::now()).await;
            if board.summary.session_ended {
                info!(session_key, "declared end passed; polling stopped");
                return;
            }
        }

        info!(session_key, "polling cancelled");
    }
}
