// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared server state: the conversion engine and per-session counters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use convertdmc_document::ConversionEngine;
use tracing::debug;
use uuid::Uuid;

use crate::config::WebConfig;

/// Sessions remembered at once; the least recently seen is dropped beyond this.
pub const MAX_SESSIONS: usize = 10_000;

/// Successful conversions per browser session, kept in memory only.
#[derive(Debug)]
pub struct SessionCounters {
    inner: Mutex<Counts>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Counts {
    by_session: HashMap<Uuid, Entry>,
    /// Bumped on every touch; orders entries by recency.
    clock: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u64,
    last_seen: u64,
}

impl Default for SessionCounters {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionCounters {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Counts::default()),
            capacity: capacity.max(1),
        }
    }

    /// Conversions completed by `session` so far.
    pub fn get(&self, session: Uuid) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_session
            .get(&session)
            .map_or(0, |entry| entry.count)
    }

    /// Record one more success for `session`, returning the new count.
    pub fn increment(&self, session: Uuid) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.clock += 1;
        let now = inner.clock;

        if !inner.by_session.contains_key(&session) && inner.by_session.len() >= self.capacity {
            let oldest = inner
                .by_session
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                inner.by_session.remove(&oldest);
                debug!(session = %oldest, "Session counter evicted");
            }
        }

        let entry = inner.by_session.entry(session).or_insert(Entry {
            count: 0,
            last_seen: now,
        });
        entry.count += 1;
        entry.last_seen = now;
        entry.count
    }
}

/// Handed to every handler via axum `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<ConversionEngine>,
    pub sessions: Arc<SessionCounters>,
    pub config: Arc<WebConfig>,
}

impl AppState {
    pub fn new(config: WebConfig) -> Self {
        Self {
            engine: Arc::new(ConversionEngine::new(config.engine.clone())),
            sessions: Arc::new(SessionCounters::default()),
            config: Arc::new(config),
        }
    }
}
