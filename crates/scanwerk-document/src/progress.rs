// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting and cancellation for page-by-page batch runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use scanwerk_core::ProgressState;

type Observer = Box<dyn Fn(ProgressState) + Send + Sync>;

/// Counts completed items of a run. The counter is atomic, so one tracker can
/// be shared by parallel workers.
///
/// An optional observer is called with the new state after every `advance`.
#[derive(Default)]
pub struct BatchProgressTracker {
    completed: AtomicUsize,
    total: AtomicUsize,
    observer: Option<Observer>,
}

impl BatchProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that pushes every new state to `observer`.
    pub fn with_observer(observer: impl Fn(ProgressState) + Send + Sync + 'static) -> Self {
        Self {
            observer: Some(Box::new(observer)),
            ..Self::default()
        }
    }

    /// Start a new run of `total` items.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
    }

    /// Record one finished item. Saturates at `total`.
    pub fn advance(&self) -> ProgressState {
        let total = self.total.load(Ordering::SeqCst);
        let previous = self
            .completed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |done| {
                (done < total).then_some(done + 1)
            })
            .unwrap_or(total);
        let state = ProgressState {
            completed: (previous + 1).min(total),
            total,
        };
        if let Some(observer) = &self.observer {
            observer(state);
        }
        state
    }

    pub fn state(&self) -> ProgressState {
        ProgressState {
            completed: self.completed.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for BatchProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProgressTracker")
            .field("state", &self.state())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Cooperative cancellation flag checked between pages/images.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
