//! Monitor registry and readiness gate
//!
//! The collector owns one status slot per registered field monitor and
//! recomputes the global gate whenever any slot changes. Recomputation is
//! synchronous and atomic: the slot write, the conjunction over all slots,
//! the summary construction, and the observer call happen inside one
//! critical section, so observers always see a summary consistent with the
//! slot snapshot that produced it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::domain::events::{FieldStatus, GateSummary};
use crate::domain::messages;

/// Receiver of gate recomputation results.
///
/// Called on every recomputation, not only on ready/blocked flips; consumers
/// of this contract are idempotent. Implementations run inside the
/// collector's critical section and must return quickly; they must not call
/// back into the collector or its handles.
pub trait GateObserver: Send + Sync {
    /// All registered fields have passed; the downstream action may proceed.
    fn gate_ready(&self, summary: &GateSummary);

    /// At least one field is not in a passed state.
    fn gate_blocked(&self, summary: &GateSummary);
}

struct SlotState {
    label: String,
    status: FieldStatus,
}

#[derive(Default)]
struct CollectorInner {
    slots: Vec<SlotState>,
    last_ready: Option<bool>,
}

impl CollectorInner {
    fn summarize(&self) -> GateSummary {
        let blocking: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| slot.status != FieldStatus::Passed)
            .map(|slot| slot.label.clone())
            .collect();
        let ready = blocking.is_empty();

        GateSummary {
            ready,
            summary: if ready {
                messages::GATE_READY_SUMMARY
            } else {
                messages::GATE_BLOCKED_SUMMARY
            }
            .to_string(),
            blocking,
            decided_at: Utc::now(),
        }
    }
}

fn lock_inner(inner: &Mutex<CollectorInner>) -> MutexGuard<'_, CollectorInner> {
    // A poisoned slot table is still well-formed; keep serving it.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Aggregates N field monitors into one ready/not-ready gate.
///
/// The gate is the plain conjunction over all registered slots: ready holds
/// exactly when every slot is `Passed`. There is no quorum policy; optional
/// fields reach `Passed` vacuously on empty input. Registration is a
/// setup-time operation, before edits start flowing; a slot registered later
/// starts `Idle` and can only close the gate.
#[derive(Clone)]
pub struct ValidationCollector {
    inner: Arc<Mutex<CollectorInner>>,
    observer: Arc<dyn GateObserver>,
}

impl ValidationCollector {
    /// Creates a collector that reports every gate recomputation to the
    /// given observer.
    #[must_use]
    pub fn new(observer: Arc<dyn GateObserver>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CollectorInner::default())),
            observer,
        }
    }

    /// Registers one field and returns the handle its monitor pushes status
    /// changes through. The slot starts `Idle`, which holds the gate closed
    /// until the field passes.
    pub fn register(&self, label: impl Into<String>) -> MonitorHandle {
        let label = label.into();
        let mut inner = lock_inner(&self.inner);
        inner.slots.push(SlotState {
            label: label.clone(),
            status: FieldStatus::Idle,
        });
        let slot = inner.slots.len() - 1;
        drop(inner);

        tracing::debug!(label = %label, slot, "registered field monitor");
        MonitorHandle {
            inner: Arc::clone(&self.inner),
            observer: Arc::clone(&self.observer),
            slot,
        }
    }

    /// Number of registered fields.
    #[must_use]
    pub fn monitored_fields(&self) -> usize {
        lock_inner(&self.inner).slots.len()
    }

    /// Whether every registered field has passed. True for an empty
    /// collector (vacuous conjunction).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        lock_inner(&self.inner)
            .slots
            .iter()
            .all(|slot| slot.status == FieldStatus::Passed)
    }

    /// Fresh summary of the current gate state. Pure read: recomputing twice
    /// with no intervening status change yields the same decision.
    #[must_use]
    pub fn gate_state(&self) -> GateSummary {
        lock_inner(&self.inner).summarize()
    }
}

/// Push channel from one field monitor into its collector slot.
#[derive(Clone)]
pub struct MonitorHandle {
    inner: Arc<Mutex<CollectorInner>>,
    observer: Arc<dyn GateObserver>,
    slot: usize,
}

impl MonitorHandle {
    /// Records the monitor's new status and recomputes the gate.
    ///
    /// The recomputation always runs against the authoritative slot
    /// snapshot, never a cached tally, and the observer is invoked before
    /// any other status change can interleave.
    pub fn update(&self, status: FieldStatus) {
        let mut inner = lock_inner(&self.inner);
        inner.slots[self.slot].status = status;
        let summary = inner.summarize();

        if inner.last_ready != Some(summary.ready) {
            tracing::info!(
                ready = summary.ready,
                blocking = ?summary.blocking,
                "🚦 gate state changed"
            );
        }
        inner.last_ready = Some(summary.ready);

        if summary.ready {
            self.observer.gate_ready(&summary);
        } else {
            self.observer.gate_blocked(&summary);
        }
    }
}

/// Bridges gate recomputations onto an unbounded tokio channel, exposing
/// them as a stream for async consumers (UI push loops, test harnesses).
pub struct GateEventChannel {
    tx: mpsc::UnboundedSender<GateSummary>,
}

impl GateEventChannel {
    /// Creates the observer half plus the stream of summaries it forwards.
    #[must_use]
    pub fn unbounded() -> (Self, UnboundedReceiverStream<GateSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    fn forward(&self, summary: &GateSummary) {
        if self.tx.send(summary.clone()).is_err() {
            tracing::trace!("gate event receiver dropped, summary discarded");
        }
    }
}

impl GateObserver for GateEventChannel {
    fn gate_ready(&self, summary: &GateSummary) {
        self.forward(summary);
    }

    fn gate_blocked(&self, summary: &GateSummary) {
        self.forward(summary);
    }
}
