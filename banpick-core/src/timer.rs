//! Per-lobby phase countdowns
//!
//! At most one countdown is pending per lobby: arming replaces any pending
//! timer, so a stale countdown can never double-fire. Expiry is delivered as
//! a [`TimerExpiry`] message on an mpsc channel, which the gateway consumes
//! through the same dispatch path as client actions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::lobby::model::Phase;

/// Selecting-phase countdown (5 minutes)
pub const SELECTION_TIMER: Duration = Duration::from_millis(300_000);

/// Banning-phase countdown (3 minutes)
pub const BAN_TIMER: Duration = Duration::from_millis(180_000);

/// Expiry notification delivered on the timer channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerExpiry {
    pub code: String,
    pub phase: Phase,
}

struct TimerEntry {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Countdown scheduler for lobby phases
///
/// Entries are generation-tagged: a sleeping task only delivers its expiry if
/// its generation is still the registered one, so re-arming while an old task
/// races to fire cannot produce a duplicate expiry.
pub struct PhaseTimers {
    entries: Arc<Mutex<HashMap<String, TimerEntry>>>,
    next_generation: AtomicU64,
    tx: mpsc::UnboundedSender<TimerExpiry>,
}

impl PhaseTimers {
    /// Create the scheduler and the receiving end of its expiry channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerExpiry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                entries: Arc::new(Mutex::new(HashMap::new())),
                next_generation: AtomicU64::new(0),
                tx,
            },
            rx,
        )
    }

    /// Countdown length for a phase, None for phases without one
    pub fn duration_for(phase: Phase) -> Option<Duration> {
        match phase {
            Phase::Selecting => Some(SELECTION_TIMER),
            Phase::Banning => Some(BAN_TIMER),
            Phase::Waiting | Phase::Completed => None,
        }
    }

    /// (Re)arm the countdown for a lobby, cancelling any pending one
    pub async fn arm(&self, code: &str, phase: Phase) {
        let Some(duration) = Self::duration_for(phase) else {
            warn!(code, %phase, "no countdown defined for phase, cancelling instead");
            self.cancel(code).await;
            return;
        };

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let entries = Arc::clone(&self.entries);
        let tx = self.tx.clone();
        let task_code = code.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            {
                let mut entries = entries.lock().await;
                match entries.get(&task_code) {
                    Some(entry) if entry.generation == generation => {
                        entries.remove(&task_code);
                    }
                    // Superseded or cancelled while sleeping
                    _ => return,
                }
            }
            debug!(code = %task_code, %phase, "phase timer expired");
            let _ = tx.send(TimerExpiry {
                code: task_code,
                phase,
            });
        });

        let mut entries = self.entries.lock().await;
        if let Some(previous) = entries.insert(
            code.to_string(),
            TimerEntry { generation, handle },
        ) {
            previous.handle.abort();
        }
    }

    /// Cancel any pending countdown for a lobby; no-op if none
    pub async fn cancel(&self, code: &str) {
        if let Some(entry) = self.entries.lock().await.remove(code) {
            entry.handle.abort();
        }
    }

    /// Number of pending countdowns
    pub async fn pending(&self) -> usize {
        self.entries.lock().await.len()
    }
}
