//! Per-room timers.
//!
//! Each [`TimerKind`] has at most one pending timer. Scheduling a kind that
//! is already pending aborts the old task first. A timer task only posts a
//! [`TimerFired`] back to its room; the room then calls
//! [`TimerTable::claim`], which rejects firings that were superseded after
//! they were already queued.

use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::game::entities::PlayerId;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TimerKind {
    TurnTimeout,
    BotTurn,
    RoundTransition,
    /// One per disconnected seat
    DisconnectGrace(PlayerId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

struct PendingTimer {
    generation: u64,
    task: JoinHandle<()>,
}

pub struct TimerTable {
    sender: mpsc::Sender<TimerFired>,
    pending: HashMap<TimerKind, PendingTimer>,
    next_generation: u64,
}

impl TimerTable {
    pub fn new(sender: mpsc::Sender<TimerFired>) -> Self {
        Self {
            sender,
            pending: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Start a timer of `kind`, replacing any pending one of the same kind.
    /// Returns the new timer's generation.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) -> u64 {
        self.cancel(&kind);

        let generation = self.next_generation;
        self.next_generation += 1;

        let sender = self.sender.clone();
        let fired = TimerFired {
            kind: kind.clone(),
            generation,
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The room may already be gone.
            let _ = sender.send(fired).await;
        });

        debug!("Scheduled {:?} #{} in {:?}", kind, generation, delay);
        self.pending.insert(kind, PendingTimer { generation, task });
        generation
    }

    /// Abort a pending timer. Returns whether one was pending.
    pub fn cancel(&mut self, kind: &TimerKind) -> bool {
        match self.pending.remove(kind) {
            Some(timer) => {
                timer.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.pending.drain() {
            timer.task.abort();
        }
    }

    /// Accept a firing if it belongs to the timer currently pending for its
    /// kind, removing that timer. Stale firings are refused.
    pub fn claim(&mut self, fired: &TimerFired) -> bool {
        match self.pending.get(&fired.kind) {
            Some(timer) if timer.generation == fired.generation => {
                self.pending.remove(&fired.kind);
                true
            }
            _ => {
                debug!("Ignoring stale {:?} #{}", fired.kind, fired.generation);
                false
            }
        }
    }

    pub fn is_pending(&self, kind: &TimerKind) -> bool {
        self.pending.contains_key(kind)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for TimerTable {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
