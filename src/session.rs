//! Per-conversation wizard state for multi-step chat flows.
//!
//! The chat transport walks operators through wizards (new order, cancel
//! reason, restock input). The steps between messages live here: one
//! [`Session`] per conversation id, holding a tagged-union current step.
//! This is UI state, not core state - it exists only in process memory and
//! is evicted after [`SessionStore::ttl`] of inactivity, so an abandoned
//! wizard simply restarts from the menu. Eviction is lazy (on access) with
//! an explicit [`SessionStore::evict_expired`] sweep for callers that want
//! to bound memory between accesses.

use crate::entities::Product;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default idle lifetime of a wizard before it is forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Current step of a conversation's wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    /// Picking the sales channel for a new order
    ChoosingChannel,
    /// Picking the product
    ChoosingProduct {
        channel: String,
    },
    /// Picking the duration preset
    ChoosingDuration {
        channel: String,
        product_id: String,
    },
    /// Waiting for the operator to type the buyer id
    AwaitingBuyerId {
        channel: String,
        product: Product,
        duration_days: i64,
    },
    /// Waiting for a cancellation reason
    AwaitingCancelReason {
        order_id: String,
    },
    /// Collecting restock identity lines until the operator finishes
    CollectingRestock {
        product: Product,
        lines: Vec<String>,
    },
}

#[derive(Debug, Clone)]
struct Session {
    step: WizardStep,
    touched: Instant,
}

/// In-memory wizard state keyed by conversation id.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<i64, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    /// Store with the given idle TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Idle lifetime after which a wizard is forgotten.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replaces the conversation's current step and refreshes its TTL.
    pub fn set(&self, conversation: i64, step: WizardStep) {
        let mut sessions = self.lock();
        sessions.insert(
            conversation,
            Session {
                step,
                touched: Instant::now(),
            },
        );
    }

    /// Current step, if the wizard exists and has not idled out. Expired
    /// entries are dropped on the spot.
    #[must_use]
    pub fn get(&self, conversation: i64) -> Option<WizardStep> {
        let mut sessions = self.lock();
        match sessions.get(&conversation) {
            Some(session) if session.touched.elapsed() < self.ttl => Some(session.step.clone()),
            Some(_) => {
                sessions.remove(&conversation);
                None
            }
            None => None,
        }
    }

    /// Removes and returns the conversation's step (wizard completion).
    #[must_use]
    pub fn take(&self, conversation: i64) -> Option<WizardStep> {
        let mut sessions = self.lock();
        sessions
            .remove(&conversation)
            .filter(|session| session.touched.elapsed() < self.ttl)
            .map(|session| session.step)
    }

    /// Forgets one conversation's wizard.
    pub fn clear(&self, conversation: i64) {
        self.lock().remove(&conversation);
    }

    /// Appends restock lines when the conversation is collecting them.
    /// Returns the new line count, or `None` when no restock wizard is
    /// active.
    pub fn push_restock_lines(&self, conversation: i64, new_lines: &[String]) -> Option<usize> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&conversation)?;
        if session.touched.elapsed() >= self.ttl {
            sessions.remove(&conversation);
            return None;
        }
        if let WizardStep::CollectingRestock { lines, .. } = &mut session.step {
            lines.extend(new_lines.iter().cloned());
            session.touched = Instant::now();
            Some(lines.len())
        } else {
            None
        }
    }

    /// Drops every idled-out wizard; returns how many were evicted.
    pub fn evict_expired(&self) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| session.touched.elapsed() < self.ttl);
        before - sessions.len()
    }

    /// Live (non-expired counting is lazy) session count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sessions are stored at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Session>> {
        // UI-state mutex; a poisoned lock just means a panicked handler,
        // and dropping the wizard state is the right recovery.
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
