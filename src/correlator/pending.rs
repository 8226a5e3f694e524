// src/correlator/pending.rs

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::{Error, Result};

/// What a settled wait resolves to: the decoded response document, or the
/// failure that ended the exchange.
pub(super) type WaitOutcome = Result<Value>;

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// The protected state is a single optional oneshot sender. There are no
/// invariants spanning multiple fields; the worst outcome of a poisoned
/// lock is one dropped settlement, which the waiter observes as a closed
/// channel. This avoids propagating non-`Send` poison errors across async
/// boundaries.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The single pending-exchange slot.
///
/// At most one wait is armed at any instant; arming while a prior wait is
/// unsettled is a caller error. Settlement is first-writer-wins: whichever
/// of response / transport failure / timeout takes the sender out of the
/// slot first decides the outcome, and every later signal is a no-op.
pub(super) struct PendingWait {
    // ---
    slot: Mutex<Option<oneshot::Sender<WaitOutcome>>>,
}

impl PendingWait {
    // ---

    /// Create an unarmed slot.
    pub fn new() -> Self {
        // ---
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Arm the slot for the next exchange.
    ///
    /// Returns the receiver the caller awaits on, or
    /// [`Error::ExchangeInFlight`] if a prior wait has not settled yet.
    pub fn arm(&self) -> Result<oneshot::Receiver<WaitOutcome>> {
        // ---
        let mut slot = lock_ignore_poison(&self.slot);

        if slot.is_some() {
            return Err(Error::ExchangeInFlight);
        }

        let (tx, rx) = oneshot::channel();
        *slot = Some(tx);
        Ok(rx)
    }

    /// Settle the armed wait with the given outcome.
    ///
    /// Returns true if a waiter was armed and still listening. Signals that
    /// arrive after the slot has already been settled or disarmed are
    /// discarded and return false.
    pub fn settle(&self, outcome: WaitOutcome) -> bool {
        // ---
        let tx = lock_ignore_poison(&self.slot).take();

        match tx {
            // Send fails if the receiver was dropped (the wait timed out
            // between our take and this send); the outcome is discarded.
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Clear the slot without delivering an outcome.
    ///
    /// Used for timeout cleanup, so a late response finds the slot empty
    /// instead of answering a future request.
    pub fn disarm(&self) -> bool {
        // ---
        lock_ignore_poison(&self.slot).take().is_some()
    }
}
