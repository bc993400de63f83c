//! Bridge from callback-completed blocking work to an awaitable result.
//!
//! [`pending`] returns a [`Pending`] future and a [`Resolver`]. The resolver
//! can be cloned and moved into worker threads or progress hooks; the first
//! `resolve` call delivers the value and every later one is ignored. When the
//! last resolver is dropped without resolving (the job returned early,
//! panicked, or was never started), the pending side completes with
//! [`BridgeError::Abandoned`], so an awaiting task is never left suspended.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

/// The operation ended without delivering a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("operation ended without resolving its result")]
    Abandoned,
}

/// Creates a linked pending result and its resolver.
pub fn pending<T>() -> (Pending<T>, Resolver<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Pending { rx },
        Resolver {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
    )
}

/// Awaitable side of the bridge. Suspends the task, never the thread.
#[derive(Debug)]
#[must_use = "a pending result does nothing unless awaited"]
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T, BridgeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map_err(|_| BridgeError::Abandoned)
    }
}

/// Resolving side of the bridge. Safe to call from any thread.
#[derive(Debug)]
pub struct Resolver<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Resolver<T> {
    /// Delivers `value` if nothing was delivered yet.
    ///
    /// Returns `true` for the call that consumed the slot (even if the
    /// awaiting side has since gone away) and `false` for every later call,
    /// whose value is dropped.
    pub fn resolve(&self, value: T) -> bool {
        let sender = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        match sender {
            Some(tx) => {
                if tx.send(value).is_err() {
                    log::debug!("Pending result dropped before resolution was delivered");
                }
                true
            }
            None => false,
        }
    }

    /// Whether a value has already been delivered.
    pub fn is_resolved(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}
