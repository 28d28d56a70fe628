//! Cooperative cancellation for provider calls
//!
//! A [`Context`] couples a shared cancellation signal with an optional
//! deadline. Providers race their store calls against [`Context::done`], and
//! watch tasks stop forwarding once it resolves.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ConfigError;

/// Cancellation signal plus optional deadline.
///
/// All clones (including those produced by [`Context::with_timeout`] and
/// [`Context::with_deadline`]) share one signal: cancelling any of them
/// cancels all of them.
#[derive(Clone, Debug)]
pub struct Context {
    cancel: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled unless [`Context::cancel`] is called.
    pub fn background() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancel: Arc::new(tx),
            deadline: None,
        }
    }

    /// Derive a context that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that also expires at `deadline`.
    ///
    /// An earlier deadline already present on `self` is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            cancel: Arc::clone(&self.cancel),
            deadline: Some(deadline),
        }
    }

    /// Mark the context cancelled.
    ///
    /// Returns `true` the first time the signal flips, `false` afterwards.
    pub fn cancel(&self) -> bool {
        self.cancel.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error the context currently reports, if it is done.
    pub fn err(&self) -> Option<ConfigError> {
        if self.is_cancelled() {
            return Some(ConfigError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ConfigError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ConfigError {
        let mut rx = self.cancel.subscribe();
        // The sender outlives this future, so wait_for only returns once the flag is set.
        let cancelled = async move {
            let _ = rx.wait_for(|cancelled| *cancelled).await;
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = cancelled => ConfigError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ConfigError::DeadlineExceeded,
            },
            None => {
                cancelled.await;
                ConfigError::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
