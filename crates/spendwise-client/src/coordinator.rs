//! Single-flight token refresh.
//!
//! When several requests hit a `401` at the same moment they must not each
//! spend the refresh token. The coordinator keeps at most one refresh in
//! flight: the first caller starts it, everyone arriving while it runs
//! joins it, and all of them observe the same outcome.
//!
//! ```text
//!   caller A ──┐
//!   caller B ──┼──→ [in_flight: Shared<refresh task>] ──→ SessionManager::refresh()
//!   caller C ──┘            (cleared when the task ends)
//! ```
//!
//! The refresh runs on its own Tokio task. Dropping every caller does not
//! cancel it, so the store still ends up with the new token (or cleared).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use spendwise_session::{SessionError, SessionManager, TokenStore};
use spendwise_transport::HttpTransport;

type RefreshOutcome = Result<String, SessionError>;
type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;
type Slot = Arc<Mutex<Option<InFlight>>>;

/// Deduplicates concurrent calls to [`SessionManager::refresh`].
///
/// Cloning is cheap and clones share the in-flight slot, so hand one to
/// every component that may need a refresh.
pub struct RefreshCoordinator<T: HttpTransport, S: TokenStore> {
    manager: Arc<SessionManager<T, S>>,
    in_flight: Slot,
}

impl<T: HttpTransport, S: TokenStore> Clone for RefreshCoordinator<T, S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T: HttpTransport, S: TokenStore> RefreshCoordinator<T, S> {
    pub fn new(manager: Arc<SessionManager<T, S>>) -> Self {
        Self {
            manager,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// The session manager refreshes are delegated to.
    pub fn manager(&self) -> &Arc<SessionManager<T, S>> {
        &self.manager
    }

    /// `true` while a refresh is running.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Returns a fresh access token, starting a refresh or joining the one
    /// already running.
    ///
    /// # Errors
    /// Whatever [`SessionManager::refresh`] failed with, identical for every
    /// joined caller. [`SessionError::RefreshAborted`] if the refresh task
    /// itself died.
    pub async fn request_refresh(&self) -> Result<String, SessionError> {
        self.join_or_start().await
    }

    fn join_or_start(&self) -> InFlight {
        let mut slot = lock(&self.in_flight);

        if let Some(flight) = slot.as_ref() {
            tracing::debug!("joining in-flight refresh");
            return flight.clone();
        }

        tracing::debug!("starting refresh");
        let manager = Arc::clone(&self.manager);
        let clear = ClearOnDrop(Arc::clone(&self.in_flight));

        // The slot lock is held until the flight is stored, so the task
        // cannot clear it before it has been filled.
        let task = tokio::spawn(async move {
            let _clear = clear;
            manager.refresh().await
        });

        let flight = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "refresh task aborted");
                    Err(SessionError::RefreshAborted(e.to_string()))
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(flight.clone());
        flight
    }
}

/// Empties the in-flight slot when the refresh task finishes, including
/// when it panics.
struct ClearOnDrop(Slot);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        lock(&self.0).take();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
