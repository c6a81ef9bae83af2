//! Polling listeners.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::listener::ListenerRegistration;

/// Shortest gap between polls. `tokio::time::interval` panics on zero.
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Run `fetch` every `interval` and pass changed results to `deliver`.
///
/// Transport failures are retried on the next tick. Any other error is
/// delivered once and ends the task. Removing the registration aborts it.
pub(crate) fn spawn_poll<T, F, Fut, D>(interval: Duration, fetch: F, deliver: D) -> ListenerRegistration
where
    T: PartialEq + Clone + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<T>> + Send + 'static,
    D: Fn(StoreResult<T>) + Send + Sync + 'static,
{
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            deliver(Err(StoreError::NoRuntime));
            return ListenerRegistration::noop();
        }
    };

    let interval = interval.max(MIN_POLL_INTERVAL);
    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<T> = None;

        loop {
            ticker.tick().await;
            match fetch().await {
                Ok(snapshot) => {
                    if last.as_ref() != Some(&snapshot) {
                        last = Some(snapshot.clone());
                        deliver(Ok(snapshot));
                    }
                }
                Err(StoreError::Http(e)) => {
                    warn!(error = %e, "poll failed, retrying");
                }
                Err(e) => {
                    debug!(error = %e, "poll listener stopped");
                    deliver(Err(e));
                    break;
                }
            }
        }
    });

    ListenerRegistration::new(move || task.abort())
}
