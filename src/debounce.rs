//! Delay-coalescing wrappers for high-frequency calls
//!
//! Each wrapper holds at most one pending timer. A call cancels the pending
//! timer and arms a new one with its own arguments, so only the last call of
//! a burst runs. An invocation that has already started is never cancelled.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::warn;

type AsyncFn<A> = Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct Pending {
    generation: u64,
    timer: Option<AbortHandle>,
    waiters: Vec<oneshot::Sender<()>>,
}

struct Shared<A> {
    f: AsyncFn<A>,
    delay: Duration,
    pending: Mutex<Pending>,
}

/// Debounced async function; see [`debounce_async`]
pub struct DebouncedAsync<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for DebouncedAsync<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Wrap an async function so bursts of calls collapse into one invocation
///
/// The future returned by [`DebouncedAsync::call`] resolves once the
/// invocation that eventually runs has completed. Futures of superseded calls
/// resolve at the same moment without their arguments ever being used.
pub fn debounce_async<A, F, Fut>(f: F, delay: Duration) -> DebouncedAsync<A>
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    DebouncedAsync {
        shared: Arc::new(Shared {
            f: Arc::new(move |args| -> BoxFuture<'static, ()> { Box::pin(f(args)) }),
            delay,
            pending: Mutex::new(Pending::default()),
        }),
    }
}

impl<A: Send + 'static> DebouncedAsync<A> {
    /// Schedule `f(args)` after the delay, replacing any pending call
    ///
    /// Outside a tokio runtime the call is dropped with a warning and the
    /// returned future resolves immediately. A pending call is kept.
    pub fn call(&self, args: A) -> impl Future<Output = ()> + Send + use<A> {
        let (tx, rx) = oneshot::channel();

        match Handle::try_current() {
            Err(e) => {
                warn!(error = %e, "No async runtime, dropping debounced call");
                drop(tx);
            }
            Ok(runtime) => {
                let mut pending = lock(&self.shared.pending);
                if let Some(timer) = pending.timer.take() {
                    timer.abort();
                }
                pending.generation += 1;
                pending.waiters.push(tx);

                let generation = pending.generation;
                let shared = Arc::clone(&self.shared);
                let task = runtime.spawn(async move {
                    tokio::time::sleep(shared.delay).await;

                    let waiters = {
                        let mut pending = lock(&shared.pending);
                        if pending.generation != generation {
                            return;
                        }
                        pending.timer = None;
                        std::mem::take(&mut pending.waiters)
                    };

                    (shared.f)(args).await;

                    for waiter in waiters {
                        let _ = waiter.send(());
                    }
                });
                pending.timer = Some(task.abort_handle());
            }
        }

        async move {
            let _ = rx.await;
        }
    }

    /// Drop the pending call, if any; its waiters resolve immediately
    pub fn cancel(&self) {
        let mut pending = lock(&self.shared.pending);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.generation += 1;
        pending.waiters.clear();
    }

    /// Whether a call is waiting for its timer
    pub fn is_pending(&self) -> bool {
        lock(&self.shared.pending).timer.is_some()
    }
}

/// Debounced sync function; see [`debounce`]
pub struct Debounced<A> {
    inner: DebouncedAsync<A>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Wrap a function so that only the last call of a burst runs, `delay` after it
pub fn debounce<A, F>(f: F, delay: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        inner: debounce_async(
            move |args| {
                f(args);
                async {}
            },
            delay,
        ),
    }
}

impl<A: Send + 'static> Debounced<A> {
    pub fn call(&self, args: A) {
        drop(self.inner.call(args));
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }
}

// The guarded data stays consistent across a panic, so poisoning is ignored.
fn lock(pending: &Mutex<Pending>) -> std::sync::MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
