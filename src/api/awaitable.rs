//! Future adapter over a pooled completion source.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::api::error::SourceError;
use crate::api::handle::Handle;
use crate::api::pool::CompletionPool;

/// Future that resolves when its completion source reaches a terminal state.
///
/// The awaitable is the single subscriber of its cycle: it registers the
/// task's waker as the continuation and, once woken, consumes the result,
/// which returns the slot to the pool. Dropping it before completion
/// force-disposes the cycle.
///
/// Borrowing the pool keeps the awaitable on the pool's own sequence, so it
/// is `!Send`; producers on other threads use a [`Completer`](crate::Completer).
#[must_use = "futures do nothing unless polled"]
pub struct Awaitable<'a, T: Send + 'static> {
    pool: &'a CompletionPool<T>,
    handle: Handle<T>,
    finished: bool,
}

impl<'a, T: Send + 'static> Awaitable<'a, T> {
    pub(crate) fn new(pool: &'a CompletionPool<T>, handle: Handle<T>) -> Self {
        Self {
            pool,
            handle,
            finished: false,
        }
    }

    /// The handle being awaited.
    pub fn handle(&self) -> Handle<T> {
        self.handle
    }
}

impl<T: Send + 'static> Future for Awaitable<'_, T> {
    type Output = Result<T, SourceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.finished {
            ps_violation!(PS006, "handle {:?}", self.handle);
        }

        let slot = self.pool.slot(self.handle);
        if !slot.poll_terminal(self.handle.version, cx.waker()) {
            return Poll::Pending;
        }

        self.finished = true;
        Poll::Ready(self.pool.consume(self.handle))
    }
}

impl<T: Send + 'static> Drop for Awaitable<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.pool.dispose(self.handle);
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for Awaitable<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Awaitable")
            .field("handle", &self.handle)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::CancelCause;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Wake, Waker};

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_waker() -> (Arc<CountingWaker>, Waker) {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        (counter, waker)
    }

    #[test]
    fn wakes_on_completion_then_recycles() {
        let pool = CompletionPool::<u32>::new();
        let handle = pool.create();
        let (counter, waker) = counting_waker();
        let mut cx = Context::from_waker(&waker);

        let mut wait = pool.awaitable(handle);
        assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());

        pool.completer(handle).try_set_result(5);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        match Pin::new(&mut wait).poll(&mut cx) {
            Poll::Ready(Ok(value)) => assert_eq!(value, 5),
            other => panic!("unexpected poll result: {:?}", other),
        }
        drop(wait);
        assert_eq!(pool.in_flight_count(), 0);
        assert!(!pool.is_live(handle));
    }

    #[test]
    #[should_panic(expected = "PS006")]
    fn polling_after_completion_panics() {
        let pool = CompletionPool::<u32>::new();
        let handle = pool.create();
        pool.try_set_canceled(handle, CancelCause::External);
        let (_counter, waker) = counting_waker();
        let mut cx = Context::from_waker(&waker);

        let mut wait = pool.awaitable(handle);
        assert!(Pin::new(&mut wait).poll(&mut cx).is_ready());
        let _ = Pin::new(&mut wait).poll(&mut cx);
    }

    #[test]
    #[should_panic(expected = "PS001")]
    fn awaitable_and_callback_conflict() {
        let pool = CompletionPool::<u32>::new();
        let handle = pool.create();
        pool.register_continuation(handle, |_: ()| {}, ());

        let (_counter, waker) = counting_waker();
        let mut cx = Context::from_waker(&waker);
        let mut wait = pool.awaitable(handle);
        let _ = Pin::new(&mut wait).poll(&mut cx);
    }
}
