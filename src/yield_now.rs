//! Scheduler yield used to break channel ping-pong starvation.
//!
//! Two cooperative tasks that only ever complete each other's channel
//! operations inline can monopolize a single-threaded executor: every poll
//! makes progress, so the run loop never gets back to other tasks or I/O.
//! Channel and select operations therefore yield to the scheduler once per
//! call, unless the thread-wide yield generation advanced during the call
//! (something else already gave the executor a turn), or the channel/select
//! was marked unconstrained.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

thread_local! {
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// Returns the current yield generation for this thread.
///
/// The counter advances (wrapping) every time a [`yield_now`] future — or
/// the implicit yield inside a channel or select operation — resumes after
/// giving the scheduler a turn.
pub fn yield_count() -> u64 {
    GENERATION.with(Cell::get)
}

pub(crate) fn advance_yield_count() {
    GENERATION.with(|g| g.set(g.get().wrapping_add(1)));
}

/// Yields to the scheduler once.
///
/// The returned future returns `Pending` exactly once, waking itself
/// immediately so the executor re-queues the task behind its siblings.
///
/// # Examples
///
/// ```
/// use taskchan::{yield_count, yield_now};
///
/// let before = yield_count();
/// futures::executor::block_on(yield_now());
/// assert_ne!(yield_count(), before);
/// ```
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            advance_yield_count();
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
