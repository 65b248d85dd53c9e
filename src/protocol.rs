//! The waiter protocol connecting channels to suspended operations.
//!
//! A channel queue holds *waiters*: one-shot completion slots registered on
//! behalf of a suspended send, receive, or select operation. The channel
//! drives them through the two traits below. Plain `send`/`recv` futures and
//! select cases both implement them, and custom schedulers can too.
//!
//! Waiter methods are invoked while the channel's internal state is
//! borrowed, so implementations must not call back into the channel (or
//! into a select that might reach the channel); they should only record the
//! outcome and wake their task.

use std::rc::Rc;

/// Outcome of asking a queued sender for its message.
pub enum Fulfill<T> {
    /// The message to deliver. The waiter has recorded success and woken
    /// its task.
    Msg(T),

    /// The waiter was already completed elsewhere; skip it.
    Stale,
}

/// A queued send operation.
///
/// Registered via [`Channel::add_sender`](crate::Channel::add_sender); the
/// channel calls [`fulfill`](Sender::fulfill) when a receiver or buffer slot
/// becomes available, or [`fail`](Sender::fail) if the channel closes first.
pub trait Sender<T> {
    /// Claims the message for delivery.
    ///
    /// Returns [`Fulfill::Stale`] if the operation was completed elsewhere
    /// (for example, a sibling case of the same select already fired).
    fn fulfill(&self) -> Fulfill<T>;

    /// The channel closed before the message could be delivered.
    fn fail(&self);

    /// Returns `true` if the waiter can no longer deliver and should be
    /// dropped from the queue.
    fn is_stale(&self) -> bool {
        false
    }

    /// Identifies the select this waiter belongs to, if any.
    ///
    /// A channel never pairs a sender and a receiver carrying the same id,
    /// so a select cannot rendezvous with itself.
    fn select_id(&self) -> Option<usize> {
        None
    }
}

/// A queued receive operation.
///
/// Registered via [`Channel::add_receiver`](crate::Channel::add_receiver);
/// the channel calls [`fulfill`](Receiver::fulfill) with a delivered
/// message, or [`finish`](Receiver::finish) once the channel is closed and
/// drained.
pub trait Receiver<T> {
    /// Delivers a message.
    ///
    /// Hands the message back if the waiter was already completed
    /// elsewhere, so the channel can offer it to the next receiver.
    fn fulfill(&self, msg: T) -> Result<(), T>;

    /// The channel is closed and drained. `default` is the channel's
    /// configured closed-channel value, if any.
    fn finish(&self, default: Option<T>);

    /// Returns `true` if the waiter can no longer accept and should be
    /// dropped from the queue.
    fn is_stale(&self) -> bool {
        false
    }

    /// Identifies the select this waiter belongs to, if any.
    fn select_id(&self) -> Option<usize> {
        None
    }
}

/// Compares two waiters by identity, ignoring vtables.
pub(crate) fn same_waiter<A: ?Sized, B: ?Sized>(a: &Rc<A>, b: &Rc<B>) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}
