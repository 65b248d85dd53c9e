//! The channel: a FIFO rendezvous point between senders and receivers.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures_core::Stream;

use crate::buffer::CircularBuffer;
use crate::err::{CloseError, Closed, SendError, TrySendError};
use crate::protocol::{same_waiter, Fulfill, Receiver, Sender};
use crate::yield_now::{advance_yield_count, yield_count};

/// The result of a receive operation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Received<T> {
    /// A message delivered by a sender or drained from the buffer.
    Value(T),

    /// The channel is closed and drained. Carries the channel's configured
    /// closed-channel default value, if one was set up with
    /// [`Channel::with_default`].
    Done(Option<T>),
}

impl<T> Received<T> {
    /// Unwraps the message, falling back to the closed-channel default.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::Received;
    ///
    /// assert_eq!(Received::Value(1).value(), Some(1));
    /// assert_eq!(Received::Done(Some(0)).value(), Some(0));
    /// assert_eq!(Received::Done(None::<i32>).value(), None);
    /// ```
    pub fn value(self) -> Option<T> {
        match self {
            Received::Value(v) => Some(v),
            Received::Done(d) => d,
        }
    }

    /// Returns `true` if the channel was closed and drained.
    pub fn is_done(&self) -> bool {
        matches!(self, Received::Done(..))
    }
}

/// A typed, optionally buffered, FIFO channel for single-threaded async
/// tasks.
///
/// Any number of tasks may send and receive through clones of the same
/// handle. A capacity of `0` makes the channel unbuffered: every send
/// rendezvouses with a matching receive. Closing is a one-way transition:
/// subsequent sends fail, while receives drain any buffered messages and
/// then report [`Received::Done`].
///
/// The channel is `!Send`: it is meant for executors that run all of its
/// users on one thread (`futures::executor::LocalPool`, a tokio `LocalSet`,
/// and the like).
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use futures::join;
/// use taskchan::{Channel, Received};
///
/// // A rendezvous channel: the send completes only when paired.
/// let ch = Channel::new(0);
/// let (sent, got) = block_on(async { join!(ch.send(7), ch.recv()) });
/// assert!(sent.is_ok());
/// assert_eq!(got, Received::Value(7));
/// ```
pub struct Channel<T: 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    cap: usize,
    default: Option<Rc<dyn Fn() -> T>>,
    unconstrained: Cell<bool>,
    state: RefCell<State<T>>,
}

struct State<T> {
    buffer: CircularBuffer<T>,
    senders: VecDeque<Rc<dyn Sender<T>>>,
    receivers: VecDeque<Rc<dyn Receiver<T>>>,
    closed: bool,
}

impl<T> Inner<T> {
    fn make_default(&self) -> Option<T> {
        self.default.as_ref().map(|f| f())
    }
}

impl<T: 'static> Channel<T> {
    /// Creates a channel that buffers up to `capacity` messages.
    ///
    /// A capacity of `0` creates an unbuffered (rendezvous) channel.
    pub fn new(capacity: usize) -> Channel<T> {
        Channel::build(capacity, None)
    }

    /// Creates a channel whose closed-channel receives yield a default.
    ///
    /// The factory runs once per notified receiver.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::{Channel, Received};
    ///
    /// let ch = Channel::with_default(1, || -1);
    /// ch.try_send(7).unwrap();
    /// ch.close().unwrap();
    ///
    /// assert_eq!(ch.try_recv(), Some(Received::Value(7)));
    /// assert_eq!(ch.try_recv(), Some(Received::Done(Some(-1))));
    /// ```
    pub fn with_default<F>(capacity: usize, default: F) -> Channel<T>
    where
        F: Fn() -> T + 'static,
    {
        Channel::build(capacity, Some(Rc::new(default)))
    }

    fn build(capacity: usize, default: Option<Rc<dyn Fn() -> T>>) -> Channel<T> {
        Channel {
            inner: Rc::new(Inner {
                cap: capacity,
                default,
                unconstrained: Cell::new(false),
                state: RefCell::new(State {
                    buffer: CircularBuffer::new(capacity),
                    senders: VecDeque::new(),
                    receivers: VecDeque::new(),
                    closed: false,
                }),
            }),
        }
    }

    /// Returns the channel's buffer capacity.
    pub fn capacity(&self) -> usize {
        self.inner.cap
    }

    /// Returns the number of buffered messages.
    pub fn len(&self) -> usize {
        self.inner.state.borrow().buffer.len()
    }

    /// Returns `true` if no messages are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.state.borrow().closed
    }

    /// Returns queued senders minus queued receivers.
    ///
    /// Positive when senders are suspended waiting for room or a receiver,
    /// negative when receivers are suspended waiting for a message.
    pub fn concurrency(&self) -> isize {
        let st = self.inner.state.borrow();
        st.senders.len() as isize - st.receivers.len() as isize
    }

    /// Disables the scheduler yield for operations on this channel.
    ///
    /// By default every `send`/`recv` gives the executor one turn before
    /// resolving, so two tasks ping-ponging through a channel cannot starve
    /// the rest of the run queue. Benchmarks that provide their own pacing
    /// can opt out.
    pub fn set_unconstrained(&self, unconstrained: bool) {
        self.inner.unconstrained.set(unconstrained);
    }

    /// Attempts to send a message without suspending.
    ///
    /// A waiting receiver takes the message directly; otherwise it is
    /// buffered if there is room.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::{Channel, TrySendError};
    ///
    /// let ch = Channel::new(1);
    /// assert!(ch.try_send(1).is_ok());
    /// assert_eq!(ch.try_send(2), Err(TrySendError::Full(2)));
    /// ```
    pub fn try_send(&self, msg: T) -> Result<(), TrySendError<T>> {
        let mut slot = Some(msg);
        match self.try_send_with(&mut || slot.take().expect("message produced once")) {
            Ok(true) => Ok(()),
            Ok(false) => Err(TrySendError::Full(slot.take().expect("message unsent"))),
            Err(Closed) => Err(TrySendError::Closed(slot.take().expect("message unsent"))),
        }
    }

    /// Non-suspending send that produces the message only on success.
    pub(crate) fn try_send_with(&self, produce: &mut dyn FnMut() -> T) -> Result<bool, Closed> {
        let mut st = self.inner.state.borrow_mut();
        if st.closed {
            return Err(Closed);
        }
        while let Some(receiver) = st.receivers.pop_front() {
            if receiver.is_stale() {
                continue;
            }
            return match receiver.fulfill(produce()) {
                Ok(()) => Ok(true),
                Err(_) => unreachable!("receiver went stale during handoff"),
            };
        }
        if !st.buffer.is_full() {
            let _ = st.buffer.push(produce());
            return Ok(true);
        }
        Ok(false)
    }

    /// Sends a message, suspending until it has been handed off.
    ///
    /// Resolves with `Ok(())` once the message has been delivered to a
    /// receiver or stored in the buffer, or with [`SendError`] if the
    /// channel is closed before that happens. Dropping the future cancels
    /// the send and withdraws it from the channel's queue.
    pub fn send(&self, msg: T) -> SendFuture<'_, T> {
        SendFuture {
            chan: self,
            state: SendState::Init(Some(msg)),
            start: yield_count(),
            yielded: false,
        }
    }

    /// Attempts to receive a message without suspending.
    ///
    /// Returns `None` when the channel is open but has nothing to deliver.
    /// A closed, drained channel reports [`Received::Done`].
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::{Channel, Received};
    ///
    /// let ch = Channel::new(1);
    /// assert_eq!(ch.try_recv(), None);
    /// ch.try_send(5).unwrap();
    /// assert_eq!(ch.try_recv(), Some(Received::Value(5)));
    /// ```
    pub fn try_recv(&self) -> Option<Received<T>> {
        let mut st = self.inner.state.borrow_mut();
        if let Some(msg) = st.buffer.pop() {
            // Refill the freed capacity from staged senders.
            while !st.buffer.is_full() {
                match st.senders.pop_front() {
                    Some(sender) => {
                        if let Fulfill::Msg(m) = sender.fulfill() {
                            let _ = st.buffer.push(m);
                        }
                    }
                    None => break,
                }
            }
            return Some(Received::Value(msg));
        }
        while let Some(sender) = st.senders.pop_front() {
            if let Fulfill::Msg(msg) = sender.fulfill() {
                return Some(Received::Value(msg));
            }
        }
        if st.closed {
            drop(st);
            return Some(Received::Done(self.inner.make_default()));
        }
        None
    }

    /// Receives a message, suspending until one is available or the channel
    /// is closed and drained.
    ///
    /// Dropping the future cancels the receive and withdraws it from the
    /// channel's queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::{Channel, Received};
    ///
    /// let ch = Channel::new(1);
    /// ch.try_send("hi").unwrap();
    /// let got = futures::executor::block_on(ch.recv());
    /// assert_eq!(got, Received::Value("hi"));
    /// ```
    pub fn recv(&self) -> RecvFuture<'_, T> {
        RecvFuture {
            chan: self,
            op: RecvOp::new(),
        }
    }

    /// Closes the channel.
    ///
    /// Suspended receivers are notified with [`Received::Done`]. Suspended
    /// senders are first flushed into any remaining buffer space, and the
    /// rest fail with [`SendError`]. Buffered messages stay drainable.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::Channel;
    ///
    /// let ch = Channel::<i32>::new(1);
    /// ch.close().unwrap();
    /// assert!(ch.close().is_err());
    /// assert!(ch.try_send(1).is_err());
    /// ```
    pub fn close(&self) -> Result<(), CloseError> {
        let (receivers, senders) = {
            let mut st = self.inner.state.borrow_mut();
            if st.closed {
                return Err(CloseError);
            }
            st.closed = true;
            if !st.receivers.is_empty() {
                // Queue invariant: waiting receivers imply an empty buffer
                // and no staged senders.
                (mem::take(&mut st.receivers), VecDeque::new())
            } else {
                // Flush staged senders into whatever buffer space remains,
                // then fail the rest.
                while !st.buffer.is_full() {
                    match st.senders.pop_front() {
                        Some(sender) => {
                            if let Fulfill::Msg(msg) = sender.fulfill() {
                                let _ = st.buffer.push(msg);
                            }
                        }
                        None => break,
                    }
                }
                (VecDeque::new(), mem::take(&mut st.senders))
            }
        };
        for receiver in receivers {
            let default = self.inner.make_default();
            receiver.finish(default);
        }
        for sender in senders {
            sender.fail();
        }
        Ok(())
    }

    /// Registers a sender waiter.
    ///
    /// Completes the operation inline when a receiver or buffer slot is
    /// available (returning `false`), otherwise queues the waiter in FIFO
    /// order (returning `true`).
    pub fn add_sender(&self, waiter: Rc<dyn Sender<T>>) -> Result<bool, Closed> {
        let mut st = self.inner.state.borrow_mut();
        if st.closed {
            return Err(Closed);
        }
        if waiter.is_stale() {
            return Ok(false);
        }
        let sid = waiter.select_id();
        let mut i = 0;
        while i < st.receivers.len() {
            if st.receivers[i].is_stale() {
                st.receivers.remove(i);
                continue;
            }
            if sid.is_some() && st.receivers[i].select_id() == sid {
                // Never pair two cases of the same select.
                i += 1;
                continue;
            }
            return match waiter.fulfill() {
                Fulfill::Msg(msg) => {
                    let receiver = st.receivers.remove(i).expect("receiver index in bounds");
                    match receiver.fulfill(msg) {
                        Ok(()) => Ok(false),
                        Err(_) => unreachable!("receiver went stale during handoff"),
                    }
                }
                Fulfill::Stale => Ok(false),
            };
        }
        if !st.buffer.is_full() {
            if let Fulfill::Msg(msg) = waiter.fulfill() {
                let _ = st.buffer.push(msg);
            }
            return Ok(false);
        }
        st.senders.push_back(waiter);
        Ok(true)
    }

    /// Removes the most recently queued occurrence of a sender waiter.
    ///
    /// Waiters are matched by identity. Removing an absent waiter is a
    /// no-op, so cancellation paths may double-remove safely.
    pub fn remove_sender<W>(&self, waiter: &Rc<W>)
    where
        W: Sender<T> + ?Sized,
    {
        let mut st = self.inner.state.borrow_mut();
        if let Some(i) = st.senders.iter().rposition(|s| same_waiter(s, waiter)) {
            st.senders.remove(i);
        }
    }

    /// Registers a receiver waiter.
    ///
    /// Completes the operation inline when a buffered message, a waiting
    /// sender, or the closed-and-drained state is available (returning
    /// `false`), otherwise queues the waiter in FIFO order (returning
    /// `true`).
    pub fn add_receiver(&self, waiter: Rc<dyn Receiver<T>>) -> bool {
        let mut st = self.inner.state.borrow_mut();
        if waiter.is_stale() {
            return false;
        }
        // A buffered message short-circuits; freed capacity is refilled
        // from staged senders.
        if let Some(msg) = st.buffer.pop() {
            if waiter.fulfill(msg).is_err() {
                unreachable!("receiver went stale during handoff");
            }
            while !st.buffer.is_full() {
                match st.senders.pop_front() {
                    Some(sender) => {
                        if let Fulfill::Msg(m) = sender.fulfill() {
                            let _ = st.buffer.push(m);
                        }
                    }
                    None => break,
                }
            }
            return false;
        }
        // Direct handoff from a waiting sender.
        let sid = waiter.select_id();
        let mut i = 0;
        while i < st.senders.len() {
            if st.senders[i].is_stale() {
                st.senders.remove(i);
                continue;
            }
            if sid.is_some() && st.senders[i].select_id() == sid {
                i += 1;
                continue;
            }
            match st.senders[i].fulfill() {
                Fulfill::Msg(msg) => {
                    st.senders.remove(i);
                    if waiter.fulfill(msg).is_err() {
                        unreachable!("receiver went stale during handoff");
                    }
                    return false;
                }
                Fulfill::Stale => {
                    st.senders.remove(i);
                }
            }
        }
        if st.closed {
            drop(st);
            let default = self.inner.make_default();
            waiter.finish(default);
            return false;
        }
        st.receivers.push_back(waiter);
        true
    }

    /// Removes the most recently queued occurrence of a receiver waiter.
    ///
    /// Waiters are matched by identity. Removing an absent waiter is a
    /// no-op.
    pub fn remove_receiver<W>(&self, waiter: &Rc<W>)
    where
        W: Receiver<T> + ?Sized,
    {
        let mut st = self.inner.state.borrow_mut();
        if let Some(i) = st.receivers.iter().rposition(|r| same_waiter(r, waiter)) {
            st.receivers.remove(i);
        }
    }

    /// Drains currently available messages without suspending.
    ///
    /// The iterator ends at the first moment the channel has nothing ready;
    /// it does not wait for new messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::Channel;
    ///
    /// let ch = Channel::new(3);
    /// ch.try_send(1).unwrap();
    /// ch.try_send(2).unwrap();
    /// let drained: Vec<i32> = ch.try_iter().collect();
    /// assert_eq!(drained, vec![1, 2]);
    /// ```
    pub fn try_iter(&self) -> TryIter<'_, T> {
        TryIter { chan: self }
    }

    /// Streams messages until the channel is closed and drained.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::Channel;
    ///
    /// let ch = Channel::new(3);
    /// ch.try_send(1).unwrap();
    /// ch.try_send(2).unwrap();
    /// ch.close().unwrap();
    ///
    /// let all: Vec<i32> = futures::executor::block_on(
    ///     futures::StreamExt::collect(ch.stream()),
    /// );
    /// assert_eq!(all, vec![1, 2]);
    /// ```
    pub fn stream(&self) -> RecvStream<'_, T> {
        RecvStream {
            chan: self,
            op: RecvOp::new(),
            finished: false,
        }
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Channel<T> {
        Channel {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Channel<T> {
    fn eq(&self, other: &Channel<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for Channel<T> {}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A suspended plain send; the waiter parked on the sender queue.
struct SendTask<T> {
    slot: RefCell<SendSlot<T>>,
    waker: RefCell<Waker>,
}

enum SendSlot<T> {
    Staged(T),
    Sent,
    Closed(T),
    Taken,
}

impl<T> SendTask<T> {
    fn new(msg: T, waker: Waker) -> SendTask<T> {
        SendTask {
            slot: RefCell::new(SendSlot::Staged(msg)),
            waker: RefCell::new(waker),
        }
    }

    fn set_waker(&self, waker: &Waker) {
        let mut current = self.waker.borrow_mut();
        if !current.will_wake(waker) {
            *current = waker.clone();
        }
    }

    fn take_result(&self) -> Option<Result<(), SendError<T>>> {
        let mut slot = self.slot.borrow_mut();
        match mem::replace(&mut *slot, SendSlot::Taken) {
            SendSlot::Staged(v) => {
                *slot = SendSlot::Staged(v);
                None
            }
            SendSlot::Sent => Some(Ok(())),
            SendSlot::Closed(v) => Some(Err(SendError(v))),
            SendSlot::Taken => unreachable!("send result taken twice"),
        }
    }
}

impl<T> Sender<T> for SendTask<T> {
    fn fulfill(&self) -> Fulfill<T> {
        let mut slot = self.slot.borrow_mut();
        match mem::replace(&mut *slot, SendSlot::Sent) {
            SendSlot::Staged(v) => {
                drop(slot);
                self.waker.borrow().wake_by_ref();
                Fulfill::Msg(v)
            }
            prev => {
                *slot = prev;
                Fulfill::Stale
            }
        }
    }

    fn fail(&self) {
        let mut slot = self.slot.borrow_mut();
        match mem::replace(&mut *slot, SendSlot::Taken) {
            SendSlot::Staged(v) => {
                *slot = SendSlot::Closed(v);
                drop(slot);
                self.waker.borrow().wake_by_ref();
            }
            prev => *slot = prev,
        }
    }

    fn is_stale(&self) -> bool {
        !matches!(*self.slot.borrow(), SendSlot::Staged(_))
    }
}

/// A suspended plain receive; the waiter parked on the receiver queue.
struct RecvTask<T> {
    slot: RefCell<RecvSlot<T>>,
    waker: RefCell<Waker>,
}

enum RecvSlot<T> {
    Waiting,
    Ready(Received<T>),
    Taken,
}

impl<T> RecvTask<T> {
    fn new(waker: Waker) -> RecvTask<T> {
        RecvTask {
            slot: RefCell::new(RecvSlot::Waiting),
            waker: RefCell::new(waker),
        }
    }

    fn set_waker(&self, waker: &Waker) {
        let mut current = self.waker.borrow_mut();
        if !current.will_wake(waker) {
            *current = waker.clone();
        }
    }

    fn take_result(&self) -> Option<Received<T>> {
        let mut slot = self.slot.borrow_mut();
        match mem::replace(&mut *slot, RecvSlot::Taken) {
            RecvSlot::Waiting => {
                *slot = RecvSlot::Waiting;
                None
            }
            RecvSlot::Ready(r) => Some(r),
            RecvSlot::Taken => unreachable!("receive result taken twice"),
        }
    }
}

impl<T> Receiver<T> for RecvTask<T> {
    fn fulfill(&self, msg: T) -> Result<(), T> {
        let mut slot = self.slot.borrow_mut();
        match &*slot {
            RecvSlot::Waiting => {
                *slot = RecvSlot::Ready(Received::Value(msg));
                drop(slot);
                self.waker.borrow().wake_by_ref();
                Ok(())
            }
            _ => Err(msg),
        }
    }

    fn finish(&self, default: Option<T>) {
        let mut slot = self.slot.borrow_mut();
        if let RecvSlot::Waiting = &*slot {
            *slot = RecvSlot::Ready(Received::Done(default));
            drop(slot);
            self.waker.borrow().wake_by_ref();
        }
    }

    fn is_stale(&self) -> bool {
        !matches!(*self.slot.borrow(), RecvSlot::Waiting)
    }
}

/// Future returned by [`Channel::send`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct SendFuture<'a, T: 'static> {
    chan: &'a Channel<T>,
    state: SendState<T>,
    start: u64,
    yielded: bool,
}

enum SendState<T> {
    Init(Option<T>),
    Parked(Rc<SendTask<T>>),
    Yield(Option<Result<(), SendError<T>>>),
    Done,
}

impl<T> Unpin for SendFuture<'_, T> {}

impl<T: 'static> Future for SendFuture<'_, T> {
    type Output = Result<(), SendError<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                SendState::Init(msg) => {
                    let msg = msg.take().expect("message staged");
                    match this.chan.try_send(msg) {
                        Ok(()) => this.state = SendState::Yield(Some(Ok(()))),
                        Err(TrySendError::Closed(v)) => {
                            this.state = SendState::Done;
                            return Poll::Ready(Err(SendError(v)));
                        }
                        Err(TrySendError::Full(v)) => {
                            let task = Rc::new(SendTask::new(v, cx.waker().clone()));
                            this.chan
                                .inner
                                .state
                                .borrow_mut()
                                .senders
                                .push_back(task.clone());
                            this.state = SendState::Parked(task);
                            return Poll::Pending;
                        }
                    }
                }
                SendState::Parked(task) => match task.take_result() {
                    None => {
                        task.set_waker(cx.waker());
                        return Poll::Pending;
                    }
                    Some(Ok(())) => this.state = SendState::Yield(Some(Ok(()))),
                    Some(Err(e)) => {
                        this.state = SendState::Done;
                        return Poll::Ready(Err(e));
                    }
                },
                SendState::Yield(result) => {
                    if this.yielded {
                        advance_yield_count();
                    } else if !this.chan.inner.unconstrained.get() && yield_count() == this.start {
                        this.yielded = true;
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    let result = result.take().expect("send completed once");
                    this.state = SendState::Done;
                    return Poll::Ready(result);
                }
                SendState::Done => panic!("`SendFuture` polled after completion"),
            }
        }
    }
}

impl<T> Drop for SendFuture<'_, T> {
    fn drop(&mut self) {
        if let SendState::Parked(task) = &self.state {
            self.chan.remove_sender(task);
        }
    }
}

impl<T> fmt::Debug for SendFuture<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendFuture").finish()
    }
}

/// Shared state machine behind [`RecvFuture`] and [`RecvStream`].
struct RecvOp<T> {
    state: RecvState<T>,
    start: u64,
    yielded: bool,
}

enum RecvState<T> {
    Init,
    Parked(Rc<RecvTask<T>>),
    Yield(Option<Received<T>>),
    Done,
}

impl<T: 'static> RecvOp<T> {
    fn new() -> RecvOp<T> {
        RecvOp {
            state: RecvState::Init,
            start: yield_count(),
            yielded: false,
        }
    }

    fn poll(&mut self, chan: &Channel<T>, cx: &mut Context<'_>) -> Poll<Received<T>> {
        loop {
            match &mut self.state {
                RecvState::Init => match chan.try_recv() {
                    Some(r) => self.state = RecvState::Yield(Some(r)),
                    None => {
                        let task = Rc::new(RecvTask::new(cx.waker().clone()));
                        chan.inner
                            .state
                            .borrow_mut()
                            .receivers
                            .push_back(task.clone());
                        self.state = RecvState::Parked(task);
                        return Poll::Pending;
                    }
                },
                RecvState::Parked(task) => match task.take_result() {
                    None => {
                        task.set_waker(cx.waker());
                        return Poll::Pending;
                    }
                    Some(r) => self.state = RecvState::Yield(Some(r)),
                },
                RecvState::Yield(result) => {
                    if self.yielded {
                        advance_yield_count();
                    } else if !chan.inner.unconstrained.get() && yield_count() == self.start {
                        self.yielded = true;
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    let r = result.take().expect("receive completed once");
                    self.state = RecvState::Done;
                    return Poll::Ready(r);
                }
                RecvState::Done => panic!("receive polled after completion"),
            }
        }
    }

    fn cancel(&mut self, chan: &Channel<T>) {
        if let RecvState::Parked(task) = &self.state {
            chan.remove_receiver(task);
        }
    }
}

/// Future returned by [`Channel::recv`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct RecvFuture<'a, T: 'static> {
    chan: &'a Channel<T>,
    op: RecvOp<T>,
}

impl<T> Unpin for RecvFuture<'_, T> {}

impl<T: 'static> Future for RecvFuture<'_, T> {
    type Output = Received<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.op.poll(this.chan, cx)
    }
}

impl<T: 'static> Drop for RecvFuture<'_, T> {
    fn drop(&mut self) {
        self.op.cancel(self.chan);
    }
}

impl<T> fmt::Debug for RecvFuture<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecvFuture").finish()
    }
}

/// Iterator returned by [`Channel::try_iter`].
pub struct TryIter<'a, T: 'static> {
    chan: &'a Channel<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.chan.try_recv() {
            Some(Received::Value(v)) => Some(v),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for TryIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryIter").finish()
    }
}

/// Stream returned by [`Channel::stream`].
#[must_use = "streams do nothing unless polled"]
pub struct RecvStream<'a, T: 'static> {
    chan: &'a Channel<T>,
    op: RecvOp<T>,
    finished: bool,
}

impl<T> Unpin for RecvStream<'_, T> {}

impl<T: 'static> Stream for RecvStream<'_, T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        match this.op.poll(this.chan, cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Received::Value(v)) => {
                this.op = RecvOp::new();
                Poll::Ready(Some(v))
            }
            Poll::Ready(Received::Done(_)) => {
                this.finished = true;
                Poll::Ready(None)
            }
        }
    }
}

impl<T: 'static> Drop for RecvStream<'_, T> {
    fn drop(&mut self) {
        self.op.cancel(self.chan);
    }
}

impl<T> fmt::Debug for RecvStream<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecvStream").finish()
    }
}
