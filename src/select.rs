//! Waiting on multiple channel operations at once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use smallvec::SmallVec;

use crate::channel::{Channel, Received};
use crate::err::Closed;
use crate::protocol::{Fulfill, Receiver, Sender};
use crate::utils;
use crate::yield_now::{advance_yield_count, yield_count};

/// The stop semaphore: authorization for exactly one case to complete a
/// suspended select.
///
/// A fresh token is installed per wait. The first firing waiter consumes it
/// and records itself as the winner; waiters that fire afterwards see a
/// mismatch, refuse delivery, and are skipped by the channel until the stop
/// sweep withdraws them.
struct Semaphore {
    token: Cell<u64>,
    winner: Cell<usize>,
    failed: Cell<bool>,
}

impl Semaphore {
    fn new() -> Rc<Semaphore> {
        Rc::new(Semaphore {
            token: Cell::new(0),
            winner: Cell::new(usize::MAX),
            failed: Cell::new(false),
        })
    }

    fn arm(&self, token: u64) {
        self.token.set(token);
        self.winner.set(usize::MAX);
        self.failed.set(false);
    }

    fn disarm(&self) {
        self.token.set(0);
    }

    fn is_armed_with(&self, token: u64) -> bool {
        token != 0 && self.token.get() == token
    }

    fn consume(&self, token: u64, winner: usize) -> bool {
        if self.is_armed_with(token) {
            self.token.set(0);
            self.winner.set(winner);
            true
        } else {
            false
        }
    }

    fn consume_failed(&self, token: u64) -> bool {
        if self.is_armed_with(token) {
            self.token.set(0);
            self.failed.set(true);
            true
        } else {
            false
        }
    }
}

/// A case waiter's link to the wait currently in flight.
struct Binding {
    sem: Rc<Semaphore>,
    token: u64,
    index: usize,
    waker: Waker,
}

impl Binding {
    fn select_id(&self) -> usize {
        Rc::as_ptr(&self.sem) as usize
    }
}

/// One case of a select, type-erased.
trait Case {
    /// A terminal, unconsumed outcome is present.
    fn is_terminal(&self) -> bool;

    /// Non-suspending probe; records the outcome on success.
    fn try_fire(&mut self) -> Result<bool, Closed>;

    /// Registers the case for a suspended wait. Returns `Ok(true)` if the
    /// case completed inline during registration.
    fn register(
        &mut self,
        sem: &Rc<Semaphore>,
        token: u64,
        index: usize,
        cx: &mut Context<'_>,
    ) -> Result<bool, Closed>;

    /// Gives the case a chance to complete while suspended (external
    /// futures are re-polled, channel waiters refresh their waker).
    /// Returns `true` if the case just won.
    fn poll_pending(&mut self, cx: &mut Context<'_>) -> bool;

    /// Withdraws the registration (the stop sweep).
    fn unregister(&mut self);

    /// Clears a send case's delivered marker once its index was observed.
    fn acknowledge(&mut self);
}

struct SendShared<T, F> {
    producer: RefCell<F>,
    delivered: Cell<bool>,
    binding: RefCell<Option<Binding>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F: FnMut() -> T> Sender<T> for SendShared<T, F> {
    fn fulfill(&self) -> Fulfill<T> {
        let waker = {
            let binding = self.binding.borrow();
            match &*binding {
                Some(b) if b.sem.consume(b.token, b.index) => b.waker.clone(),
                _ => return Fulfill::Stale,
            }
        };
        let msg = {
            let mut produce = self.producer.borrow_mut();
            (*produce)()
        };
        self.delivered.set(true);
        waker.wake_by_ref();
        Fulfill::Msg(msg)
    }

    fn fail(&self) {
        let binding = self.binding.borrow();
        if let Some(b) = &*binding {
            if b.sem.consume_failed(b.token) {
                b.waker.wake_by_ref();
            }
        }
    }

    fn is_stale(&self) -> bool {
        match &*self.binding.borrow() {
            Some(b) => !b.sem.is_armed_with(b.token),
            None => true,
        }
    }

    fn select_id(&self) -> Option<usize> {
        self.binding.borrow().as_ref().map(Binding::select_id)
    }
}

struct SendCase<T: 'static, F> {
    chan: Channel<T>,
    shared: Rc<SendShared<T, F>>,
    queued: bool,
}

impl<T, F> Case for SendCase<T, F>
where
    T: 'static,
    F: FnMut() -> T + 'static,
{
    fn is_terminal(&self) -> bool {
        self.shared.delivered.get()
    }

    fn try_fire(&mut self) -> Result<bool, Closed> {
        let shared = &self.shared;
        let fired = self.chan.try_send_with(&mut || {
            let mut produce = shared.producer.borrow_mut();
            (*produce)()
        })?;
        if fired {
            shared.delivered.set(true);
        }
        Ok(fired)
    }

    fn register(
        &mut self,
        sem: &Rc<Semaphore>,
        token: u64,
        index: usize,
        cx: &mut Context<'_>,
    ) -> Result<bool, Closed> {
        *self.shared.binding.borrow_mut() = Some(Binding {
            sem: sem.clone(),
            token,
            index,
            waker: cx.waker().clone(),
        });
        match self.chan.add_sender(self.shared.clone()) {
            Err(Closed) => {
                self.shared.binding.borrow_mut().take();
                Err(Closed)
            }
            Ok(true) => {
                self.queued = true;
                Ok(false)
            }
            Ok(false) => Ok(true),
        }
    }

    fn poll_pending(&mut self, cx: &mut Context<'_>) -> bool {
        if let Some(b) = self.shared.binding.borrow_mut().as_mut() {
            if !b.waker.will_wake(cx.waker()) {
                b.waker = cx.waker().clone();
            }
        }
        false
    }

    fn unregister(&mut self) {
        if self.queued {
            self.chan.remove_sender(&self.shared);
            self.queued = false;
        }
        self.shared.binding.borrow_mut().take();
    }

    fn acknowledge(&mut self) {
        self.shared.delivered.set(false);
    }
}

struct RecvShared<T> {
    result: RefCell<Option<Received<T>>>,
    binding: RefCell<Option<Binding>>,
}

impl<T> Receiver<T> for RecvShared<T> {
    fn fulfill(&self, msg: T) -> Result<(), T> {
        let binding = self.binding.borrow();
        match &*binding {
            Some(b) if b.sem.consume(b.token, b.index) => {
                *self.result.borrow_mut() = Some(Received::Value(msg));
                b.waker.wake_by_ref();
                Ok(())
            }
            _ => Err(msg),
        }
    }

    fn finish(&self, default: Option<T>) {
        let binding = self.binding.borrow();
        if let Some(b) = &*binding {
            if b.sem.consume(b.token, b.index) {
                *self.result.borrow_mut() = Some(Received::Done(default));
                b.waker.wake_by_ref();
            }
        }
    }

    fn is_stale(&self) -> bool {
        match &*self.binding.borrow() {
            Some(b) => !b.sem.is_armed_with(b.token),
            None => true,
        }
    }

    fn select_id(&self) -> Option<usize> {
        self.binding.borrow().as_ref().map(Binding::select_id)
    }
}

struct RecvCase<T: 'static> {
    chan: Channel<T>,
    shared: Rc<RecvShared<T>>,
    queued: bool,
}

impl<T: 'static> Case for RecvCase<T> {
    fn is_terminal(&self) -> bool {
        self.shared.result.borrow().is_some()
    }

    fn try_fire(&mut self) -> Result<bool, Closed> {
        match self.chan.try_recv() {
            Some(r) => {
                *self.shared.result.borrow_mut() = Some(r);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn register(
        &mut self,
        sem: &Rc<Semaphore>,
        token: u64,
        index: usize,
        cx: &mut Context<'_>,
    ) -> Result<bool, Closed> {
        *self.shared.binding.borrow_mut() = Some(Binding {
            sem: sem.clone(),
            token,
            index,
            waker: cx.waker().clone(),
        });
        if self.chan.add_receiver(self.shared.clone()) {
            self.queued = true;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    fn poll_pending(&mut self, cx: &mut Context<'_>) -> bool {
        if let Some(b) = self.shared.binding.borrow_mut().as_mut() {
            if !b.waker.will_wake(cx.waker()) {
                b.waker = cx.waker().clone();
            }
        }
        false
    }

    fn unregister(&mut self) {
        if self.queued {
            self.chan.remove_receiver(&self.shared);
            self.queued = false;
        }
        self.shared.binding.borrow_mut().take();
    }

    fn acknowledge(&mut self) {}
}

struct WaitShared<O> {
    out: RefCell<Option<O>>,
}

struct Armed {
    sem: Rc<Semaphore>,
    token: u64,
    index: usize,
}

struct WaitCase<F: Future> {
    fut: Option<Pin<Box<F>>>,
    shared: Rc<WaitShared<F::Output>>,
    armed: Option<Armed>,
}

impl<F: Future> WaitCase<F> {
    fn poll_future(&mut self, cx: &mut Context<'_>) -> bool {
        let Some(fut) = self.fut.as_mut() else {
            return false;
        };
        match fut.as_mut().poll(cx) {
            Poll::Ready(out) => {
                *self.shared.out.borrow_mut() = Some(out);
                self.fut = None;
                if let Some(armed) = &self.armed {
                    armed.sem.consume(armed.token, armed.index);
                }
                true
            }
            Poll::Pending => false,
        }
    }
}

impl<F> Case for WaitCase<F>
where
    F: Future + 'static,
    F::Output: 'static,
{
    fn is_terminal(&self) -> bool {
        self.shared.out.borrow().is_some()
    }

    fn try_fire(&mut self) -> Result<bool, Closed> {
        // External cases never make progress inside a non-suspending probe;
        // only an already-observed outcome counts, and that is reported by
        // `is_terminal`.
        Ok(false)
    }

    fn register(
        &mut self,
        sem: &Rc<Semaphore>,
        token: u64,
        index: usize,
        cx: &mut Context<'_>,
    ) -> Result<bool, Closed> {
        self.armed = Some(Armed {
            sem: sem.clone(),
            token,
            index,
        });
        Ok(self.poll_future(cx))
    }

    fn poll_pending(&mut self, cx: &mut Context<'_>) -> bool {
        self.poll_future(cx)
    }

    fn unregister(&mut self) {
        self.armed = None;
    }

    fn acknowledge(&mut self) {}
}

/// Handle for a send case added with [`Select::send`].
#[derive(Clone, Copy, Debug)]
pub struct SendHandle {
    index: usize,
}

impl SendHandle {
    /// The case's index in insertion order.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle for a receive case added with [`Select::recv`].
///
/// After the case's index is returned by
/// [`try_select`](Select::try_select)/[`select`](Select::select), pass the
/// handle to [`Select::take`] to consume the received message.
pub struct RecvHandle<T> {
    index: usize,
    owner: usize,
    shared: Rc<RecvShared<T>>,
}

impl<T> RecvHandle<T> {
    /// The case's index in insertion order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for RecvHandle<T> {
    fn clone(&self) -> RecvHandle<T> {
        RecvHandle {
            index: self.index,
            owner: self.owner,
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for RecvHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecvHandle").field("index", &self.index).finish()
    }
}

/// Handle for an external-value case added with [`Select::wait`].
///
/// After the case's index is returned, pass the handle to [`Select::take`]
/// to consume the future's output; doing so removes the case from the
/// select's pending set.
pub struct WaitHandle<O> {
    index: usize,
    owner: usize,
    shared: Rc<WaitShared<O>>,
}

impl<O> WaitHandle<O> {
    /// The case's index in insertion order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<O> Clone for WaitHandle<O> {
    fn clone(&self) -> WaitHandle<O> {
        WaitHandle {
            index: self.index,
            owner: self.owner,
            shared: self.shared.clone(),
        }
    }
}

impl<O> fmt::Debug for WaitHandle<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitHandle").field("index", &self.index).finish()
    }
}

/// Consuming the terminal outcome of a ready case.
///
/// Implemented by [`RecvHandle`] and [`WaitHandle`]; used through
/// [`Select::take`].
pub trait TakeFrom {
    /// The value produced by consuming the case.
    type Output;

    #[doc(hidden)]
    fn take_from(&self, sel: &mut Select) -> Self::Output;
}

impl<T> TakeFrom for RecvHandle<T> {
    type Output = Received<T>;

    fn take_from(&self, sel: &mut Select) -> Received<T> {
        assert!(
            self.owner == sel.id(),
            "handle does not belong to this `Select`"
        );
        match self.shared.result.borrow_mut().take() {
            Some(r) => r,
            None => panic!("receive case is not ready"),
        }
    }
}

impl<O> TakeFrom for WaitHandle<O> {
    type Output = O;

    fn take_from(&self, sel: &mut Select) -> O {
        assert!(
            self.owner == sel.id(),
            "handle does not belong to this `Select`"
        );
        match self.shared.out.borrow_mut().take() {
            Some(out) => {
                sel.remove_case(self.index);
                out
            }
            None => panic!("external case is not ready"),
        }
    }
}

/// Waits on a set of channel operations and external futures, resolving
/// exactly one ready case per wait, chosen uniformly at random among the
/// ready ones.
///
/// Cases are added up front and addressed by the index they were added at.
/// Channel cases stay in the set and can fire again on later waits;
/// external-value cases are removed once their output is consumed with
/// [`take`](Select::take).
///
/// # Examples
///
/// ```
/// use taskchan::{Channel, Received, Select};
///
/// let a = Channel::new(1);
/// let b = Channel::new(1);
/// a.try_send("hello").unwrap();
///
/// let mut sel = Select::new();
/// let ra = sel.recv(&a);
/// let rb = sel.recv(&b);
///
/// // Only `a` has anything to deliver.
/// let i = sel.try_select().unwrap().unwrap();
/// assert_eq!(i, ra.index());
/// assert_eq!(sel.take(&ra), Received::Value("hello"));
/// assert_ne!(i, rb.index());
/// ```
pub struct Select {
    cases: SmallVec<[Box<dyn Case>; 4]>,
    pending: SmallVec<[usize; 4]>,
    fresh: bool,
    sem: Rc<Semaphore>,
    token_seq: u64,
    unconstrained: bool,
}

impl Select {
    /// Creates a select with no cases.
    pub fn new() -> Select {
        Select {
            cases: SmallVec::new(),
            pending: SmallVec::new(),
            fresh: false,
            sem: Semaphore::new(),
            token_seq: 0,
            unconstrained: false,
        }
    }

    fn id(&self) -> usize {
        Rc::as_ptr(&self.sem) as usize
    }

    /// Adds a send case.
    ///
    /// `produce` is invoked exactly once per delivery, at the moment the
    /// case fires; if the case is never selected it is never called. The
    /// case is reusable: on a later wait it sends a freshly produced
    /// message.
    pub fn send<T, F>(&mut self, chan: &Channel<T>, produce: F) -> SendHandle
    where
        T: 'static,
        F: FnMut() -> T + 'static,
    {
        let index = self.cases.len();
        let shared = Rc::new(SendShared {
            producer: RefCell::new(produce),
            delivered: Cell::new(false),
            binding: RefCell::new(None),
            _marker: PhantomData,
        });
        self.cases.push(Box::new(SendCase {
            chan: chan.clone(),
            shared,
            queued: false,
        }));
        self.pending.push(index);
        self.fresh = false;
        SendHandle { index }
    }

    /// Adds a receive case.
    pub fn recv<T: 'static>(&mut self, chan: &Channel<T>) -> RecvHandle<T> {
        let index = self.cases.len();
        let shared = Rc::new(RecvShared {
            result: RefCell::new(None),
            binding: RefCell::new(None),
        });
        self.cases.push(Box::new(RecvCase {
            chan: chan.clone(),
            shared: shared.clone(),
            queued: false,
        }));
        self.pending.push(index);
        self.fresh = false;
        RecvHandle {
            index,
            owner: self.id(),
            shared,
        }
    }

    /// Adds an external-value case.
    ///
    /// The future is polled only while a [`select`](Select::select) is
    /// suspended. Once its output has been observed it remains stable until
    /// consumed with [`take`](Select::take), which removes the case from
    /// the pending set.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::executor::block_on;
    /// use taskchan::{Channel, Select};
    ///
    /// let quiet = Channel::<i32>::new(0);
    /// let mut sel = Select::new();
    /// let r = sel.recv(&quiet);
    /// let w = sel.wait(futures::future::ready(42));
    ///
    /// let i = block_on(sel.select()).unwrap();
    /// assert_eq!(i, w.index());
    /// assert_eq!(sel.take(&w), 42);
    /// assert_eq!(sel.len(), 1); // only the receive case remains
    /// # let _ = r;
    /// ```
    pub fn wait<F>(&mut self, fut: F) -> WaitHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let index = self.cases.len();
        let shared = Rc::new(WaitShared {
            out: RefCell::new(None),
        });
        self.cases.push(Box::new(WaitCase {
            fut: Some(Box::pin(fut)),
            shared: shared.clone(),
            armed: None,
        }));
        self.pending.push(index);
        self.fresh = false;
        WaitHandle {
            index,
            owner: self.id(),
            shared,
        }
    }

    /// Returns the number of still-pending cases.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no cases are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the total number of cases ever added.
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Disables the scheduler yield for this select's waits.
    pub fn set_unconstrained(&mut self, unconstrained: bool) {
        self.unconstrained = unconstrained;
    }

    /// Probes the cases without suspending.
    ///
    /// Returns the index of one ready case, chosen uniformly at random when
    /// several are ready, or `Ok(None)` when none is. Fails with [`Closed`]
    /// if a send case targets a closed channel.
    ///
    /// A receive or external case returned here holds its outcome until it
    /// is consumed with [`take`](Select::take); probing again before that
    /// reports the same case.
    pub fn try_select(&mut self) -> Result<Option<usize>, Closed> {
        match self.scan_ready()? {
            Some(i) => {
                self.cases[i].acknowledge();
                Ok(Some(i))
            }
            None => Ok(None),
        }
    }

    /// Suspends until one case becomes ready and returns its index.
    ///
    /// Dropping the returned future withdraws every registration; a case
    /// that had already fired stays ready and is returned by the next
    /// `try_select`/`select`.
    ///
    /// # Panics
    ///
    /// Panics if every case has been consumed (nothing could ever become
    /// ready).
    pub fn select(&mut self) -> Selecting<'_> {
        Selecting {
            start: yield_count(),
            state: SelState::Init,
            yielded: false,
            sel: self,
        }
    }

    /// Consumes the terminal outcome of a ready case.
    ///
    /// For a [`RecvHandle`] this yields the [`Received`] message; for a
    /// [`WaitHandle`] it yields the future's output and removes the case
    /// from the pending set.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to a different select or the case is
    /// not ready.
    pub fn take<H: TakeFrom>(&mut self, handle: &H) -> H::Output {
        handle.take_from(self)
    }

    fn scan_ready(&mut self) -> Result<Option<usize>, Closed> {
        // A case left ready by an earlier wait is reported as-is.
        for k in 0..self.pending.len() {
            let i = self.pending[k];
            if self.cases[i].is_terminal() {
                return Ok(Some(i));
            }
        }
        if !self.fresh {
            utils::shuffle(&mut self.pending);
            self.fresh = true;
        }
        for k in 0..self.pending.len() {
            let i = self.pending[k];
            if self.cases[i].try_fire()? {
                self.fresh = false;
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    fn issue_token(&mut self) -> u64 {
        self.token_seq += 1;
        self.sem.arm(self.token_seq);
        self.token_seq
    }

    /// The stop sweep: withdraws every registration and retires the
    /// current pending order.
    fn sweep(&mut self) {
        self.sem.disarm();
        for k in 0..self.pending.len() {
            let i = self.pending[k];
            self.cases[i].unregister();
        }
        self.fresh = false;
    }

    fn remove_case(&mut self, index: usize) {
        self.pending.retain(|p| *p != index);
    }
}

impl Default for Select {
    fn default() -> Select {
        Select::new()
    }
}

impl fmt::Debug for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("cases", &self.cases.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Future returned by [`Select::select`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Selecting<'a> {
    sel: &'a mut Select,
    state: SelState,
    start: u64,
    yielded: bool,
}

#[derive(Clone, Copy)]
enum SelState {
    Init,
    Suspended { token: u64 },
    Yield(usize),
    Done,
}

impl Future for Selecting<'_> {
    type Output = Result<usize, Closed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match this.state {
                SelState::Init => {
                    if this.sel.pending.is_empty() {
                        panic!("`select` on a `Select` with no pending cases");
                    }
                    match this.sel.scan_ready() {
                        Err(e) => {
                            this.state = SelState::Done;
                            return Poll::Ready(Err(e));
                        }
                        Ok(Some(i)) => this.state = SelState::Yield(i),
                        Ok(None) => {
                            let token = this.sel.issue_token();
                            let sel = &mut *this.sel;
                            let sem = sel.sem.clone();
                            let mut outcome: Option<Result<usize, Closed>> = None;
                            for k in 0..sel.pending.len() {
                                let i = sel.pending[k];
                                match sel.cases[i].register(&sem, token, i, cx) {
                                    Err(e) => {
                                        outcome = Some(Err(e));
                                        break;
                                    }
                                    Ok(true) => {
                                        outcome = Some(Ok(i));
                                        break;
                                    }
                                    Ok(false) => {}
                                }
                            }
                            match outcome {
                                Some(Err(e)) => {
                                    this.sel.sweep();
                                    this.state = SelState::Done;
                                    return Poll::Ready(Err(e));
                                }
                                Some(Ok(i)) => {
                                    this.sel.sweep();
                                    this.state = SelState::Yield(i);
                                }
                                None => {
                                    this.state = SelState::Suspended { token };
                                    return Poll::Pending;
                                }
                            }
                        }
                    }
                }
                SelState::Suspended { token } => {
                    if !this.sel.sem.is_armed_with(token) {
                        // A waiter consumed the token while we slept.
                        let failed = this.sel.sem.failed.get();
                        let winner = this.sel.sem.winner.get();
                        this.sel.sweep();
                        if failed {
                            this.state = SelState::Done;
                            return Poll::Ready(Err(Closed));
                        }
                        this.state = SelState::Yield(winner);
                        continue;
                    }
                    let sel = &mut *this.sel;
                    let mut won = None;
                    for k in 0..sel.pending.len() {
                        let i = sel.pending[k];
                        if sel.cases[i].poll_pending(cx) {
                            won = Some(i);
                            break;
                        }
                    }
                    if let Some(i) = won {
                        this.sel.sweep();
                        this.state = SelState::Yield(i);
                        continue;
                    }
                    return Poll::Pending;
                }
                SelState::Yield(i) => {
                    if this.yielded {
                        advance_yield_count();
                    } else if !this.sel.unconstrained && yield_count() == this.start {
                        this.yielded = true;
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    this.sel.cases[i].acknowledge();
                    this.state = SelState::Done;
                    return Poll::Ready(Ok(i));
                }
                SelState::Done => panic!("`Selecting` polled after completion"),
            }
        }
    }
}

impl Drop for Selecting<'_> {
    fn drop(&mut self) {
        if let SelState::Suspended { .. } = self.state {
            self.sel.sweep();
        }
    }
}

impl fmt::Debug for Selecting<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selecting").finish()
    }
}
