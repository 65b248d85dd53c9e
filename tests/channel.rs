//! Tests for buffered and unbuffered channels.

use std::cell::Cell;
use std::collections::VecDeque;
use std::pin::Pin;
use std::rc::Rc;
use std::task::Context;

use futures::executor::{block_on, LocalPool};
use futures::future::Future;
use futures::task::{noop_waker, LocalSpawnExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use taskchan::{Channel, Received, SendError, TrySendError};
use taskchan::{yield_count, yield_now};

#[test]
fn buffered_queue() {
    let ch = Channel::new(3);
    assert_eq!(ch.capacity(), 3);

    assert!(ch.try_send(10).is_ok());
    assert!(ch.try_send(20).is_ok());
    assert!(ch.try_send(30).is_ok());
    assert_eq!(ch.try_send(40), Err(TrySendError::Full(40)));
    assert_eq!(ch.len(), 3);

    assert_eq!(block_on(ch.recv()), Received::Value(10));
    assert_eq!(block_on(ch.recv()), Received::Value(20));
    assert_eq!(block_on(ch.recv()), Received::Value(30));

    assert!(ch.try_send(40).is_ok());
    assert_eq!(block_on(ch.recv()), Received::Value(40));
    assert!(ch.is_empty());
}

#[test]
fn unbuffered_rendezvous() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::new(0);
    let sent = Rc::new(Cell::new(false));

    {
        let ch = ch.clone();
        let sent = sent.clone();
        spawner
            .spawn_local(async move {
                ch.send(1).await.unwrap();
                sent.set(true);
            })
            .unwrap();
    }

    let got = pool.run_until(ch.recv());
    pool.run();
    assert_eq!(got, Received::Value(1));
    assert!(sent.get());
}

#[test]
fn fifo_across_suspended_senders() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::new(0);
    for i in 0..5 {
        let ch = ch.clone();
        spawner
            .spawn_local(async move {
                ch.send(i).await.unwrap();
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ch.concurrency(), 5);

    let got = pool.run_until(async {
        let mut got = Vec::new();
        for _ in 0..5 {
            got.push(ch.recv().await.value().unwrap());
        }
        got
    });
    assert_eq!(got, vec![0, 1, 2, 3, 4]);
}

#[test]
fn close_rejects_pending_senders() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::<i32>::new(0);
    let failures = Rc::new(Cell::new(0));

    for i in 0..3 {
        let ch = ch.clone();
        let failures = failures.clone();
        spawner
            .spawn_local(async move {
                match ch.send(i).await {
                    Err(SendError(v)) => {
                        assert_eq!(v, i);
                        failures.set(failures.get() + 1);
                    }
                    Ok(()) => panic!("send must fail on close"),
                }
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ch.concurrency(), 3);

    ch.close().unwrap();
    pool.run();

    assert_eq!(failures.get(), 3);
    assert_eq!(ch.try_recv(), Some(Received::Done(None)));
    assert_eq!(ch.concurrency(), 0);
}

#[test]
fn close_of_closed_channel_errors() {
    let ch = Channel::<i32>::new(1);
    assert!(ch.close().is_ok());
    assert!(ch.close().is_err());
}

#[test]
fn close_keeps_buffer_drainable() {
    let ch = Channel::with_default(2, || -1);
    ch.try_send(1).unwrap();
    ch.try_send(2).unwrap();
    ch.close().unwrap();

    assert_eq!(ch.try_recv(), Some(Received::Value(1)));
    assert_eq!(ch.try_recv(), Some(Received::Value(2)));
    assert_eq!(ch.try_recv(), Some(Received::Done(Some(-1))));
    // The default is manufactured per receive.
    assert_eq!(ch.try_recv(), Some(Received::Done(Some(-1))));
}

#[test]
fn close_notifies_suspended_receivers_with_default() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::with_default(0, || 7);
    let done = Rc::new(Cell::new(false));
    {
        let ch = ch.clone();
        let done = done.clone();
        spawner
            .spawn_local(async move {
                assert_eq!(ch.recv().await, Received::Done(Some(7)));
                done.set(true);
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ch.concurrency(), -1);

    ch.close().unwrap();
    pool.run();
    assert!(done.get());
}

#[test]
fn send_on_closed_channel() {
    let ch = Channel::new(1);
    ch.close().unwrap();

    assert_eq!(ch.try_send(5), Err(TrySendError::Closed(5)));
    let err = block_on(ch.send(6)).unwrap_err();
    assert_eq!(err.into_inner(), 6);
}

#[test]
fn cancelled_send_leaves_no_waiter() {
    let ch = Channel::new(1);
    ch.try_send(0).unwrap();

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    let mut fut = ch.send(1);
    assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
    assert_eq!(ch.concurrency(), 1);

    drop(fut);
    assert_eq!(ch.concurrency(), 0);
    // The buffered message is untouched.
    assert_eq!(ch.try_recv(), Some(Received::Value(0)));
    assert_eq!(ch.try_recv(), None);
}

#[test]
fn cancelled_recv_leaves_no_waiter() {
    let ch = Channel::<i32>::new(0);

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    let mut fut = ch.recv();
    assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
    assert_eq!(ch.concurrency(), -1);

    drop(fut);
    assert_eq!(ch.concurrency(), 0);
}

#[test]
fn operations_yield_once() {
    let ch = Channel::new(1);

    let g0 = yield_count();
    block_on(ch.send(1)).unwrap();
    assert_ne!(yield_count(), g0);

    let g1 = yield_count();
    let _ = block_on(ch.recv());
    assert_ne!(yield_count(), g1);
}

#[test]
fn unconstrained_skips_the_yield() {
    let ch = Channel::new(1);
    ch.set_unconstrained(true);

    let g0 = yield_count();
    block_on(ch.send(1)).unwrap();
    assert_eq!(yield_count(), g0);
    assert_eq!(block_on(ch.recv()), Received::Value(1));
    assert_eq!(yield_count(), g0);
}

#[test]
fn yield_elided_when_generation_already_advanced() {
    let ch = Channel::new(1);
    ch.try_send(1).unwrap();

    // The receive starts now; something else yields before it is awaited.
    let fut = ch.recv();
    block_on(yield_now());

    let g = yield_count();
    assert_eq!(block_on(fut), Received::Value(1));
    assert_eq!(yield_count(), g);
}

#[test]
fn conservation_under_random_try_ops() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let ch = Channel::new(4);
    let mut model: VecDeque<u32> = VecDeque::new();
    let mut next = 0u32;

    for _ in 0..10_000 {
        if rng.gen_bool(0.55) {
            match ch.try_send(next) {
                Ok(()) => {
                    model.push_back(next);
                    next += 1;
                }
                Err(TrySendError::Full(v)) => {
                    assert_eq!(v, next);
                    assert_eq!(model.len(), 4);
                }
                Err(TrySendError::Closed(_)) => unreachable!(),
            }
        } else {
            match ch.try_recv() {
                Some(Received::Value(v)) => assert_eq!(Some(v), model.pop_front()),
                Some(Received::Done(_)) => unreachable!(),
                None => assert!(model.is_empty()),
            }
        }
        assert!(ch.len() <= ch.capacity());
        assert_eq!(ch.len(), model.len());
    }

    ch.close().unwrap();
    for v in ch.try_iter() {
        assert_eq!(Some(v), model.pop_front());
    }
    assert!(model.is_empty());
}

#[test]
fn channel_identity() {
    let a = Channel::<i32>::new(1);
    let b = a.clone();
    let c = Channel::<i32>::new(1);
    assert_eq!(a, b);
    assert_ne!(a, c);
}
