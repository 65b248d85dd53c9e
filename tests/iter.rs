//! Tests for the synchronous and asynchronous drain adapters.

use futures::executor::LocalPool;
use futures::stream::StreamExt;
use futures::task::LocalSpawnExt;
use taskchan::Channel;

#[test]
fn try_iter_drains_what_is_ready() {
    let ch = Channel::new(3);
    assert_eq!(ch.try_iter().count(), 0);

    ch.try_send(1).unwrap();
    ch.try_send(2).unwrap();
    let drained: Vec<i32> = ch.try_iter().collect();
    assert_eq!(drained, vec![1, 2]);

    // The iterator does not wait for more messages.
    ch.try_send(3).unwrap();
    assert_eq!(ch.try_iter().collect::<Vec<_>>(), vec![3]);
}

#[test]
fn try_iter_stops_at_the_closed_marker() {
    let ch = Channel::with_default(2, || -1);
    ch.try_send(1).unwrap();
    ch.close().unwrap();

    assert_eq!(ch.try_iter().collect::<Vec<_>>(), vec![1]);
    // The default is not part of the drain.
    assert_eq!(ch.try_iter().count(), 0);
}

#[test]
fn stream_yields_until_closed() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::new(3);
    {
        let ch = ch.clone();
        spawner
            .spawn_local(async move {
                for i in 0..10 {
                    ch.send(i).await.unwrap();
                }
                ch.close().unwrap();
            })
            .unwrap();
    }

    let all: Vec<i32> = pool.run_until(ch.stream().collect());
    assert_eq!(all, (0..10).collect::<Vec<_>>());
}

#[test]
fn stream_ends_immediately_on_a_closed_empty_channel() {
    let ch = Channel::<i32>::new(1);
    ch.close().unwrap();
    let all: Vec<i32> = futures::executor::block_on(ch.stream().collect());
    assert!(all.is_empty());
}

#[test]
fn dropping_a_stream_withdraws_its_waiter() {
    use futures::stream::Stream;
    use futures::task::noop_waker;
    use std::pin::Pin;
    use std::task::Context;

    let ch = Channel::<i32>::new(0);
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    let mut stream = ch.stream();
    assert!(Pin::new(&mut stream).poll_next(&mut cx).is_pending());
    assert_eq!(ch.concurrency(), -1);

    drop(stream);
    assert_eq!(ch.concurrency(), 0);
}
