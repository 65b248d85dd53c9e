//! End-to-end scenarios exercising Go-style channel semantics.

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use taskchan::{Channel, Received, Select};

/// The classic concurrent prime sieve: a generator feeds candidate numbers
/// into a chain of filter tasks, one per prime found so far.
fn sieve_primes(count: usize) -> Vec<u64> {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    pool.run_until(async move {
        let mut primes = Vec::with_capacity(count);
        let mut src = Channel::<u64>::new(0);

        {
            let src = src.clone();
            spawner
                .spawn_local(async move {
                    let mut n = 2u64;
                    loop {
                        if src.send(n).await.is_err() {
                            break;
                        }
                        n += 1;
                    }
                })
                .unwrap();
        }

        for _ in 0..count {
            let prime = match src.recv().await {
                Received::Value(v) => v,
                Received::Done(_) => unreachable!("generator never closes"),
            };
            primes.push(prime);

            let out = Channel::<u64>::new(0);
            {
                let inp = src.clone();
                let out = out.clone();
                spawner
                    .spawn_local(async move {
                        loop {
                            match inp.recv().await {
                                Received::Value(v) => {
                                    if v % prime != 0 && out.send(v).await.is_err() {
                                        break;
                                    }
                                }
                                Received::Done(_) => break,
                            }
                        }
                    })
                    .unwrap();
            }
            src = out;
        }
        primes
    })
}

#[test]
fn concurrent_prime_sieve() {
    assert_eq!(
        sieve_primes(10),
        vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]
    );
}

#[test]
fn ping_pong() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ping = Channel::<u32>::new(0);
    let pong = Channel::<u32>::new(0);

    {
        let ping = ping.clone();
        let pong = pong.clone();
        spawner
            .spawn_local(async move {
                loop {
                    match ping.recv().await {
                        Received::Value(v) => pong.send(v + 1).await.unwrap(),
                        Received::Done(_) => break,
                    }
                }
            })
            .unwrap();
    }

    pool.run_until(async {
        for i in 0..100 {
            ping.send(i).await.unwrap();
            assert_eq!(pong.recv().await, Received::Value(i + 1));
        }
        ping.close().unwrap();
    });
}

#[test]
fn fan_in_multiplexes_two_sources() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let a = Channel::<(&'static str, u32)>::new(0);
    let b = Channel::<(&'static str, u32)>::new(0);

    for (name, ch) in [("a", a.clone()), ("b", b.clone())] {
        spawner
            .spawn_local(async move {
                for i in 0..50 {
                    ch.send((name, i)).await.unwrap();
                }
                ch.close().unwrap();
            })
            .unwrap();
    }

    let (got_a, got_b) = pool.run_until(async {
        let mut sel = Select::new();
        let ra = sel.recv(&a);
        let rb = sel.recv(&b);

        let mut open_a = true;
        let mut open_b = true;
        let mut got_a = 0;
        let mut got_b = 0;

        while open_a || open_b {
            let i = sel.select().await.unwrap();
            if i == ra.index() {
                match sel.take(&ra) {
                    Received::Value(("a", _)) => got_a += 1,
                    Received::Value(_) => unreachable!(),
                    Received::Done(_) => open_a = false,
                }
            } else if i == rb.index() {
                match sel.take(&rb) {
                    Received::Value(("b", _)) => got_b += 1,
                    Received::Value(_) => unreachable!(),
                    Received::Done(_) => open_b = false,
                }
            } else {
                unreachable!();
            }
        }
        (got_a, got_b)
    });

    assert_eq!(got_a, 50);
    assert_eq!(got_b, 50);
}

#[test]
fn close_wakes_every_receiver() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::<u32>::new(0);
    let done = std::rc::Rc::new(std::cell::Cell::new(0));

    for _ in 0..4 {
        let ch = ch.clone();
        let done = done.clone();
        spawner
            .spawn_local(async move {
                assert_eq!(ch.recv().await, Received::Done(None));
                done.set(done.get() + 1);
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ch.concurrency(), -4);

    ch.close().unwrap();
    pool.run();
    assert_eq!(done.get(), 4);
}

#[test]
fn buffered_handoff_respects_fifo_with_waiting_senders() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    // Capacity 2, four eager senders: two fill the buffer, two park.
    let ch = Channel::<u32>::new(2);
    for i in 0..4 {
        let ch = ch.clone();
        spawner
            .spawn_local(async move {
                ch.send(i).await.unwrap();
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ch.len(), 2);
    assert_eq!(ch.concurrency(), 2);

    let got = pool.run_until(async {
        let mut got = Vec::new();
        for _ in 0..4 {
            got.push(ch.recv().await.value().unwrap());
        }
        got
    });
    assert_eq!(got, vec![0, 1, 2, 3]);
}

#[test]
fn close_fails_parked_senders_when_buffer_stays_full() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let ch = Channel::<u32>::new(2);
    for i in 0..3 {
        let ch = ch.clone();
        spawner
            .spawn_local(async move {
                // The third send parks; on close it fails because the
                // buffer is still full.
                let _ = ch.send(i).await;
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ch.concurrency(), 1);

    ch.close().unwrap();
    pool.run();

    assert_eq!(ch.try_recv(), Some(Received::Value(0)));
    assert_eq!(ch.try_recv(), Some(Received::Value(1)));
    assert_eq!(ch.try_recv(), Some(Received::Done(None)));
}
