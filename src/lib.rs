//! Go-style channels and select for single-threaded async tasks.
//!
//! This crate provides two collaborating primitives for cooperative
//! (single-threaded, `!Send`) async code:
//!
//! - [`Channel`]: a typed, optionally buffered, FIFO rendezvous between any
//!   number of senders and receivers, with Go-like close semantics.
//! - [`Select`]: a multiplexer that watches a fixed set of send, receive,
//!   and external-future cases and resolves exactly one ready case per
//!   wait, chosen uniformly at random among the ready ones.
//!
//! Operations suspend by returning futures; cancelling an operation is
//! dropping its future, which withdraws it from the channel's wait queues.
//! Channel and select operations also yield to the scheduler once per call
//! (see [`yield_now`]) so that two tasks ping-ponging through a channel
//! cannot starve the rest of the run queue.
//!
//! # Example
//!
//! ```
//! use futures::executor::LocalPool;
//! use futures::task::LocalSpawnExt;
//! use taskchan::{Channel, Received};
//!
//! let mut pool = LocalPool::new();
//! let spawner = pool.spawner();
//!
//! let ch = Channel::new(0); // unbuffered: every send rendezvouses
//! let tx = ch.clone();
//! spawner
//!     .spawn_local(async move {
//!         for i in 0..3 {
//!             tx.send(i).await.unwrap();
//!         }
//!         tx.close().unwrap();
//!     })
//!     .unwrap();
//!
//! let mut got = Vec::new();
//! pool.run_until(async {
//!     loop {
//!         match ch.recv().await {
//!             Received::Value(v) => got.push(v),
//!             Received::Done(_) => break,
//!         }
//!     }
//! });
//! assert_eq!(got, vec![0, 1, 2]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod buffer;
mod channel;
mod err;
mod protocol;
mod select;
mod utils;
mod yield_now;

pub use buffer::CircularBuffer;
pub use channel::{Channel, Received, RecvFuture, RecvStream, SendFuture, TryIter};
pub use err::{CloseError, Closed, SendError, TrySendError};
pub use protocol::{Fulfill, Receiver, Sender};
pub use select::{RecvHandle, Select, Selecting, SendHandle, TakeFrom, WaitHandle};
pub use yield_now::{yield_count, yield_now, YieldNow};
