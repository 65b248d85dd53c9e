//! Error types for channel and select operations.

use std::error;
use std::fmt;

/// An error returned from [`Channel::send`](crate::Channel::send).
///
/// A send operation fails only if the channel has been closed. The message
/// is handed back as the payload so it can be recovered.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Unwraps the message.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskchan::Channel;
    ///
    /// let ch = Channel::<&str>::new(1);
    /// ch.close().unwrap();
    ///
    /// let err = futures::executor::block_on(ch.send("foo")).unwrap_err();
    /// assert_eq!(err.into_inner(), "foo");
    /// ```
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "SendError(..)".fmt(f)
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "sending on a closed channel".fmt(f)
    }
}

impl<T> error::Error for SendError<T> {}

/// The possible failures of [`Channel::try_send`](crate::Channel::try_send).
#[derive(PartialEq, Eq, Clone, Copy)]
pub enum TrySendError<T> {
    /// The message could not be handed off or buffered without blocking.
    ///
    /// On a zero-capacity channel this means no receiver was waiting at the
    /// time.
    Full(T),

    /// The channel has been closed, so the message could never be received.
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Unwraps the message.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(v) => v,
            TrySendError::Closed(v) => v,
        }
    }

    /// Returns `true` if the failure was caused by a full channel.
    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(..))
    }

    /// Returns `true` if the failure was caused by a closed channel.
    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(..))
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TrySendError::Full(..) => "Full(..)".fmt(f),
            TrySendError::Closed(..) => "Closed(..)".fmt(f),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TrySendError::Full(..) => "sending on a full channel".fmt(f),
            TrySendError::Closed(..) => "sending on a closed channel".fmt(f),
        }
    }
}

impl<T> error::Error for TrySendError<T> {}

impl<T> From<SendError<T>> for TrySendError<T> {
    fn from(err: SendError<T>) -> TrySendError<T> {
        TrySendError::Closed(err.0)
    }
}

/// An error returned from [`Channel::close`](crate::Channel::close) when the
/// channel has already been closed.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct CloseError;

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "close of a closed channel".fmt(f)
    }
}

impl error::Error for CloseError {}

/// The channel is closed.
///
/// Returned by [`Channel::add_sender`](crate::Channel::add_sender) and by
/// select operations when a send case targets a closed channel.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Closed;

impl fmt::Display for Closed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "channel is closed".fmt(f)
    }
}

impl error::Error for Closed {}
