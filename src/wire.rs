use futures::Poll;

use error::Error;
use frame::{Frame, RequestHead, ResponseHead};


/// A bidirectional stream of decoded frames over a single connection
///
/// This is the seam between the request engine and the transport. The
/// HTTP/1.x codecs in this crate implement it over any
/// `AsyncRead + AsyncWrite` and `mock::MockWire` implements it in memory.
///
/// All `poll_*` methods follow the futures convention: they must be called
/// from within a task, and `NotReady` means the task will be woken up.
pub trait Wire {
    /// Type of the heads read from the wire
    type In;
    /// Type of the heads written to the wire
    type Out;

    /// Read next frame
    ///
    /// `Ready(None)` means the peer has closed the stream. Empty
    /// `Frame::Data` terminates a message body.
    fn poll_read(&mut self) -> Poll<Option<Frame<Self::In>>, Error>;

    /// Put a frame into the output buffer
    ///
    /// Frames must be in order: a head, non-empty data frames, and an empty
    /// data frame to finish the message.
    fn start_write(&mut self, frame: Frame<Self::Out>) -> Result<(), Error>;

    /// Write buffered data to the peer
    fn poll_flush(&mut self) -> Poll<(), Error>;

    /// Send end-of-stream and mark the connection as closing
    ///
    /// This is best-effort, errors are ignored as connection is going
    /// away anyway.
    fn write_eof(&mut self);

    /// Reinitialize parsing state
    ///
    /// Must be called after a head-only response (i.e. a response to the
    /// `HEAD` request) so the next read does not wait for a body which was
    /// never sent.
    fn reset(&mut self);

    /// Returns true if no more messages should be sent on this wire
    fn is_closing(&self) -> bool;

    /// Non-blocking check whether peer has already closed the connection
    ///
    /// Also returns true when an unsolicited data is received, because
    /// such a connection can't be reused anyway.
    fn is_closed_by_peer(&mut self) -> bool;
}

/// The wire type used by the client side
pub type ClientWire = Box<Wire<In=ResponseHead, Out=RequestHead>>;

impl<W: Wire + ?Sized> Wire for Box<W> {
    type In = W::In;
    type Out = W::Out;
    fn poll_read(&mut self) -> Poll<Option<Frame<Self::In>>, Error> {
        (**self).poll_read()
    }
    fn start_write(&mut self, frame: Frame<Self::Out>) -> Result<(), Error> {
        (**self).start_write(frame)
    }
    fn poll_flush(&mut self) -> Poll<(), Error> {
        (**self).poll_flush()
    }
    fn write_eof(&mut self) {
        (**self).write_eof()
    }
    fn reset(&mut self) {
        (**self).reset()
    }
    fn is_closing(&self) -> bool {
        (**self).is_closing()
    }
    fn is_closed_by_peer(&mut self) -> bool {
        (**self).is_closed_by_peer()
    }
}
