use std::io;

use httparse::Error as HttpError;
use httparse::InvalidChunkSize;

use base_serializer::HeaderError;


quick_error! {
    #[derive(Debug)]
    /// Error of a client request or of a served connection
    pub enum Error {
        /// Url is not an absolute `http://` or `https://` url
        InvalidUrl {
            description("invalid url")
        }
        /// Scheme is not supported by the transport (`https` over plain TCP)
        UnsupportedScheme {
            description("scheme of this url is not supported by transport")
        }
        /// Connection closed before response headers on a fresh connection
        ConnectionClosed {
            description("connection closed before response headers")
        }
        /// Redirect status received but there is no `Location` header
        NoLocationHeader {
            description("redirect response has no location header")
        }
        /// Redirect chain is longer than `Config::max_redirects`
        TooManyRedirects {
            description("too many redirects")
        }
        /// Connection was not established within the configured timeout
        Timeout {
            description("connection timed out")
        }
        /// I/O (basically networking) error occured during request
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            from()
        }
        /// Name resolution error
        Name(err: io::Error) {
            description("name resolution error")
            display("name resolution error: {}", err)
        }
        /// Name resolved to an empty list of addresses
        NameNotFound {
            description("name resolved to no addresses")
        }
        /// Bad message head received
        Header(err: HttpError) {
            description("bad headers")
            display("bad headers: {}", err)
            from()
        }
        /// Bad chunk size received
        ChunkSize(err: InvalidChunkSize) {
            description("invalid chunk size")
            display("invalid chunk size: {}", err)
            from()
        }
        /// Message head can't be serialized
        Serialize(err: HeaderError) {
            description("can't serialize message head")
            display("can't serialize message head: {}", err)
            from()
        }
        /// Bad `Content-Length` header
        BadContentLength {
            description("bad content length")
        }
        /// Duplicate `Content-Length` header
        DuplicateContentLength {
            description("duplicate content length")
        }
        /// Connection reset by peer when reading response headers
        ResetOnResponseHeaders {
            description("connection closed prematurely while reading headers")
        }
        /// Connection reset by peer when reading response body
        ResetOnResponseBody {
            description("connection closed prematurely while reading body")
        }
        /// Connection reset by peer when reading request body
        ResetOnRequestBody {
            description("connection closed prematurely while reading \
                         request body")
        }
        /// Wire yielded a head where body was expected or vice versa
        UnexpectedFrame {
            description("unexpected frame received")
        }
        /// Response body is larger than `Config::max_response_length`
        ResponseBodyTooLong {
            description("response body is too long")
        }
        /// Request body is larger than server's `max_request_length`
        RequestTooLong {
            description("request body is too long")
        }
    }
}
