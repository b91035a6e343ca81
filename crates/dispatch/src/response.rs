//! The response handle a [`Context`](crate::Context) writes into.
//!
//! The status line is write-once: the first [`Response::write_header`] (or the
//! first body write, which implies `200 OK`) commits it and later attempts are
//! ignored. The body is buffered until the transport takes the response with
//! [`Response::into_http`].

use crate::body::ResponseBody;
use bytes::BytesMut;
use http::{HeaderMap, StatusCode};
use std::io;
use tracing::warn;

#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    committed: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), body: BytesMut::new(), committed: false }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns true once the status has been written.
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// The bytes written to the body so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Commits `status`. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            warn!(current = %self.status, ignored = %status, "response already committed");
            return;
        }
        self.status = status;
        self.committed = true;
    }

    /// Appends `bytes` to the body, committing `200 OK` first when nothing was committed yet.
    pub fn write_body(&mut self, bytes: &[u8]) {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
    }

    pub fn into_http(self) -> http::Response<ResponseBody> {
        let mut response = http::Response::new(ResponseBody::once(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl io::Write for Response {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
