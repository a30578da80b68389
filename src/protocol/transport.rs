// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound line transport.

use std::future::Future;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// The receiver's line terminator.
pub const LINE_TERMINATOR: char = '\r';

/// Writes whole protocol lines to a receiver.
///
/// Implementations must write a line completely or fail; a line is never
/// left half written on success. A line holding an interior terminator
/// would reach the receiver as several commands and must be refused; see
/// [`check_line`].
pub trait Transport {
    /// Writes one line, appending [`LINE_TERMINATOR`] if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the line could not be written.
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Validates one outbound line and returns it without its terminator.
///
/// # Errors
///
/// Returns `TransportError::InvalidLine` if the line contains a CR or LF
/// other than one trailing terminator, or any non-ASCII character.
///
/// # Examples
///
/// ```
/// use niles_lib::protocol::check_line;
///
/// assert_eq!(check_line("znc,5\r").unwrap(), "znc,5");
/// assert!(check_line("znc,5\rznt,10,h").is_err());
/// assert!(check_line("src,11,café").is_err());
/// ```
pub fn check_line(line: &str) -> Result<&str, TransportError> {
    let body = line.strip_suffix(LINE_TERMINATOR).unwrap_or(line);
    let reason = if body.contains(['\r', '\n']) {
        "embedded line terminator"
    } else if !body.is_ascii() {
        "non-ASCII text"
    } else {
        return Ok(body);
    };
    Err(TransportError::InvalidLine {
        line: line.to_string(),
        reason,
    })
}

/// [`Transport`] over any async byte writer, such as the write half of a
/// TCP stream or serial port.
///
/// # Examples
///
/// ```
/// use niles_lib::protocol::{StreamTransport, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut transport = StreamTransport::new(Vec::new());
/// transport.write_line("znc,5").await.unwrap();
/// assert_eq!(transport.into_inner(), b"znc,5\r");
/// # }
/// ```
#[derive(Debug)]
pub struct StreamTransport<W> {
    writer: W,
}

impl<W> StreamTransport<W> {
    /// Wraps a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> Transport for StreamTransport<W> {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let body = check_line(line)?;
        let mut framed = String::with_capacity(body.len() + 1);
        framed.push_str(body);
        framed.push(LINE_TERMINATOR);
        self.writer.write_all(framed.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_terminator() {
        let mut transport = StreamTransport::new(Vec::new());
        transport.write_line("zsc,1,12").await.unwrap();
        transport.write_line("znc,5\r").await.unwrap();
        assert_eq!(transport.into_inner(), b"zsc,1,12\rznc,5\r");
    }

    #[tokio::test]
    async fn closed_stream_fails() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut transport = StreamTransport::new(client);
        let err = transport.write_line("znc,5").await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[tokio::test]
    async fn refuses_line_that_would_split() {
        let mut transport = StreamTransport::new(Vec::new());
        for line in ["znc,5\rznt,10,h", "src,11,101.1\nzsc,1,10", "znc,5\r\r"] {
            let err = transport.write_line(line).await.unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidLine { reason: "embedded line terminator", .. }),
                "{line:?}"
            );
        }
        assert!(transport.into_inner().is_empty());
    }

    #[tokio::test]
    async fn refuses_non_ascii() {
        let mut transport = StreamTransport::new(Vec::new());
        let err = transport.write_line("src,11,Caf\u{e9}").await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidLine { reason: "non-ASCII text", .. }));
        assert!(transport.into_inner().is_empty());
    }
}
