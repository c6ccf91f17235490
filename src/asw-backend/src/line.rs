// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_serial::{ClearBuffer, SerialPort, SerialStream};
use tracing::debug;

use asw_core::{LineFuture, LineIo};

/// Streams that can drop input queued below the userspace buffer.
pub trait PendingInput {
    fn clear_pending(&self) {}
}

impl PendingInput for SerialStream {
    fn clear_pending(&self) {
        if let Err(e) = self.clear(ClearBuffer::Input) {
            debug!("Failed to clear serial input: {}", e);
        }
    }
}

impl PendingInput for TcpStream {
    fn clear_pending(&self) {
        let mut scratch = [0u8; 256];
        loop {
            match self.try_read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => debug!("Discarded {} stale bytes from TCP link", n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!("Failed to drain TCP link: {}", e);
                    break;
                }
            }
        }
    }
}

/// Newline-framed link over any byte stream.
pub struct BufferedLine<S> {
    stream: BufReader<S>,
}

impl<S: AsyncRead> BufferedLine<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }
}

impl<S> LineIo for BufferedLine<S>
where
    S: AsyncRead + AsyncWrite + PendingInput + Unpin + Send,
{
    fn write_line<'a>(&'a mut self, line: &'a str) -> LineFuture<'a, ()> {
        Box::pin(async move {
            let port = self.stream.get_mut();
            port.write_all(line.as_bytes()).await?;
            port.flush().await
        })
    }

    fn read_line<'a>(&'a mut self) -> LineFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let mut buf = Vec::new();
            let read = self.stream.read_until(b'\n', &mut buf).await?;
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "controller closed the link",
                ));
            }
            Ok(buf)
        })
    }

    fn discard_input(&mut self) {
        let buffered = self.stream.buffer().len();
        self.stream.consume(buffered);
        self.stream.get_ref().clear_pending();
    }
}
