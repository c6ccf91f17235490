// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Exclusive request/response access to the switch controller link.
//!
//! The controller has a single half-duplex line with no request identifiers,
//! so a write and the reply that follows it must never interleave with any
//! other exchange. [`SerialTransport`] owns the link behind an async mutex;
//! every exchange runs while holding [`LinkGuard`], and the guard is dropped
//! on every exit path, timeouts and errors included.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{SwitchError, SwitchResult};

pub type LineFuture<'a, T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send + 'a>>;

/// A byte link to the controller that moves whole lines.
pub trait LineIo: Send {
    /// Write one complete request line and flush it.
    fn write_line<'a>(&'a mut self, line: &'a str) -> LineFuture<'a, ()>;

    /// Read bytes up to and including the next `\n`.
    ///
    /// End of stream is reported as `UnexpectedEof`.
    fn read_line<'a>(&'a mut self) -> LineFuture<'a, Vec<u8>>;

    /// Drop input that arrived outside of an exchange.
    fn discard_input(&mut self) {}
}

/// Reopens the link after an I/O failure.
pub type Connector = Box<dyn Fn() -> LineFuture<'static, Box<dyn LineIo>> + Send + Sync>;

/// Sole owner of the controller link.
pub struct SerialTransport {
    link: Mutex<Option<Box<dyn LineIo>>>,
    connector: Option<Connector>,
    timeout: Duration,
}

impl SerialTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

    pub fn new(link: Box<dyn LineIo>, timeout: Duration) -> Self {
        Self {
            link: Mutex::new(Some(link)),
            connector: None,
            timeout,
        }
    }

    /// Reconnect through `connector` on the first exchange after a link failure.
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for exclusive use of the link.
    ///
    /// Several exchanges issued through one guard run back to back with no
    /// other caller in between.
    pub async fn lock(&self) -> LinkGuard<'_> {
        LinkGuard {
            link: self.link.lock().await,
            transport: self,
        }
    }

    /// Send one request line and return the trimmed response line.
    pub async fn execute(&self, request: &str) -> SwitchResult<String> {
        self.lock().await.execute(request).await
    }

    /// Ask the controller for its identification banner.
    pub async fn identify(&self) -> SwitchResult<String> {
        self.execute(codec::encode_identify()).await
    }

    async fn reconnect(&self) -> SwitchResult<Box<dyn LineIo>> {
        let Some(connector) = self.connector.as_ref() else {
            return Err(SwitchError::Disconnected);
        };
        match connector().await {
            Ok(link) => {
                info!("Controller link reopened");
                Ok(link)
            }
            Err(e) => {
                warn!("Controller link reconnect failed: {}", e);
                Err(SwitchError::Disconnected)
            }
        }
    }
}

/// Exclusive access to the link, released on drop.
pub struct LinkGuard<'a> {
    link: MutexGuard<'a, Option<Box<dyn LineIo>>>,
    transport: &'a SerialTransport,
}

impl LinkGuard<'_> {
    /// Send one request line and return the trimmed response line.
    ///
    /// An I/O failure drops the link so the next exchange reconnects.
    pub async fn execute(&mut self, request: &str) -> SwitchResult<String> {
        if !request.ends_with('\n') {
            return Err(SwitchError::InvalidRequest(format!(
                "request line {:?} is not newline terminated",
                request
            )));
        }
        if self.link.is_none() {
            let link = self.transport.reconnect().await?;
            *self.link = Some(link);
        }
        let Some(link) = self.link.as_mut() else {
            return Err(SwitchError::Disconnected);
        };

        let result = exchange(link.as_mut(), request, self.transport.timeout).await;
        if let Err(SwitchError::Io(e)) = &result {
            warn!("Controller link failed, dropping it: {}", e);
            *self.link = None;
        }
        result
    }
}

async fn exchange(link: &mut dyn LineIo, request: &str, bound: Duration) -> SwitchResult<String> {
    link.discard_input();
    debug!("controller <- {}", request.trim_end());

    let raw = timeout(bound, async {
        link.write_line(request).await?;
        link.read_line().await
    })
    .await
    .map_err(|_| SwitchError::ProtocolTimeout(bound))??;

    let text = String::from_utf8(raw)
        .map_err(|e| SwitchError::DecodeError(format!("response is not UTF-8: {}", e)))?;
    let line = text.trim();
    if line.is_empty() {
        return Err(SwitchError::DecodeError("empty response line".into()));
    }
    debug!("controller -> {}", line);
    Ok(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    enum Reply {
        Line(&'static [u8]),
        Silent,
        Fail,
    }

    struct ScriptedLink {
        replies: VecDeque<Reply>,
        written: Arc<StdMutex<Vec<String>>>,
        discards: Arc<AtomicUsize>,
    }

    impl ScriptedLink {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: replies.into(),
                written: Arc::new(StdMutex::new(Vec::new())),
                discards: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl LineIo for ScriptedLink {
        fn write_line<'a>(&'a mut self, line: &'a str) -> LineFuture<'a, ()> {
            self.written.lock().unwrap().push(line.to_string());
            Box::pin(async { Ok(()) })
        }

        fn read_line<'a>(&'a mut self) -> LineFuture<'a, Vec<u8>> {
            let next = self.replies.pop_front();
            Box::pin(async move {
                match next {
                    Some(Reply::Line(bytes)) => Ok(bytes.to_vec()),
                    Some(Reply::Fail) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")),
                    Some(Reply::Silent) | None => std::future::pending().await,
                }
            })
        }

        fn discard_input(&mut self) {
            self.discards.fetch_add(1, Ordering::SeqCst);
        }
    }

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_execute_returns_trimmed_line() {
        let link = ScriptedLink::new(vec![Reply::Line(b"+OK\r\n")]);
        let written = link.written.clone();
        let discards = link.discards.clone();
        let transport = SerialTransport::new(Box::new(link), SHORT);

        assert_eq!(transport.execute("SET 1 3\n").await.unwrap(), "+OK");
        assert_eq!(*written.lock().unwrap(), vec!["SET 1 3\n".to_string()]);
        assert_eq!(discards.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_releases_lock() {
        let link = ScriptedLink::new(vec![Reply::Silent, Reply::Line(b"2\n")]);
        let transport = SerialTransport::new(Box::new(link), SHORT);

        let started = tokio::time::Instant::now();
        let err = transport.execute("GET 1\n").await.unwrap_err();
        assert!(matches!(err, SwitchError::ProtocolTimeout(_)));
        assert!(started.elapsed() < SHORT * 10);

        assert_eq!(transport.execute("GET 1\n").await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_decode_failures_surface() {
        let link = ScriptedLink::new(vec![Reply::Line(b"\xff\xfe\n"), Reply::Line(b"\r\n")]);
        let transport = SerialTransport::new(Box::new(link), SHORT);

        assert!(matches!(
            transport.execute("GET 1\n").await,
            Err(SwitchError::DecodeError(_))
        ));
        assert!(matches!(
            transport.execute("GET 1\n").await,
            Err(SwitchError::DecodeError(_))
        ));
    }

    #[tokio::test]
    async fn test_unterminated_request_rejected_before_io() {
        let link = ScriptedLink::new(vec![]);
        let written = link.written.clone();
        let transport = SerialTransport::new(Box::new(link), SHORT);

        assert!(matches!(
            transport.execute("GET 1").await,
            Err(SwitchError::InvalidRequest(_))
        ));
        assert!(written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_io_failure_without_connector_disconnects() {
        let link = ScriptedLink::new(vec![Reply::Fail]);
        let transport = SerialTransport::new(Box::new(link), SHORT);

        assert!(matches!(
            transport.execute("GET 1\n").await,
            Err(SwitchError::Io(_))
        ));
        assert!(matches!(
            transport.execute("GET 1\n").await,
            Err(SwitchError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_io_failure_reconnects() {
        let link = ScriptedLink::new(vec![Reply::Fail]);
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = opened.clone();
        let connector: Connector = Box::new(move || -> LineFuture<'static, Box<dyn LineIo>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                let fresh: Box<dyn LineIo> = Box::new(ScriptedLink::new(vec![Reply::Line(b"4\n")]));
                Ok(fresh)
            })
        });
        let transport = SerialTransport::new(Box::new(link), SHORT).with_connector(connector);

        assert!(transport.execute("GET 2\n").await.is_err());
        assert_eq!(transport.execute("GET 2\n").await.unwrap(), "4");
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_guard_batches_exchanges() {
        let link = ScriptedLink::new(vec![
            Reply::Line(b"OK\n"),
            Reply::Line(b"3\n"),
            Reply::Line(b"0\n"),
        ]);
        let written = link.written.clone();
        let transport = SerialTransport::new(Box::new(link), SHORT);

        let mut guard = transport.lock().await;
        assert_eq!(guard.execute("SET 1 3\n").await.unwrap(), "OK");
        assert_eq!(guard.execute("GET 1\n").await.unwrap(), "3");
        assert_eq!(guard.execute("GET 2\n").await.unwrap(), "0");
        drop(guard);

        assert_eq!(written.lock().unwrap().len(), 3);
    }
}
