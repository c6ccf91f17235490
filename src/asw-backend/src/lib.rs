// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Links to the antenna switch controller.

use std::io;

use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

use asw_core::{Connector, LineFuture, LineIo};

mod dummy;
mod line;

pub use dummy::DummySwitch;
pub use line::{BufferedLine, PendingInput};

/// Connection details for reaching the switch controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAccess {
    /// RS-485/USB serial adapter.
    Serial { path: String, baud: u32 },
    /// Serial-over-TCP bridge.
    Tcp { addr: String },
    /// In-memory controller, no hardware required.
    Dummy { radios: u8, antennas: u8 },
}

/// Open a line link for the given access method.
pub async fn open_link(access: &LinkAccess) -> io::Result<Box<dyn LineIo>> {
    match access {
        LinkAccess::Serial { path, baud } => {
            let port = tokio_serial::new(path.as_str(), *baud).open_native_async()?;
            info!("Serial: {} @ {} baud", path, baud);
            Ok(Box::new(BufferedLine::new(port)))
        }
        LinkAccess::Tcp { addr } => {
            let stream = TcpStream::connect(addr.as_str()).await?;
            stream.set_nodelay(true)?;
            info!("TCP serial bridge: {}", addr);
            Ok(Box::new(BufferedLine::new(stream)))
        }
        LinkAccess::Dummy { radios, antennas } => {
            info!(
                "Dummy controller: {} radios, {} antennas",
                radios, antennas
            );
            Ok(Box::new(DummySwitch::new(*radios, *antennas)))
        }
    }
}

/// Build a connector that reopens the same link after a failure.
pub fn connector(access: LinkAccess) -> Connector {
    Box::new(move || -> LineFuture<'static, Box<dyn LineIo>> {
        let access = access.clone();
        Box::pin(async move { open_link(&access).await })
    })
}
