// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod antenna;
pub mod codec;
pub mod error;
pub mod radio;
pub mod status;
pub mod transport;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use antenna::{AntennaCatalog, AntennaDescriptor, AntennaSelector, AntennaState};
pub use error::{SwitchError, SwitchResult};
pub use radio::{RadioId, RadioSet};
pub use status::SwitchStatus;
pub use transport::{Connector, LineFuture, LineIo, LinkGuard, SerialTransport};
