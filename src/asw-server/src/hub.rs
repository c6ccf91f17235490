// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Session hub: turns browser `switch-antenna` events into controller
//! exchanges and fans the resulting antenna state out to every client.
//!
//! Events for one connection (`status`, `catalog`, the greeting state) go
//! through that connection's own unbounded queue. `antenna-state` goes
//! through one broadcast channel. A connection drains its own queue first,
//! so it sees its `status` before the state that follows it. A connection
//! that lags behind the broadcast skips to the latest state.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use asw_core::codec;
use asw_core::{
    AntennaCatalog, AntennaSelector, AntennaState, LinkGuard, RadioId, RadioSet, SerialTransport,
    SwitchError, SwitchResult, SwitchStatus,
};
use asw_protocol::{ServerEvent, StatusPayload, SwitchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Processing,
}

/// Inbound side of one client connection.
///
/// Switch events take `&mut Session`, so a connection handles its events one
/// at a time in receipt order.
pub struct Session {
    id: ConnectionId,
    state: ConnectionState,
    direct: mpsc::UnboundedSender<ServerEvent>,
    hub: Arc<SessionHub>,
}

impl Session {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&self, event: ServerEvent) {
        if self.direct.send(event).is_err() {
            debug!("Client {} outbox closed, event dropped", self.id);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.hub.clients.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Outbound side of one client connection.
pub struct Outbox {
    id: ConnectionId,
    direct: mpsc::UnboundedReceiver<ServerEvent>,
    states: broadcast::Receiver<AntennaState>,
    latest: watch::Receiver<Option<AntennaState>>,
}

impl Outbox {
    /// Next event for this connection. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        loop {
            tokio::select! {
                biased;
                Some(event) = self.direct.recv() => return Some(event),
                received = self.states.recv() => match received {
                    Ok(state) => return Some(ServerEvent::AntennaState(state)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client {} lagging, skipped {} state updates", self.id, n);
                        // Older retained states would overwrite the latest one.
                        self.states = self.states.resubscribe();
                        let latest = self.latest.borrow().clone();
                        if let Some(state) = latest {
                            return Some(ServerEvent::AntennaState(state));
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
            }
        }
    }
}

pub struct SessionHub {
    transport: Arc<SerialTransport>,
    catalog: Arc<AntennaCatalog>,
    radios: RadioSet,
    states: broadcast::Sender<AntennaState>,
    latest: watch::Sender<Option<AntennaState>>,
    clients: AtomicUsize,
}

impl SessionHub {
    pub fn new(
        transport: Arc<SerialTransport>,
        catalog: Arc<AntennaCatalog>,
        radios: RadioSet,
        capacity: usize,
    ) -> Self {
        let (states, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(None);
        Self {
            transport,
            catalog,
            radios,
            states,
            latest,
            clients: AtomicUsize::new(0),
        }
    }

    pub fn catalog(&self) -> &AntennaCatalog {
        &self.catalog
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    /// Register a new connection. The outbox sees every state broadcast
    /// after this call.
    pub fn connect(self: &Arc<Self>) -> (Session, Outbox) {
        let id = ConnectionId::new();
        let (direct_tx, direct_rx) = mpsc::unbounded_channel();
        let outbox = Outbox {
            id,
            direct: direct_rx,
            states: self.states.subscribe(),
            latest: self.latest.subscribe(),
        };
        self.clients.fetch_add(1, Ordering::Relaxed);
        let session = Session {
            id,
            state: ConnectionState::Connected,
            direct: direct_tx,
            hub: Arc::clone(self),
        };
        (session, outbox)
    }

    /// Send the catalog and the controller's current state to a new client.
    pub async fn greet(&self, session: &Session) {
        session.send(ServerEvent::Catalog((*self.catalog).clone()));
        match self.query_state().await {
            Ok(state) => session.send(ServerEvent::AntennaState(state)),
            Err(e) => warn!("Initial state for client {} unavailable: {}", session.id, e),
        }
    }

    /// Handle one `switch-antenna` event from `session`.
    ///
    /// The originator gets a `status` event; on success every client gets the
    /// re-queried `antenna-state`. Failures are reported to the originator
    /// only and never propagate out of the hub.
    pub async fn handle_switch_event(&self, session: &mut Session, request: &SwitchRequest) {
        session.state = ConnectionState::Processing;
        if let Err(e) = self.switch_antenna(session, request).await {
            if e.is_rejection() {
                warn!("Rejected switch request from {}: {}", session.id, e);
            } else {
                error!("Switch request from {} failed: {}", session.id, e);
            }
            self.reject(session, &e);
        }
        session.state = ConnectionState::Connected;
    }

    /// Report a failure to one client.
    pub fn reject(&self, session: &Session, err: &SwitchError) {
        session.send(ServerEvent::Status(StatusPayload::failure(err)));
    }

    /// Query the controller for every radio's antenna.
    pub async fn query_state(&self) -> SwitchResult<AntennaState> {
        let mut link = self.transport.lock().await;
        self.read_state(&mut link).await
    }

    async fn switch_antenna(
        &self,
        origin: &Session,
        request: &SwitchRequest,
    ) -> SwitchResult<SwitchStatus> {
        let (radio, antenna) = self.validate(request)?;
        let line = codec::encode_set(&radio, &antenna)?;

        // One guard covers SET and the follow-up GETs so the broadcast state
        // reflects this command and not a half-applied concurrent one.
        let mut link = self.transport.lock().await;
        let reply = link.execute(&line).await?;
        let status = codec::decode_status(&reply)?;
        match &status {
            SwitchStatus::Accepted(token) => info!(
                "Radio {} -> antenna {} ({}): {}",
                radio,
                antenna,
                if antenna.is_disconnected() {
                    "disconnected"
                } else {
                    self.catalog.name_of(antenna).unwrap_or("unnamed")
                },
                token
            ),
            SwitchStatus::Busy(token) => {
                warn!("Controller busy switching radio {} to antenna {}: {}", radio, antenna, token)
            }
            SwitchStatus::Rejected(token) => warn!(
                "Controller refused radio {} antenna {}: {}",
                radio, antenna, token
            ),
        }
        origin.send(ServerEvent::Status(StatusPayload::from(&status)));

        // A busy controller still answers GET, so refresh regardless.
        let state = self.read_state(&mut link).await?;
        drop(link);
        self.broadcast(state);
        Ok(status)
    }

    fn validate(&self, request: &SwitchRequest) -> SwitchResult<(RadioId, AntennaSelector)> {
        let radio = self.radios.lookup(request.radio).ok_or_else(|| {
            SwitchError::InvalidRequest(format!(
                "radio {} outside 1..={}",
                request.radio,
                self.radios.count()
            ))
        })?;
        let antenna = request
            .antenna
            .as_number()
            .and_then(|raw| self.catalog.lookup(raw))
            .ok_or_else(|| {
                SwitchError::InvalidRequest(format!(
                    "antenna {:?} outside 0..={}",
                    request.antenna,
                    self.catalog.len()
                ))
            })?;
        Ok((radio, antenna))
    }

    async fn read_state(&self, link: &mut LinkGuard<'_>) -> SwitchResult<AntennaState> {
        let mut state = AntennaState::new();
        for radio in self.radios.iter() {
            let reply = link.execute(&codec::encode_get(&radio)?).await?;
            state.insert(radio, codec::decode_get_reply(&reply)?);
        }
        Ok(state)
    }

    fn broadcast(&self, state: AntennaState) {
        self.latest.send_replace(Some(state.clone()));
        if self.states.send(state).is_err() {
            debug!("No clients connected, state dropped");
        }
    }
}
