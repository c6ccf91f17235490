// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::sync::Arc;

use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use tracing::{debug, info, warn};

use asw_core::SwitchError;
use asw_protocol::{encode_server_event, parse_client_event, ClientEvent};

use crate::hub::SessionHub;

#[get("/ws")]
pub async fn switch_ws(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<Arc<SessionHub>>,
) -> Result<HttpResponse, Error> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let hub = hub.get_ref().clone();
    let peer = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    actix_web::rt::spawn(async move {
        let (mut client, mut outbox) = hub.connect();
        info!(
            "Client {} connected from {} ({} online)",
            client.id(),
            peer,
            hub.connected_clients()
        );

        let mut tx_session = session.clone();
        let tx_handle = actix_web::rt::spawn(async move {
            while let Some(event) = outbox.recv().await {
                let text = match encode_server_event(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode event: {}", e);
                        continue;
                    }
                };
                if tx_session.text(text).await.is_err() {
                    break;
                }
            }
        });

        hub.greet(&client).await;

        while let Some(Ok(msg)) = msg_stream.recv().await {
            match msg {
                Message::Text(text) => match parse_client_event(&text) {
                    Ok(ClientEvent::SwitchAntenna(request)) => {
                        debug!("Client {} switch request {:?}", client.id(), request);
                        hub.handle_switch_event(&mut client, &request).await;
                    }
                    Err(e) => {
                        warn!("Malformed event from {}: {}", client.id(), e);
                        hub.reject(&client, &SwitchError::InvalidRequest(e.to_string()));
                    }
                },
                Message::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        tx_handle.abort();
        let _ = session.close(None).await;
        let id = client.id();
        debug!("Client {} closing in state {:?}", id, client.state());
        drop(client);
        info!(
            "Client {} disconnected ({} online)",
            id,
            hub.connected_clients()
        );
    });

    Ok(response)
}
