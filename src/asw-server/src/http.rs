// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use tokio::signal;
use tracing::info;

use crate::api;
use crate::hub::SessionHub;

pub async fn serve(addr: SocketAddr, hub: Arc<SessionHub>) -> std::io::Result<()> {
    let server = build_server(addr, hub)?;
    let handle = server.handle();
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        info!("Shutting down");
        handle.stop(false).await;
    });
    info!("WebSocket channel listening on ws://{}/ws", addr);
    server.await
}

fn build_server(addr: SocketAddr, hub: Arc<SessionHub>) -> std::io::Result<Server> {
    let hub = web::Data::new(hub);
    let server = HttpServer::new(move || App::new().app_data(hub.clone()).configure(api::configure))
        .shutdown_timeout(1)
        .disable_signals()
        .bind(addr)?
        .run();
    Ok(server)
}
