// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::sync::Arc;

use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use tracing::warn;

use asw_core::SwitchError;
use asw_protocol::StatusPayload;

use crate::hub::SessionHub;

#[derive(Serialize)]
struct ClientCount {
    clients: usize,
}

/// Antenna catalog in controller port order.
#[get("/api/antennas")]
pub async fn antennas(hub: web::Data<Arc<SessionHub>>) -> impl Responder {
    HttpResponse::Ok().json(hub.catalog())
}

#[get("/api/antenna/{index}")]
pub async fn antenna(hub: web::Data<Arc<SessionHub>>, index: web::Path<u64>) -> impl Responder {
    let index = index.into_inner();
    match hub.catalog().get(index) {
        Some(descriptor) => HttpResponse::Ok().json(descriptor),
        None => HttpResponse::BadRequest().json(StatusPayload::failure(
            &SwitchError::InvalidRequest(format!("no antenna {}", index)),
        )),
    }
}

/// Controller-reported antenna for every radio, queried fresh.
#[get("/api/state")]
pub async fn state(hub: web::Data<Arc<SessionHub>>) -> impl Responder {
    match hub.query_state().await {
        Ok(state) => HttpResponse::Ok().json(state),
        Err(e) => {
            warn!("State query failed: {}", e);
            HttpResponse::ServiceUnavailable().json(StatusPayload::failure(&e))
        }
    }
}

#[get("/api/clients")]
pub async fn clients(hub: web::Data<Arc<SessionHub>>) -> impl Responder {
    HttpResponse::Ok().json(ClientCount {
        clients: hub.connected_clients(),
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(antennas)
        .service(antenna)
        .service(state)
        .service(clients)
        .service(crate::ws::switch_ws);
}
