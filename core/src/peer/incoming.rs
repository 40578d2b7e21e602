// Copyright 2026 bgpcore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inbound connection driver. Created per accepted connection with a
//! fresh FSM started passively; the transport is already confirmed. When
//! the peer's OPEN arrives the driver arbitrates against the registered
//! outbound session before letting the handshake continue. Falls apart
//! (and unregisters) as soon as the FSM recycles to Idle.

use super::{ConnectionDirection, PeerOp, Registries, TcpConnection, TIMER_RESOLUTION};
use crate::bgp::codec::MessageCodec;
use crate::config::PeerConfig;
use crate::fsm::{BgpState, Fsm, FsmEvent, StartKind, StartMode};
use crate::server::ServerOp;
use crate::{debug, info};
use bytes::BytesMut;
use std::io;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use super::Peer;

impl Peer {
    /// Build the driver for an accepted connection.
    pub fn handler(
        stream: TcpStream,
        config: PeerConfig,
        local_asn: u32,
        local_bgp_id: u32,
        ops_rx: mpsc::UnboundedReceiver<PeerOp>,
        server_tx: mpsc::UnboundedSender<ServerOp>,
        registries: Registries,
    ) -> io::Result<Self> {
        let peer_addr = stream.peer_addr()?;
        let local_addr = stream.local_addr()?;
        let (rx, tx) = stream.into_split();

        let fsm = Fsm::new(local_asn, local_bgp_id, config.clone());
        Ok(Peer {
            addr: peer_addr.ip(),
            port: peer_addr.port(),
            fsm,
            codec: MessageCodec::new(),
            conn: Some(TcpConnection { tx, rx }),
            read_buf: BytesMut::with_capacity(4096),
            statistics: Default::default(),
            config,
            ops_rx,
            server_tx,
            local_addr,
            registries,
            conn_type: ConnectionDirection::Inbound,
            manually_stopped: false,
            last_reported_state: BgpState::Idle,
            last_update_sent: None,
            pending_updates: Vec::new(),
            shutdown: false,
        })
    }

    /// Handler task body: passive start, transport confirmed, then pump
    /// until the FSM recycles.
    pub async fn run_handler(mut self) {
        info!("starting inbound handler", "peer_ip" => self.addr.to_string());

        self.deliver(FsmEvent::Start {
            kind: StartKind::Automatic,
            mode: StartMode::Passive,
        })
        .await;
        self.deliver(FsmEvent::TcpConnectionConfirmed).await;

        let mut tick = tokio::time::interval(TIMER_RESOLUTION);

        loop {
            if self.shutdown || self.fsm.state() == BgpState::Idle || self.conn.is_none() {
                break;
            }

            let Some(conn) = self.conn.as_mut() else {
                break;
            };
            tokio::select! {
                result = conn.rx.read_buf(&mut self.read_buf) => match result {
                    Ok(0) => {
                        debug!("peer closed connection",
                            "peer_ip" => self.addr.to_string());
                        self.deliver(FsmEvent::TcpConnectionFails).await;
                    }
                    Ok(_) => self.drain_messages().await,
                    Err(e) => {
                        debug!("read error",
                            "peer_ip" => self.addr.to_string(),
                            "error" => e.to_string());
                        self.deliver(FsmEvent::TcpConnectionFails).await;
                    }
                },
                op = self.ops_rx.recv() => match op {
                    Some(op) => self.handle_op(op).await,
                    None => self.shutdown = true,
                },
                _ = tick.tick() => {
                    self.check_timers().await;
                }
            }
        }

        self.registries.handlers.unregister(self.addr);
        info!("inbound handler ended", "peer_ip" => self.addr.to_string());
    }
}
