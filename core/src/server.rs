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

//! The speaker: spawns one session task per configured peer, accepts
//! inbound connections into handler tasks, and forwards surfaced UPDATEs
//! to the route engine seam.

use crate::bgp::msg::{Message, PRE_OPEN_FORMAT};
use crate::bgp::msg_notification::{BgpError, CeaseSubcode, NotificationMessage};
use crate::bgp::msg_update::UpdateMessage;
use crate::config::{Config, PeerConfig};
use crate::fsm::BgpState;
use crate::net::peer_ip;
use crate::peer::{Peer, PeerHandle, PeerOp, PeerStatistics, Registries};
use crate::{error, info, warn};
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

/// Errors that can occur during server initialization or operation.
#[derive(Debug)]
pub enum ServerError {
    InvalidListenAddr(String),
    BindError(io::Error),
    IoError(io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::InvalidListenAddr(addr) => write!(f, "Invalid listen address: {}", addr),
            ServerError::BindError(e) => write!(f, "Failed to bind listener: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

/// Consumer of decoded UPDATE messages; the route decision engine plugs
/// in here.
pub trait RouteProcessor: Send + Sync {
    fn process_update(&self, peer_ip: IpAddr, update: UpdateMessage);
}

/// Default sink: log and drop. Route decision is outside this crate.
pub struct LogRouteProcessor;

impl RouteProcessor for LogRouteProcessor {
    fn process_update(&self, peer_ip: IpAddr, update: UpdateMessage) {
        info!("update received",
            "peer_ip" => peer_ip.to_string(),
            "announced" => update.nlri_list().len(),
            "withdrawn" => update.withdrawn_routes().len());
    }
}

/// Reports sent from peer tasks to the server loop.
pub enum ServerOp {
    StateChanged {
        peer_ip: IpAddr,
        state: BgpState,
    },
    /// Decoded UPDATE surfaced by an established session.
    UpdateReceived {
        peer_ip: IpAddr,
        update: UpdateMessage,
    },
}

/// Per-peer bookkeeping held by the server.
pub struct PeerInfo {
    pub state: BgpState,
    pub config: PeerConfig,
    pub session: PeerHandle,
}

impl PeerInfo {
    pub async fn get_statistics(&self) -> Option<PeerStatistics> {
        let (tx, rx) = oneshot::channel();
        self.session.send(PeerOp::GetStatistics(tx)).ok()?;
        rx.await.ok()
    }
}

pub struct BgpServer {
    config: Config,
    peers: HashMap<IpAddr, PeerInfo>,
    registries: Registries,
    route_processor: Arc<dyn RouteProcessor>,
    op_tx: mpsc::UnboundedSender<ServerOp>,
    op_rx: mpsc::UnboundedReceiver<ServerOp>,
    local_bgp_id: u32,
    local_addr: SocketAddr,
    listener: Option<TcpListener>,
}

impl BgpServer {
    pub fn new(config: Config) -> Result<Self, ServerError> {
        BgpServer::with_route_processor(config, Arc::new(LogRouteProcessor))
    }

    pub fn with_route_processor(
        config: Config,
        route_processor: Arc<dyn RouteProcessor>,
    ) -> Result<Self, ServerError> {
        let local_bgp_id = u32::from(config.router_id);
        let local_addr = config
            .get_local_addr()
            .map_err(|_| ServerError::InvalidListenAddr(config.listen_addr.clone()))?;

        let (op_tx, op_rx) = mpsc::unbounded_channel();

        Ok(BgpServer {
            config,
            peers: HashMap::new(),
            registries: Registries::default(),
            route_processor,
            op_tx,
            op_rx,
            local_bgp_id,
            local_addr,
            listener: None,
        })
    }

    /// Operator handle for a configured peer's session task.
    pub fn peer_handle(&self, peer: IpAddr) -> Option<PeerHandle> {
        self.peers.get(&peer).map(|info| info.session.clone())
    }

    pub fn peer_state(&self, peer: IpAddr) -> Option<BgpState> {
        self.peers.get(&peer).map(|info| info.state)
    }

    /// Bind the listening socket. Returns the bound address, which is the
    /// configured one unless port 0 asked the OS to pick.
    pub async fn listen(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(ServerError::BindError)?;
        let bound = listener.local_addr().map_err(ServerError::IoError)?;
        self.listener = Some(listener);
        info!("BGP server listening", "listen_addr" => bound.to_string());
        Ok(bound)
    }

    /// Serve forever: spawn configured sessions, accept inbound
    /// connections, relay peer reports.
    pub async fn serve(mut self) -> Result<(), ServerError> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => {
                let listener = TcpListener::bind(&self.config.listen_addr)
                    .await
                    .map_err(ServerError::BindError)?;
                info!("BGP server listening",
                    "listen_addr" => listener.local_addr().map_err(ServerError::IoError)?.to_string());
                listener
            }
        };

        if !self.config.networks.is_empty() {
            info!("configured origination networks",
                "networks" => self.config.networks.join(", "));
        }

        self.spawn_configured_peers();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, _)) => self.accept_peer(stream).await,
                    Err(e) => warn!("accept failed", "error" => e.to_string()),
                },
                Some(op) = self.op_rx.recv() => self.handle_server_op(op),
            }
        }
    }

    /// One session task per configured peer, registered for collision
    /// lookups before it runs.
    fn spawn_configured_peers(&mut self) {
        for peer_cfg in self.config.peers.clone() {
            let peer_ip = IpAddr::V4(peer_cfg.host);
            if self.peers.contains_key(&peer_ip) {
                error!("duplicate peer in configuration", "peer_ip" => peer_ip.to_string());
                continue;
            }

            let (ops_tx, ops_rx) = mpsc::unbounded_channel();
            if self
                .registries
                .sessions
                .register(peer_ip, ops_tx.clone())
                .is_err()
            {
                error!("session already registered", "peer_ip" => peer_ip.to_string());
                continue;
            }

            let session = Peer::session(
                peer_cfg.clone(),
                self.config.asn,
                self.local_bgp_id,
                self.local_addr,
                ops_rx,
                self.op_tx.clone(),
                self.registries.clone(),
            );
            tokio::spawn(session.run_session());

            self.peers.insert(
                peer_ip,
                PeerInfo {
                    state: BgpState::Idle,
                    config: peer_cfg.clone(),
                    session: ops_tx,
                },
            );
            info!("configured peer",
                "peer_ip" => peer_ip.to_string(),
                "asn" => peer_cfg.asn,
                "mode" => format!("{:?}", peer_cfg.mode));
        }
    }

    /// Inbound connection: known peers get a handler task, everything
    /// else a Cease/Connection Rejected.
    async fn accept_peer(&mut self, mut stream: TcpStream) {
        let Some(peer_ip) = peer_ip(&stream) else {
            error!("failed to get peer address");
            return;
        };

        info!("inbound connection", "peer_ip" => peer_ip.to_string());

        let Some(info) = self.peers.get(&peer_ip) else {
            info!("rejecting unconfigured peer", "peer_ip" => peer_ip.to_string());
            let notif = NotificationMessage::new(
                BgpError::Cease(CeaseSubcode::ConnectionRejected),
                Vec::new(),
            );
            let _ = stream.write_all(&notif.serialize(&PRE_OPEN_FORMAT)).await;
            return;
        };
        let config = info.config.clone();

        // One inbound handler per peer
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        if self.registries.handlers.register(peer_ip, ops_tx).is_err() {
            info!("inbound handler already active, closing duplicate",
                "peer_ip" => peer_ip.to_string());
            return;
        }

        match Peer::handler(
            stream,
            config,
            self.config.asn,
            self.local_bgp_id,
            ops_rx,
            self.op_tx.clone(),
            self.registries.clone(),
        ) {
            Ok(handler) => {
                tokio::spawn(handler.run_handler());
            }
            Err(e) => {
                error!("failed to set up inbound handler",
                    "peer_ip" => peer_ip.to_string(),
                    "error" => e.to_string());
                self.registries.handlers.unregister(peer_ip);
            }
        }
    }

    fn handle_server_op(&mut self, op: ServerOp) {
        match op {
            ServerOp::StateChanged { peer_ip, state } => {
                if let Some(info) = self.peers.get_mut(&peer_ip) {
                    info.state = state;
                }
            }
            ServerOp::UpdateReceived { peer_ip, update } => {
                self.route_processor.process_update(peer_ip, update);
            }
        }
    }
}
