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

//! Outbound session driver: one per configured peer. Dials the peer,
//! pumps the connection, and restarts automatically after faults unless
//! manually stopped.

use super::{
    ConnectionDirection, PeerOp, Registries, TcpConnection, TIMER_RESOLUTION,
};
use crate::bgp::codec::MessageCodec;
use crate::config::PeerConfig;
use crate::fsm::{BgpState, Fsm, FsmEvent, StartKind, TimerName};
use crate::net::create_and_bind_tcp_socket;
use crate::server::ServerOp;
use crate::{debug, info};
use bytes::BytesMut;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use super::Peer;

impl Peer {
    /// Build the outbound session driver for a configured peer.
    #[allow(clippy::too_many_arguments)]
    pub fn session(
        config: PeerConfig,
        local_asn: u32,
        local_bgp_id: u32,
        local_addr: SocketAddr,
        ops_rx: mpsc::UnboundedReceiver<PeerOp>,
        server_tx: mpsc::UnboundedSender<ServerOp>,
        registries: Registries,
    ) -> Self {
        let addr = IpAddr::V4(config.host);
        let port = config.port;
        let fsm = Fsm::new(local_asn, local_bgp_id, config.clone());
        Peer {
            addr,
            port,
            fsm,
            codec: MessageCodec::new(),
            conn: None,
            read_buf: BytesMut::with_capacity(4096),
            statistics: Default::default(),
            config,
            ops_rx,
            server_tx,
            local_addr,
            registries,
            conn_type: ConnectionDirection::Outbound,
            manually_stopped: false,
            last_reported_state: BgpState::Idle,
            last_update_sent: None,
            pending_updates: Vec::new(),
            shutdown: false,
        }
    }

    /// Session task body. Runs until the server shuts the peer down.
    pub async fn run_session(mut self) {
        info!("starting session",
            "peer_ip" => self.addr.to_string(),
            "mode" => format!("{:?}", self.config.mode));

        if self.config.automatic {
            let event = self.start_event(StartKind::Automatic);
            self.deliver(event).await;
        }

        loop {
            if self.shutdown {
                break;
            }
            match self.fsm.state() {
                BgpState::Idle => self.idle_wait().await,
                BgpState::Connect if self.conn.is_none() => self.dial().await,
                _ => self.pump().await,
            }
        }

        self.registries.sessions.unregister(self.addr);
        info!("session ended", "peer_ip" => self.addr.to_string());
    }

    /// Idle: wait for operator events, or restart automatically after one
    /// connect-retry interval.
    async fn idle_wait(&mut self) {
        let auto_restart = self.config.automatic && !self.manually_stopped;
        let pause = Duration::from_secs(self.config.connect_retry_secs);

        tokio::select! {
            op = self.ops_rx.recv() => match op {
                Some(op) => self.handle_op(op).await,
                None => self.shutdown = true,
            },
            _ = tokio::time::sleep(pause), if auto_restart => {
                debug!("restarting session after idle pause",
                    "peer_ip" => self.addr.to_string());
                let event = self.start_event(StartKind::Automatic);
                self.deliver(event).await;
            }
        }
    }

    /// Connect state without a transport: dial the peer. The connect
    /// attempt stays alive across ticks; only a connect-retry expiry or a
    /// state change abandons it.
    async fn dial(&mut self) {
        let peer_addr = SocketAddr::new(self.addr, self.port);
        let connect = create_and_bind_tcp_socket(self.local_addr, peer_addr);
        tokio::pin!(connect);
        let mut tick = tokio::time::interval(TIMER_RESOLUTION);

        loop {
            tokio::select! {
                result = &mut connect => {
                    match result {
                        Ok(stream) => {
                            info!("TCP connection established",
                                "peer_ip" => self.addr.to_string());
                            let (rx, tx) = stream.into_split();
                            self.conn = Some(TcpConnection { tx, rx });
                            self.deliver(FsmEvent::TcpConnectionSucceeds).await;
                        }
                        Err(e) => {
                            debug!("TCP connection failed",
                                "peer_ip" => self.addr.to_string(),
                                "error" => e.to_string());
                            self.deliver(FsmEvent::TcpConnectionFails).await;
                        }
                    }
                    return;
                },
                op = self.ops_rx.recv() => {
                    match op {
                        Some(op) => self.handle_op(op).await,
                        None => self.shutdown = true,
                    }
                    if self.shutdown || self.fsm.state() != BgpState::Connect {
                        return;
                    }
                },
                _ = tick.tick() => {
                    if self.fsm.timers.connect_retry.expired() {
                        self.deliver(FsmEvent::TimerExpired(TimerName::ConnectRetry)).await;
                        return;
                    }
                }
            }
        }
    }

    /// Pump a live connection (or wait with timers when passive in
    /// Active state): socket bytes, operator ops, timer ticks.
    async fn pump(&mut self) {
        let mut tick = tokio::time::interval(TIMER_RESOLUTION);

        loop {
            if self.shutdown {
                return;
            }
            match self.fsm.state() {
                BgpState::Idle => return,
                BgpState::Connect if self.conn.is_none() => return,
                _ => {}
            }

            if let Some(conn) = self.conn.as_mut() {
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
                        self.flush_pending_updates().await;
                    }
                }
            } else {
                tokio::select! {
                    op = self.ops_rx.recv() => match op {
                        Some(op) => self.handle_op(op).await,
                        None => self.shutdown = true,
                    },
                    _ = tick.tick() => {
                        self.check_timers().await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::msg::{BgpMessage, PRE_OPEN_FORMAT};
    use crate::bgp::msg_notification::CeaseSubcode;
    use crate::bgp::msg_open::OpenMessage;
    use crate::peer::CollisionVerdict;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncReadExt as _;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::{timeout, Duration};

    fn test_config(port: u16) -> PeerConfig {
        let mut config = PeerConfig::new(
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::new(172, 16, 1, 4),
            65001,
        );
        config.port = port;
        config.delay_open.enabled = false;
        config.connect_retry_secs = 1;
        config
    }

    fn spawn_session(
        config: PeerConfig,
    ) -> (
        mpsc::UnboundedSender<PeerOp>,
        mpsc::UnboundedReceiver<ServerOp>,
        Registries,
    ) {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let registries = Registries::default();
        registries
            .sessions
            .register(IpAddr::V4(config.host), ops_tx.clone())
            .unwrap();

        let session = Peer::session(
            config,
            65000,
            u32::from(Ipv4Addr::new(172, 16, 1, 3)),
            "127.0.0.1:0".parse().unwrap(),
            ops_rx,
            server_tx,
            registries.clone(),
        );
        tokio::spawn(session.run_session());
        (ops_tx, server_rx, registries)
    }

    async fn wait_for_state(
        server_rx: &mut mpsc::UnboundedReceiver<ServerOp>,
        wanted: BgpState,
    ) {
        timeout(Duration::from_secs(5), async {
            loop {
                match server_rx.recv().await {
                    Some(ServerOp::StateChanged { state, .. }) if state == wanted => return,
                    Some(_) => continue,
                    None => panic!("server channel closed"),
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {:?}", wanted));
    }

    #[tokio::test]
    async fn test_session_dials_and_sends_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (_ops_tx, mut server_rx, _registries) = spawn_session(test_config(port));

        let (mut stream, _) = listener.accept().await.unwrap();
        wait_for_state(&mut server_rx, BgpState::OpenSent).await;

        // The session's OPEN arrives on the raw socket
        let mut buf = vec![0u8; 4096];
        let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert!(n >= 19);
        assert_eq!(buf[18], 1, "expected an OPEN message");
    }

    #[tokio::test]
    async fn test_session_collision_check_in_idle_is_no_collision() {
        // Session toward a dead port ends up back in Idle; collision
        // checks answer NoCollision there.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (ops_tx, _server_rx, _registries) = spawn_session(test_config(port));

        // Give the dial a moment to fail
        tokio::time::sleep(Duration::from_millis(200)).await;

        let (reply_tx, reply_rx) = oneshot::channel();
        ops_tx
            .send(PeerOp::CollisionCheck {
                peer_bgp_id: u32::from(Ipv4Addr::new(172, 16, 1, 4)),
                new_connection: ConnectionDirection::Inbound,
                reply: reply_tx,
            })
            .unwrap();
        let verdict = timeout(Duration::from_secs(5), reply_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verdict, CollisionVerdict::NoCollision);
    }

    #[tokio::test]
    async fn test_session_collision_in_open_sent() {
        // Local 172.16.1.3 < peer 172.16.1.4: an inbound challenger wins
        // and the session dumps its own connection with Cease.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (ops_tx, mut server_rx, _registries) = spawn_session(test_config(port));

        let (mut stream, _) = listener.accept().await.unwrap();
        wait_for_state(&mut server_rx, BgpState::OpenSent).await;

        let (reply_tx, reply_rx) = oneshot::channel();
        ops_tx
            .send(PeerOp::CollisionCheck {
                peer_bgp_id: u32::from(Ipv4Addr::new(172, 16, 1, 4)),
                new_connection: ConnectionDirection::Inbound,
                reply: reply_tx,
            })
            .unwrap();
        let verdict = timeout(Duration::from_secs(5), reply_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verdict, CollisionVerdict::DropExisting);
        wait_for_state(&mut server_rx, BgpState::Idle).await;

        // The dumped session sent OPEN then Cease before closing
        let mut collected = Vec::new();
        let mut buf = vec![0u8; 4096];
        loop {
            match timeout(Duration::from_secs(2), stream.read(&mut buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => collected.extend_from_slice(&buf[..n]),
                Ok(Err(_)) => break,
            }
        }
        // First message is the OPEN; a NOTIFICATION follows
        let open_len = u16::from_be_bytes([collected[16], collected[17]]) as usize;
        assert_eq!(collected[18], 1);
        let notif = &collected[open_len..];
        assert_eq!(notif[18], 3, "expected NOTIFICATION after OPEN");
        assert_eq!(notif[19], 6, "Cease");
        assert_eq!(notif[20], 7, "Connection Collision Resolution");
    }

    #[tokio::test]
    async fn test_session_handshake_to_established() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (_ops_tx, mut server_rx, _registries) = spawn_session(test_config(port));

        let (mut stream, _) = listener.accept().await.unwrap();
        wait_for_state(&mut server_rx, BgpState::OpenSent).await;

        // Read the session's OPEN
        let mut buf = vec![0u8; 4096];
        let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buf[18], 1);
        let _ = n;

        // Answer with our own OPEN + KEEPALIVE
        use tokio::io::AsyncWriteExt as _;
        let open = OpenMessage::new(65001, 90, u32::from(Ipv4Addr::new(172, 16, 1, 4)));
        stream
            .write_all(&BgpMessage::Open(open).serialize(&PRE_OPEN_FORMAT))
            .await
            .unwrap();
        wait_for_state(&mut server_rx, BgpState::OpenConfirm).await;

        let keepalive =
            BgpMessage::Keepalive(crate::bgp::msg_keepalive::KeepaliveMessage {});
        stream
            .write_all(&keepalive.serialize(&PRE_OPEN_FORMAT))
            .await
            .unwrap();
        wait_for_state(&mut server_rx, BgpState::Established).await;
    }

    #[tokio::test]
    async fn test_session_shutdown_sends_cease() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (ops_tx, mut server_rx, registries) = spawn_session(test_config(port));
        let (mut stream, _) = listener.accept().await.unwrap();
        wait_for_state(&mut server_rx, BgpState::OpenSent).await;

        ops_tx
            .send(PeerOp::Shutdown(CeaseSubcode::PeerDeConfigured))
            .unwrap();

        // Drain the OPEN, then expect the Cease NOTIFICATION
        let mut collected = Vec::new();
        let mut buf = vec![0u8; 4096];
        loop {
            match timeout(Duration::from_secs(2), stream.read(&mut buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => collected.extend_from_slice(&buf[..n]),
                Ok(Err(_)) => break,
            }
        }
        let open_len = u16::from_be_bytes([collected[16], collected[17]]) as usize;
        let notif = &collected[open_len..];
        assert_eq!(notif[18], 3);
        assert_eq!(notif[19], 6, "Cease");
        assert_eq!(notif[20], 3, "Peer De-configured");

        // Task exit unregisters the session
        timeout(Duration::from_secs(5), async {
            while registries.sessions.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
    }
}
