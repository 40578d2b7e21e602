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

//! Common test utilities: a server on an ephemeral port and a raw-socket
//! fake peer for scripting exact wire exchanges.

#![allow(dead_code)]

use bgpcore::bgp::codec::MessageCodec;
use bgpcore::bgp::msg::{BgpMessage, PRE_OPEN_FORMAT};
use bgpcore::bgp::msg_keepalive::KeepaliveMessage;
use bgpcore::bgp::msg_notification::NotificationMessage;
use bgpcore::bgp::msg_open::OpenMessage;
use bgpcore::bgp::msg_update::UpdateMessage;
use bgpcore::config::{Config, PeerConfig, PeerMode};
use bgpcore::server::{BgpServer, RouteProcessor};
use bytes::BytesMut;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_util::codec::Decoder;

pub const SERVER_ASN: u32 = 65000;
pub const PEER_ASN: u32 = 65001;

pub fn server_router_id() -> Ipv4Addr {
    Ipv4Addr::new(1, 1, 1, 1)
}

pub fn peer_router_id() -> Ipv4Addr {
    Ipv4Addr::new(2, 2, 2, 2)
}

/// Server config with one passive localhost peer, delay-open off so the
/// inbound handler answers OPENs immediately.
pub fn config_with_passive_peer() -> Config {
    let mut config = Config::new(SERVER_ASN, "127.0.0.1:0", server_router_id());
    let mut peer = PeerConfig::new(Ipv4Addr::LOCALHOST, peer_router_id(), PEER_ASN);
    peer.mode = PeerMode::Passive;
    peer.delay_open.enabled = false;
    config.peers.push(peer);
    config
}

/// Forwards surfaced UPDATEs into a channel for assertions.
pub struct ChannelRouteProcessor {
    tx: mpsc::UnboundedSender<(IpAddr, UpdateMessage)>,
}

impl RouteProcessor for ChannelRouteProcessor {
    fn process_update(&self, peer_ip: IpAddr, update: UpdateMessage) {
        let _ = self.tx.send((peer_ip, update));
    }
}

pub fn channel_route_processor() -> (
    Arc<ChannelRouteProcessor>,
    mpsc::UnboundedReceiver<(IpAddr, UpdateMessage)>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelRouteProcessor { tx }), rx)
}

/// Bind on an ephemeral port and run the server in the background.
pub async fn start_test_server(config: Config) -> SocketAddr {
    let mut server = BgpServer::new(config).expect("valid config");
    let addr = server.listen().await.expect("bind");
    tokio::spawn(server.serve());
    addr
}

pub async fn start_test_server_with_processor(
    config: Config,
    processor: Arc<dyn RouteProcessor>,
) -> SocketAddr {
    let mut server = BgpServer::with_route_processor(config, processor).expect("valid config");
    let addr = server.listen().await.expect("bind");
    tokio::spawn(server.serve());
    addr
}

/// A scripted BGP speaker on a raw socket.
pub struct FakePeer {
    pub stream: TcpStream,
    codec: MessageCodec,
    buf: BytesMut,
}

impl FakePeer {
    pub async fn connect(server: SocketAddr) -> Self {
        let stream = TcpStream::connect(server).await.expect("connect");
        FakePeer {
            stream,
            codec: MessageCodec::new(),
            buf: BytesMut::with_capacity(4096),
        }
    }

    pub async fn send(&mut self, msg: &BgpMessage) {
        self.stream
            .write_all(&msg.serialize(&PRE_OPEN_FORMAT))
            .await
            .expect("send");
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.expect("send raw");
    }

    pub async fn send_open(&mut self, asn: u16, bgp_id: Ipv4Addr, hold_time: u16) {
        let open = OpenMessage::new(asn, hold_time, u32::from(bgp_id));
        self.send(&BgpMessage::Open(open)).await;
    }

    pub async fn send_keepalive(&mut self) {
        self.send(&BgpMessage::Keepalive(KeepaliveMessage {})).await;
    }

    /// Read the next whole message, waiting up to five seconds.
    pub async fn read_message(&mut self) -> BgpMessage {
        timeout(Duration::from_secs(5), async {
            loop {
                if let Some(msg) = self.codec.decode(&mut self.buf).expect("decode") {
                    return msg;
                }
                let n = self.stream.read_buf(&mut self.buf).await.expect("read");
                assert!(n > 0, "connection closed while waiting for a message");
            }
        })
        .await
        .expect("timed out waiting for a message")
    }

    pub async fn read_open(&mut self) -> OpenMessage {
        match self.read_message().await {
            BgpMessage::Open(open) => open,
            other => panic!("expected OPEN, got {:?}", other),
        }
    }

    pub async fn read_keepalive(&mut self) {
        match self.read_message().await {
            BgpMessage::Keepalive(_) => {}
            other => panic!("expected KEEPALIVE, got {:?}", other),
        }
    }

    pub async fn read_notification(&mut self) -> NotificationMessage {
        loop {
            match self.read_message().await {
                BgpMessage::Notification(notif) => return notif,
                // Handshake traffic may be in flight ahead of the fault
                BgpMessage::Open(_) | BgpMessage::Keepalive(_) => continue,
                other => panic!("expected NOTIFICATION, got {:?}", other),
            }
        }
    }

    /// Complete the OPEN/KEEPALIVE handshake from this side.
    pub async fn handshake(&mut self, asn: u16, bgp_id: Ipv4Addr, hold_time: u16) {
        let open = self.read_open().await;
        assert_eq!(open.peer_asn(), SERVER_ASN);
        self.send_open(asn, bgp_id, hold_time).await;
        self.read_keepalive().await;
        self.send_keepalive().await;
    }

    /// Expect the server to close the connection.
    pub async fn expect_close(&mut self) {
        timeout(Duration::from_secs(5), async {
            loop {
                self.buf.clear();
                match self.stream.read_buf(&mut self.buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => continue,
                }
            }
        })
        .await
        .expect("timed out waiting for close");
    }
}

/// Raw OPEN with an arbitrary version byte, for protocol-violation tests.
pub fn build_raw_open(asn: u16, hold_time: u16, bgp_id: u32, version: u8) -> Vec<u8> {
    let mut body = Vec::new();
    body.push(version);
    body.extend_from_slice(&asn.to_be_bytes());
    body.extend_from_slice(&hold_time.to_be_bytes());
    body.extend_from_slice(&bgp_id.to_be_bytes());
    body.push(0); // no optional parameters

    let mut msg = vec![0xff; 16];
    msg.extend_from_slice(&(19 + body.len() as u16).to_be_bytes());
    msg.push(1); // OPEN
    msg.extend_from_slice(&body);
    msg
}
