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

//! Peer connection drivers. One task per connection: `outgoing` dials and
//! owns the configured session, `incoming` drives an accepted connection.
//! Both pump bytes through the codec, feed the FSM, and apply its effects
//! in order.

use crate::bgp::codec::MessageCodec;
use crate::bgp::msg::BgpMessage;
use crate::bgp::msg_notification::{BgpError, CeaseSubcode, NotificationMessage, OpenMessageError};
use crate::bgp::msg_update::UpdateMessage;
use crate::config::PeerConfig;
use crate::fsm::{BgpOpenParams, BgpState, Effect, Fsm, FsmEvent, StartKind, TcpAction};
use crate::registry::Registry;
use crate::server::ServerOp;
use crate::{debug, error, info, warn};
use bytes::BytesMut;
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Decoder;

pub mod incoming;
pub mod outgoing;

/// How long the asking side waits for a collision verdict.
const COLLISION_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Driver tick realizing FSM timers.
const TIMER_RESOLUTION: Duration = Duration::from_millis(100);

pub type PeerHandle = mpsc::UnboundedSender<PeerOp>;

/// The two driver registries, keyed by peer host. Collision arbitration
/// is always a lookup in the opposite map followed by a `CollisionCheck`
/// op; the inbound handler asks the session and the session asks the
/// handler, never both ways at once for the same peer.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub sessions: Registry<PeerHandle>,
    pub handlers: Registry<PeerHandle>,
}

/// Operations that can be sent to a peer task
pub enum PeerOp {
    ManualStart,
    ManualStop,
    /// Server-initiated teardown: send Cease with the given subcode and
    /// end the task.
    Shutdown(CeaseSubcode),
    /// Route engine pushes an UPDATE out through this session.
    SendUpdate(UpdateMessage),
    GetStatistics(oneshot::Sender<PeerStatistics>),
    /// Collision arbitration request from the opposite driver.
    CollisionCheck {
        peer_bgp_id: u32,
        new_connection: ConnectionDirection,
        reply: oneshot::Sender<CollisionVerdict>,
    },
}

/// Which side initiated a TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirection {
    Inbound,
    Outbound,
}

/// Outcome of collision arbitration (RFC 4271 6.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionVerdict {
    /// The checked driver holds no competing connection.
    NoCollision,
    /// The new connection loses and must close with Cease.
    DropNew,
    /// The existing connection yields; the new one proceeds.
    DropExisting,
}

/// Arbitrate between an existing connection (in `existing_state`) and a
/// new one in the given direction. BGP identifiers compare as unsigned
/// 32-bit integers; the outbound connection survives when the local ID is
/// not lower than the peer's.
pub fn resolve_collision(
    existing_state: BgpState,
    local_bgp_id: u32,
    peer_bgp_id: u32,
    new_connection: ConnectionDirection,
) -> CollisionVerdict {
    match existing_state {
        // An established session always wins
        BgpState::Established => CollisionVerdict::DropNew,
        BgpState::OpenSent | BgpState::OpenConfirm => {
            let outbound_wins = local_bgp_id >= peer_bgp_id;
            match new_connection {
                ConnectionDirection::Inbound => {
                    if outbound_wins {
                        CollisionVerdict::DropNew
                    } else {
                        CollisionVerdict::DropExisting
                    }
                }
                ConnectionDirection::Outbound => {
                    if outbound_wins {
                        CollisionVerdict::DropExisting
                    } else {
                        CollisionVerdict::DropNew
                    }
                }
            }
        }
        _ => CollisionVerdict::NoCollision,
    }
}

/// Type of BGP session based on AS relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    /// External BGP session (different AS)
    Ebgp,
    /// Internal BGP session (same AS)
    Ibgp,
}

/// Statistics for BGP messages
#[derive(Debug, Clone, Default)]
pub struct PeerStatistics {
    pub open_sent: u64,
    pub keepalive_sent: u64,
    pub update_sent: u64,
    pub notification_sent: u64,
    pub open_received: u64,
    pub keepalive_received: u64,
    pub update_received: u64,
    pub notification_received: u64,
}

/// TCP connection halves - only present when connected
pub(crate) struct TcpConnection {
    pub(crate) tx: OwnedWriteHalf,
    pub(crate) rx: OwnedReadHalf,
}

pub struct Peer {
    pub(crate) addr: IpAddr,
    pub(crate) port: u16,
    pub(crate) fsm: Fsm,
    pub(crate) codec: MessageCodec,
    pub(crate) conn: Option<TcpConnection>,
    pub(crate) read_buf: BytesMut,
    pub(crate) statistics: PeerStatistics,
    pub(crate) config: PeerConfig,
    pub(crate) ops_rx: mpsc::UnboundedReceiver<PeerOp>,
    pub(crate) server_tx: mpsc::UnboundedSender<ServerOp>,
    pub(crate) local_addr: SocketAddr,
    pub(crate) registries: Registries,
    pub(crate) conn_type: ConnectionDirection,
    /// Set by ManualStop; blocks automatic restart until ManualStart.
    pub(crate) manually_stopped: bool,
    pub(crate) last_reported_state: BgpState,
    /// RFC 4271 9.2.1.1: last UPDATE sent, for MinRouteAdvertisementInterval
    pub(crate) last_update_sent: Option<Instant>,
    /// UPDATEs queued while the advertisement interval runs
    pub(crate) pending_updates: Vec<UpdateMessage>,
    pub(crate) shutdown: bool,
}

impl Peer {
    pub fn session_type(&self) -> Option<SessionType> {
        self.fsm.peer_asn().map(|_| {
            if self.fsm.internal() {
                SessionType::Ibgp
            } else {
                SessionType::Ebgp
            }
        })
    }

    /// Feed one event to the FSM and apply the returned effects in order.
    /// Follow-up events raised while applying (send failures, collision
    /// losses) are processed before returning.
    pub(crate) async fn deliver(&mut self, event: FsmEvent) {
        let mut queue = VecDeque::new();
        queue.push_back(event);

        while let Some(event) = queue.pop_front() {
            debug!("fsm event",
                "peer_ip" => self.addr.to_string(),
                "event" => format!("{:?}", event));
            // A transport fault means the socket is already dead
            if matches!(event, FsmEvent::TcpConnectionFails) {
                self.drop_conn();
            }
            let effects = self.fsm.handle_event(event);

            'effects: for effect in effects {
                match effect {
                    Effect::SendMessage(msg) => {
                        // An OPEN about to leave on the outbound connection
                        // must first survive arbitration against a
                        // registered inbound handler.
                        if matches!(msg, BgpMessage::Open(_))
                            && self.conn_type == ConnectionDirection::Outbound
                            && self.loses_outbound_collision().await
                        {
                            queue.push_back(FsmEvent::OpenCollisionDump);
                            break 'effects;
                        }
                        if let Err(e) = self.send_message(&msg).await {
                            error!("failed to send message",
                                "peer_ip" => self.addr.to_string(),
                                "error" => e.to_string());
                            queue.push_back(FsmEvent::TcpConnectionFails);
                            break 'effects;
                        }
                    }
                    Effect::Tcp(TcpAction::Connect) => {
                        // The run loop dials whenever the FSM sits in
                        // Connect without a transport.
                        debug!("connect requested", "peer_ip" => self.addr.to_string());
                    }
                    Effect::Tcp(TcpAction::Reconnect) => {
                        debug!("reconnect requested", "peer_ip" => self.addr.to_string());
                        self.drop_conn();
                    }
                    Effect::Tcp(TcpAction::Disconnect) => {
                        self.drop_conn();
                    }
                    Effect::RouteUpdate(update) => {
                        let _ = self.server_tx.send(ServerOp::UpdateReceived {
                            peer_ip: self.addr,
                            update,
                        });
                    }
                }
            }

            if self.fsm.state() == BgpState::Idle {
                self.drop_conn();
            }
            self.codec.set_format(self.fsm.message_format());
        }

        self.report_state();
    }

    fn drop_conn(&mut self) {
        if self.conn.is_some() {
            debug!("dropping connection", "peer_ip" => self.addr.to_string());
        }
        self.conn = None;
        self.read_buf.clear();
        self.codec = MessageCodec::new();
    }

    fn report_state(&mut self) {
        let state = self.fsm.state();
        if state != self.last_reported_state {
            info!("peer state changed",
                "peer_ip" => self.addr.to_string(),
                "old_state" => format!("{:?}", self.last_reported_state),
                "new_state" => format!("{:?}", state));
            self.last_reported_state = state;
            let _ = self.server_tx.send(ServerOp::StateChanged {
                peer_ip: self.addr,
                state,
            });
        }
    }

    pub(crate) async fn send_message(&mut self, msg: &BgpMessage) -> std::io::Result<()> {
        let conn = self.conn.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "no TCP connection")
        })?;
        conn.tx.write_all(&msg.serialize(self.codec.format())).await?;

        match msg {
            BgpMessage::Open(_) => {
                self.statistics.open_sent += 1;
                info!("sent OPEN", "peer_ip" => self.addr.to_string());
            }
            BgpMessage::Keepalive(_) => {
                self.statistics.keepalive_sent += 1;
                debug!("sent KEEPALIVE", "peer_ip" => self.addr.to_string());
            }
            BgpMessage::Update(_) => {
                self.statistics.update_sent += 1;
                debug!("sent UPDATE", "peer_ip" => self.addr.to_string());
            }
            BgpMessage::Notification(notif) => {
                self.statistics.notification_sent += 1;
                warn!("sent NOTIFICATION",
                    "peer_ip" => self.addr.to_string(),
                    "error" => format!("{:?}", notif.error()));
            }
            BgpMessage::RouteRefresh(_) => {
                debug!("sent ROUTE-REFRESH", "peer_ip" => self.addr.to_string());
            }
        }
        Ok(())
    }

    fn track_received(&mut self, msg: &BgpMessage) {
        match msg {
            BgpMessage::Open(open) => {
                self.statistics.open_received += 1;
                info!("received OPEN",
                    "peer_ip" => self.addr.to_string(),
                    "asn" => open.peer_asn(),
                    "hold_time" => open.hold_time);
            }
            BgpMessage::Update(_) => {
                self.statistics.update_received += 1;
                debug!("received UPDATE", "peer_ip" => self.addr.to_string());
            }
            BgpMessage::Keepalive(_) => {
                self.statistics.keepalive_received += 1;
                debug!("received KEEPALIVE", "peer_ip" => self.addr.to_string());
            }
            BgpMessage::Notification(notif) => {
                self.statistics.notification_received += 1;
                warn!("received NOTIFICATION",
                    "peer_ip" => self.addr.to_string(),
                    "error" => format!("{:?}", notif.error()));
            }
            BgpMessage::RouteRefresh(refresh) => {
                info!("received ROUTE-REFRESH",
                    "peer_ip" => self.addr.to_string(),
                    "afi" => refresh.afi.to_string(),
                    "safi" => refresh.safi.to_string());
            }
        }
    }

    /// Map a decoded message to its FSM event. OPEN additionally runs
    /// peer-AS validation and, on an inbound connection, collision
    /// arbitration against the registered session.
    async fn message_event(&mut self, msg: BgpMessage) -> FsmEvent {
        match msg {
            BgpMessage::Open(open) => {
                let params = BgpOpenParams::from(&open);

                if params.peer_asn != self.config.asn {
                    warn!("OPEN from unexpected AS",
                        "peer_ip" => self.addr.to_string(),
                        "expected" => self.config.asn,
                        "received" => params.peer_asn);
                    let notif = NotificationMessage::new(
                        BgpError::OpenMessageError(OpenMessageError::BadPeerAs),
                        open.asn.to_be_bytes().to_vec(),
                    );
                    return FsmEvent::BgpOpenMsgErr(notif);
                }

                if self.conn_type == ConnectionDirection::Inbound
                    && self.loses_inbound_collision(params.peer_bgp_id).await
                {
                    return FsmEvent::OpenCollisionDump;
                }

                FsmEvent::BgpOpenReceived(params)
            }
            BgpMessage::Keepalive(_) => FsmEvent::BgpKeepaliveReceived,
            BgpMessage::Update(update) => FsmEvent::BgpUpdateReceived(update),
            BgpMessage::Notification(notif) => FsmEvent::BgpNotificationReceived(notif),
            BgpMessage::RouteRefresh(_) => FsmEvent::BgpRouteRefreshReceived,
        }
    }

    /// Decode whatever whole messages the buffer holds and feed them to
    /// the FSM. Trailing partial bytes stay buffered.
    pub(crate) async fn drain_messages(&mut self) {
        loop {
            match self.codec.decode(&mut self.read_buf) {
                Ok(Some(msg)) => {
                    self.track_received(&msg);
                    let event = self.message_event(msg).await;
                    self.deliver(event).await;
                    if self.conn.is_none() {
                        return;
                    }
                }
                Ok(None) => return,
                Err(err) => {
                    warn!("message decode failed",
                        "peer_ip" => self.addr.to_string(),
                        "error" => err.to_string());
                    match NotificationMessage::from_parser_error(&err) {
                        Some(notif) => {
                            let error = notif.error().clone();
                            let event = match error {
                                BgpError::MessageHeaderError(_) => FsmEvent::BgpHeaderErr(notif),
                                BgpError::OpenMessageError(_) => FsmEvent::BgpOpenMsgErr(notif),
                                BgpError::UpdateMessageError(_) => FsmEvent::BgpUpdateMsgErr(notif),
                                _ => FsmEvent::BgpHeaderErr(notif),
                            };
                            self.deliver(event).await;
                        }
                        None => self.deliver(FsmEvent::TcpConnectionFails).await,
                    }
                    return;
                }
            }
        }
    }

    /// Poll the FSM's timers and feed expiry events.
    pub(crate) async fn check_timers(&mut self) {
        for name in self.fsm.timers.expired() {
            debug!("timer expired",
                "peer_ip" => self.addr.to_string(),
                "timer" => name.to_string());
            self.deliver(FsmEvent::TimerExpired(name)).await;
        }
    }

    pub(crate) async fn handle_op(&mut self, op: PeerOp) {
        match op {
            PeerOp::ManualStart => {
                info!("manual start", "peer_ip" => self.addr.to_string());
                self.manually_stopped = false;
                let event = self.start_event(StartKind::Manual);
                self.deliver(event).await;
            }
            PeerOp::ManualStop => {
                info!("manual stop", "peer_ip" => self.addr.to_string());
                self.manually_stopped = true;
                self.deliver(FsmEvent::Stop {
                    kind: StartKind::Manual,
                })
                .await;
            }
            PeerOp::Shutdown(subcode) => {
                info!("shutdown requested",
                    "peer_ip" => self.addr.to_string(),
                    "subcode" => format!("{:?}", subcode));
                let notif = BgpMessage::Notification(NotificationMessage::new(
                    BgpError::Cease(subcode),
                    vec![],
                ));
                if self.conn.is_some() {
                    let _ = self.send_message(&notif).await;
                }
                self.shutdown = true;
            }
            PeerOp::SendUpdate(update) => {
                if !self.fsm.is_established() {
                    debug!("dropping UPDATE for non-established session",
                        "peer_ip" => self.addr.to_string());
                    return;
                }
                self.pending_updates.push(update);
                self.flush_pending_updates().await;
            }
            PeerOp::GetStatistics(reply) => {
                let _ = reply.send(self.statistics.clone());
            }
            PeerOp::CollisionCheck {
                peer_bgp_id,
                new_connection,
                reply,
            } => {
                let verdict = resolve_collision(
                    self.fsm.state(),
                    self.fsm.local_bgp_id(),
                    peer_bgp_id,
                    new_connection,
                );
                info!("collision check",
                    "peer_ip" => self.addr.to_string(),
                    "state" => format!("{:?}", self.fsm.state()),
                    "verdict" => format!("{:?}", verdict));
                if verdict == CollisionVerdict::DropExisting {
                    self.deliver(FsmEvent::OpenCollisionDump).await;
                }
                let _ = reply.send(verdict);
            }
        }
    }

    /// Flush queued UPDATEs once the advertisement interval has passed.
    pub(crate) async fn flush_pending_updates(&mut self) {
        if !self.fsm.is_established() || self.pending_updates.is_empty() {
            return;
        }
        let interval = Duration::from_secs(self.config.route_advertisement_secs);
        let ready = self
            .last_update_sent
            .map_or(true, |sent| sent.elapsed() >= interval);
        if !ready {
            return;
        }

        let updates = std::mem::take(&mut self.pending_updates);
        for update in updates {
            if let Err(e) = self.send_message(&BgpMessage::Update(update)).await {
                error!("failed to send UPDATE",
                    "peer_ip" => self.addr.to_string(),
                    "error" => e.to_string());
                self.deliver(FsmEvent::TcpConnectionFails).await;
                return;
            }
        }
        self.last_update_sent = Some(Instant::now());
    }

    /// Ask the opposite driver for a collision verdict. `true` means the
    /// connection this driver holds must be dumped.
    async fn ask_collision(
        &self,
        handle: PeerHandle,
        peer_bgp_id: u32,
        new_connection: ConnectionDirection,
    ) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        let op = PeerOp::CollisionCheck {
            peer_bgp_id,
            new_connection,
            reply: reply_tx,
        };
        if handle.send(op).is_err() {
            return false;
        }
        match tokio::time::timeout(COLLISION_CHECK_TIMEOUT, reply_rx).await {
            Ok(Ok(CollisionVerdict::DropNew)) => true,
            Ok(Ok(_)) => false,
            _ => {
                debug!("collision check timed out", "peer_ip" => self.addr.to_string());
                false
            }
        }
    }

    /// Outbound side: about to send OPEN with an inbound handler present.
    /// Uses the configured (or learned) peer router ID.
    async fn loses_outbound_collision(&mut self) -> bool {
        let Some(handler) = self.registries.handlers.lookup(self.addr) else {
            return false;
        };
        let peer_bgp_id = self.fsm.peer_bgp_id();
        self.ask_collision(handler, peer_bgp_id, ConnectionDirection::Outbound)
            .await
    }

    /// Inbound side: OPEN arrived, ask the registered session with the
    /// router ID the OPEN carried.
    async fn loses_inbound_collision(&mut self, peer_bgp_id: u32) -> bool {
        let Some(session) = self.registries.sessions.lookup(self.addr) else {
            return false;
        };
        self.ask_collision(session, peer_bgp_id, ConnectionDirection::Inbound)
            .await
    }

    pub(crate) fn start_event(&self, kind: StartKind) -> FsmEvent {
        use crate::fsm::StartMode;
        FsmEvent::Start {
            kind,
            mode: if self.config.passive() {
                StartMode::Passive
            } else {
                StartMode::Active
            },
        }
    }
}
