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

//! The BGP peer state machine (RFC 4271 Section 8).
//!
//! `Fsm::handle_event` is a pure transition function: it mutates only the
//! machine's own state (current state, timers, counters, negotiated
//! session parameters) and returns the side effects the driver must apply,
//! in order. The FSM performs no I/O and never blocks; timers are plain
//! deadline values the driver polls.

use crate::bgp::msg::{BgpMessage, MessageFormat};
use crate::bgp::msg_keepalive::KeepaliveMessage;
use crate::bgp::msg_notification::{BgpError, CeaseSubcode, NotificationMessage};
use crate::bgp::msg_open::OpenMessage;
use crate::bgp::msg_open_types::{Capability, PeerCapabilities};
use crate::bgp::msg_update::UpdateMessage;
use crate::bgp::multiprotocol::AfiSafi;
use crate::config::PeerConfig;
use std::time::{Duration, Instant};

/// BGP FSM states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgpState {
    Idle,
    Connect,
    Active,
    OpenSent,
    OpenConfirm,
    Established,
}

/// Whether an operator or the system itself triggered a start/stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    Manual,
    Automatic,
}

/// Transport establishment direction requested by a start event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Active,
    Passive,
}

/// The four core session timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerName {
    ConnectRetry,
    DelayOpen,
    HoldTime,
    Keepalive,
}

impl std::fmt::Display for TimerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerName::ConnectRetry => write!(f, "connect_retry"),
            TimerName::DelayOpen => write!(f, "delay_open"),
            TimerName::HoldTime => write!(f, "hold_time"),
            TimerName::Keepalive => write!(f, "keep_alive"),
        }
    }
}

/// Countdown timer. A zero interval means the timer is disabled: starting
/// it is a no-op and it never expires.
#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    started: Option<Instant>,
}

impl Timer {
    pub fn new(seconds: u64) -> Self {
        Timer {
            interval: Duration::from_secs(seconds),
            started: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval, e.g. after hold-time negotiation. A running
    /// timer keeps its original start point.
    pub fn set_interval(&mut self, seconds: u64) {
        self.interval = Duration::from_secs(seconds);
    }

    pub fn disabled(&self) -> bool {
        self.interval.is_zero()
    }

    pub fn start(&mut self) {
        if !self.disabled() {
            self.started = Some(Instant::now());
        }
    }

    /// Same as `start`; reads better at call sites that re-arm.
    pub fn restart(&mut self) {
        self.start();
    }

    pub fn stop(&mut self) {
        self.started = None;
    }

    pub fn running(&self) -> bool {
        self.started.is_some()
    }

    pub fn expired(&self) -> bool {
        self.started
            .map(|started| started.elapsed() >= self.interval)
            .unwrap_or(false)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.started.map(|started| started + self.interval)
    }
}

/// Timer set owned by the FSM. Only FSM transitions mutate these.
#[derive(Debug, Clone)]
pub struct FsmTimers {
    pub connect_retry: Timer,
    pub delay_open: Timer,
    pub hold_time: Timer,
    pub keepalive: Timer,
}

impl FsmTimers {
    fn new(config: &PeerConfig) -> Self {
        FsmTimers {
            connect_retry: Timer::new(config.connect_retry_secs),
            delay_open: Timer::new(config.delay_open_secs()),
            hold_time: Timer::new(config.hold_time_secs as u64),
            keepalive: Timer::new(config.keepalive_secs),
        }
    }

    pub fn get(&self, name: TimerName) -> &Timer {
        match name {
            TimerName::ConnectRetry => &self.connect_retry,
            TimerName::DelayOpen => &self.delay_open,
            TimerName::HoldTime => &self.hold_time,
            TimerName::Keepalive => &self.keepalive,
        }
    }

    /// Names of all currently expired timers, for the driver's tick loop.
    pub fn expired(&self) -> Vec<TimerName> {
        [
            TimerName::ConnectRetry,
            TimerName::DelayOpen,
            TimerName::HoldTime,
            TimerName::Keepalive,
        ]
        .into_iter()
        .filter(|name| self.get(*name).expired())
        .collect()
    }

    fn stop_all(&mut self) {
        self.connect_retry.stop();
        self.delay_open.stop();
        self.hold_time.stop();
        self.keepalive.stop();
    }

    /// RFC 4271 4.4: hold time is min(configured, offered); keep-alive is
    /// a third of it. Zero disables both.
    fn set_negotiated_hold_time(&mut self, hold_time: u16) {
        self.hold_time.set_interval(hold_time as u64);
        self.keepalive.set_interval(hold_time as u64 / 3);
    }
}

/// Parameters carried by a received OPEN.
#[derive(Debug, Clone, PartialEq)]
pub struct BgpOpenParams {
    pub peer_asn: u32,
    pub peer_hold_time: u16,
    pub peer_bgp_id: u32,
    pub peer_capabilities: PeerCapabilities,
}

impl From<&OpenMessage> for BgpOpenParams {
    fn from(open: &OpenMessage) -> Self {
        BgpOpenParams {
            peer_asn: open.peer_asn(),
            peer_hold_time: open.hold_time,
            peer_bgp_id: open.bgp_identifier,
            peer_capabilities: open.capabilities(),
        }
    }
}

/// FSM input events.
#[derive(Debug, Clone, PartialEq)]
pub enum FsmEvent {
    Start { kind: StartKind, mode: StartMode },
    Stop { kind: StartKind },
    /// Outbound TCP connect completed
    TcpConnectionSucceeds,
    /// Inbound TCP connection accepted
    TcpConnectionConfirmed,
    TcpConnectionFails,
    BgpOpenReceived(BgpOpenParams),
    BgpKeepaliveReceived,
    BgpUpdateReceived(UpdateMessage),
    BgpNotificationReceived(NotificationMessage),
    BgpRouteRefreshReceived,
    /// Header decode fault; carries the NOTIFICATION to send
    BgpHeaderErr(NotificationMessage),
    /// OPEN decode fault; carries the NOTIFICATION to send
    BgpOpenMsgErr(NotificationMessage),
    /// UPDATE decode fault; carries the NOTIFICATION to send
    BgpUpdateMsgErr(NotificationMessage),
    TimerExpired(TimerName),
    /// This connection lost collision arbitration and must close with
    /// Cease (RFC 4271 6.8).
    OpenCollisionDump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpAction {
    Connect,
    Disconnect,
    Reconnect,
}

/// Side effects returned by a transition, applied by the driver in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendMessage(BgpMessage),
    Tcp(TcpAction),
    /// Decoded UPDATE surfaced for the route engine
    RouteUpdate(UpdateMessage),
}

/// BGP Finite State Machine
#[derive(Debug, Clone)]
pub struct Fsm {
    state: BgpState,
    pub timers: FsmTimers,
    /// ConnectRetryCounter (RFC 4271 8.2.2)
    pub connect_retry_counter: u32,
    local_asn: u32,
    local_bgp_id: u32,
    config: PeerConfig,
    /// iBGP session: peer ASN equals local ASN. Set at OPEN reception.
    internal: bool,
    peer_asn: Option<u32>,
    peer_bgp_id: Option<u32>,
    capabilities: PeerCapabilities,
}

impl Fsm {
    /// New FSM in Idle state.
    pub fn new(local_asn: u32, local_bgp_id: u32, config: PeerConfig) -> Self {
        let timers = FsmTimers::new(&config);
        Fsm {
            state: BgpState::Idle,
            timers,
            connect_retry_counter: 0,
            local_asn,
            local_bgp_id,
            config,
            internal: false,
            peer_asn: None,
            peer_bgp_id: None,
            capabilities: PeerCapabilities::default(),
        }
    }

    pub fn state(&self) -> BgpState {
        self.state
    }

    pub fn local_asn(&self) -> u32 {
        self.local_asn
    }

    pub fn local_bgp_id(&self) -> u32 {
        self.local_bgp_id
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn internal(&self) -> bool {
        self.internal
    }

    /// Peer router ID: learned from its OPEN, configured otherwise.
    pub fn peer_bgp_id(&self) -> u32 {
        self.peer_bgp_id
            .unwrap_or_else(|| u32::from(self.config.bgp_id))
    }

    pub fn peer_asn(&self) -> Option<u32> {
        self.peer_asn
    }

    pub fn capabilities(&self) -> &PeerCapabilities {
        &self.capabilities
    }

    /// Hold time in effect after negotiation, seconds.
    pub fn negotiated_hold_time(&self) -> u16 {
        self.timers.hold_time.interval().as_secs() as u16
    }

    /// Wire format under the negotiated capability set. We always offer
    /// four-octet ASN and extended message, so the peer's OPEN decides.
    pub fn message_format(&self) -> MessageFormat {
        MessageFormat {
            four_octet_asn: self.capabilities.four_octet_asn.is_some(),
            extended_message: self.capabilities.extended_message,
        }
    }

    pub fn is_established(&self) -> bool {
        self.state == BgpState::Established
    }

    /// Process one event. Returns the side effects to apply, in order.
    pub fn handle_event(&mut self, event: FsmEvent) -> Vec<Effect> {
        // Expiry racing a stop: an expired event for a timer that is no
        // longer running is stale and gets dropped.
        if let FsmEvent::TimerExpired(name) = &event {
            if !self.timers.get(*name).running() {
                return vec![];
            }
        }

        // Start events only matter in Idle (RFC 4271 8.2.1)
        if matches!(event, FsmEvent::Start { .. }) && self.state != BgpState::Idle {
            return vec![];
        }

        match self.state {
            BgpState::Idle => self.on_idle(event),
            BgpState::Connect => self.on_connect(event),
            BgpState::Active => self.on_active(event),
            BgpState::OpenSent => self.on_open_sent(event),
            BgpState::OpenConfirm => self.on_open_confirm(event),
            BgpState::Established => self.on_established(event),
        }
    }

    // ===== Per-state transitions =====

    fn on_idle(&mut self, event: FsmEvent) -> Vec<Effect> {
        match event {
            FsmEvent::Start { mode, .. } => {
                self.connect_retry_counter = 0;
                self.timers.connect_retry.restart();
                match mode {
                    StartMode::Active => {
                        self.state = BgpState::Connect;
                        vec![Effect::Tcp(TcpAction::Connect)]
                    }
                    StartMode::Passive => {
                        self.state = BgpState::Active;
                        vec![]
                    }
                }
            }
            // Everything else is ignored in Idle
            _ => vec![],
        }
    }

    fn on_connect(&mut self, event: FsmEvent) -> Vec<Effect> {
        match event {
            FsmEvent::TimerExpired(TimerName::ConnectRetry) => {
                self.timers.connect_retry.restart();
                self.timers.delay_open.stop();
                vec![Effect::Tcp(TcpAction::Reconnect)]
            }
            FsmEvent::TcpConnectionSucceeds | FsmEvent::TcpConnectionConfirmed => {
                self.timers.connect_retry.stop();
                if self.config.delay_open.enabled {
                    self.timers.delay_open.start();
                    vec![]
                } else {
                    self.state = BgpState::OpenSent;
                    self.timers.hold_time.restart();
                    vec![Effect::SendMessage(self.local_open())]
                }
            }
            FsmEvent::TimerExpired(TimerName::DelayOpen) => {
                self.timers.delay_open.stop();
                self.state = BgpState::OpenSent;
                self.timers.hold_time.restart();
                vec![Effect::SendMessage(self.local_open())]
            }
            FsmEvent::TcpConnectionFails => {
                if self.timers.delay_open.running() {
                    self.timers.delay_open.stop();
                    self.timers.connect_retry.restart();
                    self.state = BgpState::Active;
                } else {
                    self.reset_to_idle();
                }
                vec![]
            }
            // RFC 4271 Event 20: OPEN arrived while DelayOpen runs
            FsmEvent::BgpOpenReceived(params) if self.timers.delay_open.running() => {
                self.timers.connect_retry.stop();
                self.timers.delay_open.stop();
                let mut effects = vec![Effect::SendMessage(self.local_open())];
                effects.extend(self.enter_open_confirm(params));
                effects
            }
            FsmEvent::BgpNotificationReceived(notif) if notif.is_version_error() => {
                let delay_open_was_running = self.timers.delay_open.running();
                self.reset_to_idle();
                if !delay_open_was_running {
                    self.connect_retry_counter += 1;
                }
                vec![Effect::Tcp(TcpAction::Disconnect)]
            }
            FsmEvent::BgpHeaderErr(notif)
            | FsmEvent::BgpOpenMsgErr(notif)
            | FsmEvent::BgpUpdateMsgErr(notif) => self.on_message_error(notif),
            FsmEvent::Stop { kind } => self.on_stop(kind),
            _ => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![Effect::Tcp(TcpAction::Disconnect)]
            }
        }
    }

    fn on_active(&mut self, event: FsmEvent) -> Vec<Effect> {
        match event {
            FsmEvent::TimerExpired(TimerName::ConnectRetry) => {
                self.timers.connect_retry.restart();
                self.state = BgpState::Connect;
                vec![Effect::Tcp(TcpAction::Connect)]
            }
            FsmEvent::TimerExpired(TimerName::DelayOpen) => {
                self.timers.delay_open.stop();
                self.state = BgpState::OpenSent;
                self.timers.hold_time.restart();
                vec![Effect::SendMessage(self.local_open())]
            }
            FsmEvent::TcpConnectionSucceeds | FsmEvent::TcpConnectionConfirmed => {
                self.timers.connect_retry.stop();
                if self.config.delay_open.enabled {
                    self.timers.delay_open.start();
                    vec![]
                } else {
                    self.state = BgpState::OpenSent;
                    self.timers.hold_time.restart();
                    vec![Effect::SendMessage(self.local_open())]
                }
            }
            FsmEvent::TcpConnectionFails => {
                self.reset_to_idle();
                self.timers.connect_retry.restart();
                self.connect_retry_counter += 1;
                vec![]
            }
            FsmEvent::BgpOpenReceived(params) => {
                self.timers.connect_retry.stop();
                self.timers.delay_open.stop();
                let mut effects = vec![Effect::SendMessage(self.local_open())];
                effects.extend(self.enter_open_confirm(params));
                effects
            }
            FsmEvent::BgpHeaderErr(notif)
            | FsmEvent::BgpOpenMsgErr(notif)
            | FsmEvent::BgpUpdateMsgErr(notif) => self.on_message_error(notif),
            FsmEvent::Stop { kind } => self.on_stop(kind),
            _ => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![Effect::Tcp(TcpAction::Disconnect)]
            }
        }
    }

    fn on_open_sent(&mut self, event: FsmEvent) -> Vec<Effect> {
        match event {
            FsmEvent::TimerExpired(TimerName::HoldTime) => self.on_hold_timer_expired(),
            FsmEvent::TcpConnectionFails => {
                self.timers.hold_time.stop();
                self.timers.connect_retry.restart();
                self.state = BgpState::Active;
                vec![]
            }
            FsmEvent::BgpOpenReceived(params) => {
                self.timers.connect_retry.stop();
                self.enter_open_confirm(params)
            }
            FsmEvent::BgpNotificationReceived(notif) => {
                let version_error = notif.is_version_error();
                self.reset_to_idle();
                if !version_error {
                    self.connect_retry_counter += 1;
                }
                vec![Effect::Tcp(TcpAction::Disconnect)]
            }
            FsmEvent::BgpHeaderErr(notif)
            | FsmEvent::BgpOpenMsgErr(notif)
            | FsmEvent::BgpUpdateMsgErr(notif) => self.on_message_error(notif),
            FsmEvent::OpenCollisionDump => self.on_collision_dump(),
            FsmEvent::Stop { kind } => self.on_stop(kind),
            _ => self.on_fsm_error(),
        }
    }

    fn on_open_confirm(&mut self, event: FsmEvent) -> Vec<Effect> {
        match event {
            FsmEvent::TimerExpired(TimerName::HoldTime) => self.on_hold_timer_expired(),
            FsmEvent::TimerExpired(TimerName::Keepalive) => {
                self.timers.keepalive.restart();
                vec![Effect::SendMessage(Self::keepalive())]
            }
            FsmEvent::BgpKeepaliveReceived => {
                self.timers.hold_time.restart();
                self.state = BgpState::Established;
                vec![]
            }
            FsmEvent::BgpNotificationReceived(_) => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![Effect::Tcp(TcpAction::Disconnect)]
            }
            // A second OPEN here means the connections collided
            FsmEvent::BgpOpenReceived(_) => self.on_collision_dump(),
            FsmEvent::OpenCollisionDump => self.on_collision_dump(),
            FsmEvent::TcpConnectionFails => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![]
            }
            FsmEvent::BgpHeaderErr(notif)
            | FsmEvent::BgpOpenMsgErr(notif)
            | FsmEvent::BgpUpdateMsgErr(notif) => self.on_message_error(notif),
            FsmEvent::Stop { kind } => self.on_stop(kind),
            _ => self.on_fsm_error(),
        }
    }

    fn on_established(&mut self, event: FsmEvent) -> Vec<Effect> {
        match event {
            FsmEvent::TimerExpired(TimerName::HoldTime) => self.on_hold_timer_expired(),
            FsmEvent::TimerExpired(TimerName::Keepalive) => {
                self.timers.keepalive.restart();
                vec![Effect::SendMessage(Self::keepalive())]
            }
            FsmEvent::BgpKeepaliveReceived => {
                self.timers.hold_time.restart();
                vec![]
            }
            FsmEvent::BgpUpdateReceived(update) => {
                self.timers.hold_time.restart();
                vec![Effect::RouteUpdate(update)]
            }
            FsmEvent::BgpRouteRefreshReceived => {
                self.timers.hold_time.restart();
                vec![]
            }
            FsmEvent::BgpOpenReceived(_) => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![
                    Effect::SendMessage(Self::cease(CeaseSubcode::ConnectionCollisionResolution)),
                    Effect::Tcp(TcpAction::Disconnect),
                ]
            }
            FsmEvent::BgpNotificationReceived(_) => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![Effect::Tcp(TcpAction::Disconnect)]
            }
            FsmEvent::TcpConnectionFails => {
                self.reset_to_idle();
                self.connect_retry_counter += 1;
                vec![]
            }
            FsmEvent::BgpHeaderErr(notif)
            | FsmEvent::BgpOpenMsgErr(notif)
            | FsmEvent::BgpUpdateMsgErr(notif) => self.on_message_error(notif),
            FsmEvent::OpenCollisionDump => self.on_collision_dump(),
            FsmEvent::Stop { kind } => self.on_stop(kind),
            _ => self.on_fsm_error(),
        }
    }

    // ===== Shared transition pieces =====

    /// OPEN accepted: negotiate timers, flag iBGP, answer with KEEPALIVE.
    fn enter_open_confirm(&mut self, params: BgpOpenParams) -> Vec<Effect> {
        self.peer_asn = Some(params.peer_asn);
        self.peer_bgp_id = Some(params.peer_bgp_id);
        self.internal = params.peer_asn == self.local_asn;
        self.capabilities = params.peer_capabilities;

        let hold_time = self.config.hold_time_secs.min(params.peer_hold_time);
        self.timers.set_negotiated_hold_time(hold_time);
        if hold_time > 0 {
            self.timers.hold_time.restart();
            self.timers.keepalive.restart();
        } else {
            self.timers.hold_time.stop();
            self.timers.keepalive.stop();
        }

        self.state = BgpState::OpenConfirm;
        vec![Effect::SendMessage(Self::keepalive())]
    }

    /// Stop handling: manual zeros the counter, automatic increments it so
    /// flapping stays observable.
    fn on_stop(&mut self, kind: StartKind) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.can_notify() {
            let subcode = match kind {
                StartKind::Manual => CeaseSubcode::AdministrativeShutdown,
                StartKind::Automatic => CeaseSubcode::AdministrativeReset,
            };
            effects.push(Effect::SendMessage(Self::cease(subcode)));
        }
        effects.push(Effect::Tcp(TcpAction::Disconnect));

        self.reset_to_idle();
        match kind {
            StartKind::Manual => self.connect_retry_counter = 0,
            StartKind::Automatic => self.connect_retry_counter += 1,
        }
        effects
    }

    fn on_hold_timer_expired(&mut self) -> Vec<Effect> {
        self.reset_to_idle();
        self.connect_retry_counter += 1;
        vec![
            Effect::SendMessage(BgpMessage::Notification(NotificationMessage::new(
                BgpError::HoldTimerExpired,
                vec![],
            ))),
            Effect::Tcp(TcpAction::Disconnect),
        ]
    }

    /// Decode fault: relay the NOTIFICATION the codec produced, close, and
    /// recycle. Unsupported-version leaves the retry counter alone.
    fn on_message_error(&mut self, notif: NotificationMessage) -> Vec<Effect> {
        let version_error = notif.is_version_error();
        let mut effects = Vec::new();
        if self.can_notify() {
            effects.push(Effect::SendMessage(BgpMessage::Notification(notif)));
        }
        effects.push(Effect::Tcp(TcpAction::Disconnect));

        self.reset_to_idle();
        if !version_error {
            self.connect_retry_counter += 1;
        }
        effects
    }

    fn on_fsm_error(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.can_notify() {
            effects.push(Effect::SendMessage(BgpMessage::Notification(
                NotificationMessage::new(BgpError::FiniteStateMachineError, vec![]),
            )));
        }
        effects.push(Effect::Tcp(TcpAction::Disconnect));

        self.reset_to_idle();
        self.connect_retry_counter += 1;
        effects
    }

    fn on_collision_dump(&mut self) -> Vec<Effect> {
        self.reset_to_idle();
        self.connect_retry_counter += 1;
        vec![
            Effect::SendMessage(Self::cease(CeaseSubcode::ConnectionCollisionResolution)),
            Effect::Tcp(TcpAction::Disconnect),
        ]
    }

    /// RFC 4271 8.2.1.5: NOTIFICATION before our OPEN went out is gated by
    /// configuration. From OpenSent onward an OPEN has been sent.
    fn can_notify(&self) -> bool {
        self.config.notification_without_open
            || matches!(
                self.state,
                BgpState::OpenSent | BgpState::OpenConfirm | BgpState::Established
            )
    }

    /// Back to Idle: all timers stopped, negotiated session state cleared.
    /// Timer intervals revert to their configured values.
    fn reset_to_idle(&mut self) {
        self.timers = FsmTimers::new(&self.config);
        self.capabilities = PeerCapabilities::default();
        self.peer_asn = None;
        self.peer_bgp_id = None;
        self.internal = false;
        self.state = BgpState::Idle;
    }

    // ===== Message builders =====

    fn local_open(&self) -> BgpMessage {
        BgpMessage::Open(OpenMessage::with_capabilities(
            self.local_asn,
            self.config.hold_time_secs,
            self.local_bgp_id,
            vec![
                Capability::Multiprotocol(AfiSafi::ipv4_unicast()),
                Capability::RouteRefresh,
                Capability::ExtendedMessage,
                Capability::FourOctetAsn(self.local_asn),
            ],
        ))
    }

    fn keepalive() -> BgpMessage {
        BgpMessage::Keepalive(KeepaliveMessage {})
    }

    fn cease(subcode: CeaseSubcode) -> BgpMessage {
        BgpMessage::Notification(NotificationMessage::new(BgpError::Cease(subcode), vec![]))
    }
}
