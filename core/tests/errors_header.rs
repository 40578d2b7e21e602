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

//! Message-header error handling per RFC 4271 Section 6.1.

mod common;
pub use common::*;

use bgpcore::bgp::msg_notification::{BgpError, MessageHeaderError};

#[tokio::test]
async fn test_bad_marker_connection_not_synchronized() {
    let server = start_test_server(config_with_passive_peer()).await;
    let mut peer = FakePeer::connect(server).await;
    peer.read_open().await;

    // 19 bytes with a corrupted marker
    let mut msg = vec![0xffu8; 16];
    msg[0] = 0x00;
    msg.extend_from_slice(&[0x00, 0x13, 0x04]);
    peer.send_raw(&msg).await;

    let notif = peer.read_notification().await;
    assert_eq!(
        notif.error(),
        &BgpError::MessageHeaderError(MessageHeaderError::ConnectionNotSynchronized)
    );
    peer.expect_close().await;
}

#[tokio::test]
async fn test_bad_message_length() {
    let server = start_test_server(config_with_passive_peer()).await;
    let mut peer = FakePeer::connect(server).await;
    peer.read_open().await;

    // KEEPALIVE header claiming length 18 (below the header size)
    let mut msg = vec![0xffu8; 16];
    msg.extend_from_slice(&[0x00, 0x12, 0x04]);
    peer.send_raw(&msg).await;

    let notif = peer.read_notification().await;
    assert_eq!(
        notif.error(),
        &BgpError::MessageHeaderError(MessageHeaderError::BadMessageLength)
    );
    // RFC 4271: data carries the erroneous length field
    assert_eq!(notif.data(), &[0x00, 0x12]);
}

#[tokio::test]
async fn test_bad_message_type() {
    let server = start_test_server(config_with_passive_peer()).await;
    let mut peer = FakePeer::connect(server).await;
    peer.read_open().await;

    // Valid frame, undefined type 99
    let mut msg = vec![0xffu8; 16];
    msg.extend_from_slice(&[0x00, 0x13, 99]);
    peer.send_raw(&msg).await;

    let notif = peer.read_notification().await;
    assert_eq!(
        notif.error(),
        &BgpError::MessageHeaderError(MessageHeaderError::BadMessageType)
    );
    assert_eq!(notif.data(), &[99]);
}
