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

//! BGP-4 peer-session engine: the six-state peer FSM as a pure transition
//! function, the message codec, and the connection drivers that tie them
//! to TCP, per RFC 4271 with four-octet ASN (RFC 6793), Route Refresh
//! (RFC 2918), and Extended Message (RFC 8654) negotiation.

pub mod bgp;
pub mod config;
pub mod fsm;
pub mod log;
pub mod net;
pub mod peer;
pub mod registry;
pub mod server;
