// LraSim: Link Reversal Routing Simulator written in Rust
// Copyright 2022-2024 Tibor Schneider <sctibor@ethz.ch>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Codec for the five in-band control payloads.
//!
//! Service packets carry one of five fixed ASCII strings as their entire body (no framing
//! header, no trailing NUL). A received body is classified by exact byte equality; anything
//! else is data traffic and is forwarded opaquely.

use serde::{Deserialize, Serialize};

/// Payload of a neighbor announcement broadcast.
pub const HELLO_SEND_MESSAGE: &str = "LRA_HELLO_SEND_MESSAGE";
/// Payload of the delayed acknowledgement to a HELLO.
pub const HELLO_RECV_MESSAGE: &str = "LRA_HELLO_RECV_MESSAGE";
/// Payload of a link-liveness probe.
pub const ACK_SEND_MESSAGE: &str = "LRA_ACK_SEND_MESSAGE";
/// Payload of the probe response.
pub const ACK_RECV_MESSAGE: &str = "LRA_ACK_RECV_MESSAGE";
/// Payload announcing that the sender has just reversed its links.
pub const REVERSAL_SEND_MESSAGE: &str = "LRA_REVERSAL_SEND_MESSAGE";

/// The five in-band control messages of the link-reversal protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceMessage {
    /// Neighbor announcement, broadcast once at bootstrap.
    HelloSend,
    /// Delayed acknowledgement to a HELLO, unicast back to the origin.
    HelloRecv,
    /// "Are you still reachable?" probe, unicast to the next hop.
    AckSend,
    /// "Yes, I am" probe response.
    AckRecv,
    /// The sender has just reversed all of its links.
    ReversalSend,
}

impl ServiceMessage {
    /// The wire representation of the message.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMessage::HelloSend => HELLO_SEND_MESSAGE,
            ServiceMessage::HelloRecv => HELLO_RECV_MESSAGE,
            ServiceMessage::AckSend => ACK_SEND_MESSAGE,
            ServiceMessage::AckRecv => ACK_RECV_MESSAGE,
            ServiceMessage::ReversalSend => REVERSAL_SEND_MESSAGE,
        }
    }

    /// The wire representation of the message as raw bytes.
    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Classify a packet body. Returns `None` if the body is not a control message (i.e., the
    /// packet is data traffic).
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            _ if payload == HELLO_SEND_MESSAGE.as_bytes() => Some(ServiceMessage::HelloSend),
            _ if payload == HELLO_RECV_MESSAGE.as_bytes() => Some(ServiceMessage::HelloRecv),
            _ if payload == ACK_SEND_MESSAGE.as_bytes() => Some(ServiceMessage::AckSend),
            _ if payload == ACK_RECV_MESSAGE.as_bytes() => Some(ServiceMessage::AckRecv),
            _ if payload == REVERSAL_SEND_MESSAGE.as_bytes() => Some(ServiceMessage::ReversalSend),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
