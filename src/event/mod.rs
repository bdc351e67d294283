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

//! Module for defining events

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

mod queue;
pub use queue::{EventQueue, FmtPriority, TimingQueue};

use crate::types::{Ipv4Header, Packet, SimTime};

/// Propagation delay of a single radio transmission in milliseconds. Every frame, unicast or
/// broadcast, takes this long to reach the receivers.
pub const LINK_DELAY: SimTime = 1;

/// Event to handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: serde::Serialize",
    deserialize = "T: for<'a> serde::Deserialize<'a>"
))]
pub enum Event<T> {
    /// A frame in flight from `src` to the link-level receiver `dst` (which may be the subnet
    /// broadcast address). `header.destination` carries the final destination and may differ
    /// from `dst` for relayed data traffic.
    Packet {
        /// The priority (time). Can be ignored when handling events, (unless you implement a
        /// custom queue).
        p: T,
        /// The transmitting node.
        src: Ipv4Addr,
        /// The link-level receiver (a neighbor address or the broadcast address).
        dst: Ipv4Addr,
        /// The header as it appears on the wire.
        header: Ipv4Header,
        /// The packet body.
        packet: Packet,
    },
    /// A deferred callback on `node`, taking effect `delay` milliseconds after it was pushed.
    Timer {
        /// The priority (time). Can be ignored when handling events, (unless you implement a
        /// custom queue).
        p: T,
        /// The node whose callback fires.
        node: Ipv4Addr,
        /// Requested delay relative to the enqueue time.
        delay: SimTime,
        /// The specific callback.
        kind: TimerKind,
    },
}

/// The deferred callbacks a node can schedule on itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Emit the staggered bootstrap HELLO broadcast.
    HelloStart,
    /// Emit the jittered HELLO acknowledgement towards `to`.
    HelloReply {
        /// The origin of the HELLO being acknowledged.
        to: Ipv4Addr,
    },
    /// An ACK probe towards `neighbor` went unanswered: declare the link down. The timer only
    /// takes effect if `token` still matches the node's pending probe (see [`ProbeToken`]).
    ProbeTimeout {
        /// The probed neighbor.
        neighbor: Ipv4Addr,
        /// Token guarding against cancelled or superseded probes.
        token: ProbeToken,
    },
}

/// Handle for an outstanding probe timeout.
///
/// Cancellation is by invalidation: the node stores the token of the scheduled timeout in its
/// pending-probe table, and a firing timeout whose token no longer matches the table entry is
/// ignored. Removing the table entry is therefore an O(1) cancel. Dropping a token never
/// cancels anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeToken(pub(crate) u64);

impl<T> Event<T> {
    /// Create a new packet transmission event.
    pub fn packet(p: T, src: Ipv4Addr, dst: Ipv4Addr, header: Ipv4Header, packet: Packet) -> Self {
        Self::Packet {
            p,
            src,
            dst,
            header,
            packet,
        }
    }

    /// Create a new timer event.
    pub fn timer(p: T, node: Ipv4Addr, delay: SimTime, kind: TimerKind) -> Self {
        Self::Timer {
            p,
            node,
            delay,
            kind,
        }
    }

    /// Get a reference to the priority of this event.
    pub fn priority(&self) -> &T {
        match self {
            Event::Packet { p, .. } | Event::Timer { p, .. } => p,
        }
    }

    /// Get a mutable reference to the priority of this event.
    pub fn priority_mut(&mut self) -> &mut T {
        match self {
            Event::Packet { p, .. } | Event::Timer { p, .. } => p,
        }
    }

    /// The delay (relative to the time the event is pushed) after which the event takes
    /// effect: the radio propagation delay for frames, the requested delay for timers.
    pub fn delay(&self) -> SimTime {
        match self {
            Event::Packet { .. } => LINK_DELAY,
            Event::Timer { delay, .. } => *delay,
        }
    }

    /// Return the node that caused the event.
    pub fn source(&self) -> Ipv4Addr {
        match self {
            Event::Packet { src, .. } => *src,
            Event::Timer { node, .. } => *node,
        }
    }

    /// Return the address where the event is processed. For frames this is the link-level
    /// receiver, which may be the broadcast address.
    pub fn router(&self) -> Ipv4Addr {
        match self {
            Event::Packet { dst, .. } => *dst,
            Event::Timer { node, .. } => *node,
        }
    }

    /// Returns true if the event is a frame transmission.
    pub fn is_packet(&self) -> bool {
        matches!(self, Event::Packet { .. })
    }
}
