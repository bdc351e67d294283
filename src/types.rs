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

//! Module containing all type definitions

use std::net::Ipv4Addr;

use petgraph::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) type IndexType = u32;
/// Router Identification (and index into the graph)
pub type RouterId = NodeIndex<IndexType>;

/// Radio adjacency graph. An edge means the two nodes are within radio range of each other.
pub type PhysicalNetwork = StableGraph<(), (), Undirected, IndexType>;

/// Simulated time in milliseconds.
pub type SimTime = u64;

/// Largest hop budget a data packet may consume. A delivered packet with `ttl` hops taken
/// contributes `TTL_MAX - ttl` to the receiver's hop accumulator.
pub const TTL_MAX: u8 = 64;

/// Protocol number stamped into every header (the host L3 native number).
pub const L3_PROTOCOL: u8 = 17;

/// UDP port reserved for the routing service.
pub const LRA_PORT: u16 = 654;

/// Orientation of a link towards a neighbor, as seen from the local node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LinkOrientation {
    /// The link exists but was never oriented.
    Unknown,
    /// The neighbor may route through us; we must not route through it.
    Inbound,
    /// We may use the neighbor as a next hop.
    Outbound,
}

impl LinkOrientation {
    /// Numeric encoding used in routing-table dumps (`-1`, `0`, `1`).
    pub fn as_i8(&self) -> i8 {
        match self {
            LinkOrientation::Unknown => -1,
            LinkOrientation::Inbound => 0,
            LinkOrientation::Outbound => 1,
        }
    }
}

impl std::fmt::Display for LinkOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// A single configured interface address: the local unicast address and the subnet broadcast
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    /// The local unicast address.
    pub local: Ipv4Addr,
    /// The broadcast address of the local subnet.
    pub broadcast: Ipv4Addr,
}

/// Snapshot of the host L3 address table, handed to the routing protocol with `set_ipv4`. Index 0
/// is the loopback interface; the single radio interface is index 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Config {
    /// Addresses per interface, outer index = interface, inner index = address index.
    pub interfaces: Vec<Vec<InterfaceAddress>>,
}

impl Ipv4Config {
    /// Create a configuration with a loopback entry and a single radio interface address.
    pub fn with_radio_address(addr: InterfaceAddress) -> Self {
        let loopback = InterfaceAddress {
            local: Ipv4Addr::LOCALHOST,
            broadcast: Ipv4Addr::LOCALHOST,
        };
        Self {
            interfaces: vec![vec![loopback], vec![addr]],
        }
    }

    /// Lookup the address `idx` on interface `iface`.
    pub fn address(&self, iface: u32, idx: u32) -> Option<InterfaceAddress> {
        self.interfaces
            .get(iface as usize)
            .and_then(|a| a.get(idx as usize))
            .copied()
    }
}

/// The header fields of a packet that the routing plane reads. For data packets `ttl` counts the
/// transmissions the packet has consumed so far (stamped 1 at origination, bumped by each relay);
/// service packets carry the fixed value 1 and are never relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Header {
    /// The originating node.
    pub source: Ipv4Addr,
    /// The final destination (may be the broadcast address).
    pub destination: Ipv4Addr,
    /// Hop budget consumed, see above.
    pub ttl: u8,
    /// The L3 protocol number.
    pub protocol: u8,
}

impl Ipv4Header {
    /// Create a new header with `ttl = 1` and the default protocol number.
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
            ttl: 1,
            protocol: L3_PROTOCOL,
        }
    }
}

/// An opaque packet body with a unique id for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Packet {
    /// Unique id assigned at origination.
    pub uid: u64,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a new packet.
    pub fn new(uid: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            uid,
            payload: payload.into(),
        }
    }
}

/// A forwarding decision returned by `route_output` or handed to the unicast-forward callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Route {
    /// The source recorded on the route.
    pub source: Ipv4Addr,
    /// The final destination.
    pub destination: Ipv4Addr,
    /// The next hop to hand the packet to.
    pub gateway: Ipv4Addr,
    /// The output interface (always 1, the single radio interface).
    pub output_device: u32,
}

/// Errors surfaced through the socket error field of `route_output`, or through the error
/// callback of `route_input`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketError {
    /// Next-hop selection (including the on-demand reversal) found no usable outbound link.
    #[error("No route to host")]
    NoRouteToHost,
}

/// Router Errors
#[derive(Error, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceError {
    /// An event was dispatched to a router that is neither its link-level receiver nor the
    /// owner of the timer.
    #[error("Event for {1} was triggered on router {0}!")]
    WrongRouter(Ipv4Addr, Ipv4Addr),
    /// The router has no address yet and cannot process events.
    #[error("Router {0:?} has no interface address")]
    NotConfigured(RouterId),
}

/// Network Errors
#[derive(Error, Debug, PartialEq, Serialize, Deserialize)]
pub enum NetworkError {
    /// The given router does not exist in the network.
    #[error("Network device was not found: {0:?}")]
    DeviceNotFound(RouterId),
    /// No router owns the given address.
    #[error("No network device owns the address {0}")]
    UnknownAddress(Ipv4Addr),
    /// The operation requires addresses, but `build_addresses` was never called.
    #[error("Network addresses are not yet assigned")]
    AddressesNotAssigned(RouterId),
    /// The base network is too small for the number of routers.
    #[error("Address pool exhausted while assigning addresses")]
    AddressPoolExhausted,
    /// The two routers are not within radio range of each other.
    #[error("Routers {0:?} and {1:?} do not share a link")]
    LinkNotFound(RouterId, RouterId),
    /// The two routers already share a link.
    #[error("Routers {0:?} and {1:?} already share a link")]
    LinkAlreadyExists(RouterId, RouterId),
    /// The event queue did not drain within the message limit.
    #[error("Network did not converge")]
    NoConvergence,
    /// Data origination failed with a socket error.
    #[error("{0}")]
    Socket(#[from] SocketError),
    /// A router rejected an event.
    #[error("{0}")]
    Device(#[from] DeviceError),
    /// JSON import or export failed.
    #[error("Cannot (de)serialize the network: {0}")]
    JsonError(String),
}
