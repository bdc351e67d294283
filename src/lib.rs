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

#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # LraSim
//!
//! This is a simulator for the Link Reversal Algorithm (LRA), a routing protocol for multi-hop
//! wireless ad-hoc networks in which every node elects a path towards a single *sink*. It does
//! not model OSI layers 1 and 2: the wireless channel is an adjacency graph with a fixed
//! propagation delay, and a broadcast reaches exactly the current radio neighbors of the
//! transmitter. Control traffic is exchanged in-band as five small service payloads
//! ([`message::ServiceMessage`]) driven by a global, time-ordered event queue
//! ([`event::TimingQueue`]).
//!
//! Each node orients every known neighbor link as inbound or outbound such that, across the
//! network, the links form a DAG rooted at the sink. A node that loses its last outbound link
//! flips all of its links outbound ([`router::LraProcess::link_reversal`]) and floods a
//! reversal notice, which may cascade until connectivity towards the sink is restored, or
//! until the node concludes that it sits in a disconnected component and stops routing.
//!
//! ## Main Concepts
//!
//! The [`network::Network`] is the main datastructure to operate on. It owns the radio
//! topology, one [`router::Router`] per node, and the event queue. Configure a network with
//! [`builder::NetworkBuilder`] (addresses, random streams, line topologies), bootstrap the
//! protocol with [`network::Network::initialize`], and inject traffic with
//! [`network::Network::send_data`]. Use [`network::Network::manual_simulation`] together with
//! [`network::Network::simulate_step`] to step through the events one by one.
//!
//! The default queue is the [`event::TimingQueue`], which fires events in simulated time and
//! in FIFO order among ties. Any other queue can be plugged in by implementing
//! [`event::EventQueue`].
//!
//! ## Example usage
//!
//! The following example builds a three-node chain whose last node is the sink, bootstraps the
//! neighbor discovery, and sends a single data packet across both hops:
//!
//! ```
//! use lrasim::prelude::*;
//!
//! fn main() -> Result<(), NetworkError> {
//!     let mut net = Network::default();
//!
//!     // node-0 --- node-1 --- node-2, with node-2 as the sink (highest address)
//!     let ids = net.build_line(3)?;
//!     net.build_addresses("10.0.0.0/8".parse().unwrap())?;
//!     net.build_streams(12345);
//!     net.initialize(ids[2])?;
//!
//!     // one packet from the first node reaches the sink in two hops
//!     net.send_data(ids[0], ids[2], b"payload".to_vec())?;
//!     let sink = net.get_router(ids[2])?;
//!     assert_eq!(sink.lra.telemetry().packets_received, 1);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod event;
pub mod message;
pub mod network;
pub mod prelude;
pub mod router;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;
