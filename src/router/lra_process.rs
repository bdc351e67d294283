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

//! The link-reversal routing process.
//!
//! One [`LraProcess`] runs on every node. It maintains an oriented view of the one-hop
//! neighborhood that, across all nodes, realizes a DAG rooted at the single sink: following any
//! chain of [`LinkOrientation::Outbound`] edges eventually reaches the sink. A node that loses
//! its last outbound link flips *all* of its links outbound and floods a reversal notice, which
//! may cascade through the network until connectivity is restored.
//!
//! The process is event driven and never blocks: every handler runs to completion and returns
//! the frames and timers it caused, which the host enqueues.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::net::Ipv4Addr;

use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::event::{Event, ProbeToken, TimerKind};
use crate::message::ServiceMessage;
use crate::telemetry::Telemetry;
use crate::types::{
    InterfaceAddress, Ipv4Config, Ipv4Header, Ipv4Route, LinkOrientation, Packet, SimTime,
    SocketError, TTL_MAX,
};

/// Milliseconds a probed neighbor has to answer before the link is declared down.
pub const PROBE_TIMEOUT: SimTime = 100;
/// Spacing of the staggered bootstrap HELLOs (one slot per node index).
pub const HELLO_STAGGER: SimTime = 1000;
/// Upper bound (exclusive) of the uniform jitter applied to HELLOs and HELLO replies.
pub const HELLO_JITTER: SimTime = 1000;
/// Bootstrap delay of the sink itself.
pub const SINK_HELLO_DELAY: SimTime = 1;
/// Number of bilateral-outbound observations after which a neighbor is permanently excluded
/// from next-hop selection.
pub const CYCLE_THRESHOLD: u32 = 3;

/// Classification result of a received payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecvStatus {
    /// The payload was a control message and was processed.
    Service,
    /// The payload is data traffic.
    NotService,
    /// The payload was a control message, but processing it detected a forming cycle. The
    /// packet must not be delivered locally, and no response is sent.
    Error,
}

/// Two independent random streams per node: one for the bootstrap HELLO delay, one for the
/// HELLO-response jitter.
///
/// Only the stream id is serialized; restoring a snapshot re-seeds both generators from it,
/// the stream *position* is not preserved.
#[derive(Debug, Clone)]
pub(crate) struct StreamPair {
    stream: u64,
    pub(crate) hello: StdRng,
    pub(crate) reply: StdRng,
}

impl StreamPair {
    pub(crate) fn seeded(stream: u64) -> Self {
        Self {
            stream,
            hello: StdRng::seed_from_u64(stream),
            reply: StdRng::seed_from_u64(stream.wrapping_add(1)),
        }
    }
}

impl Default for StreamPair {
    fn default() -> Self {
        Self::seeded(0)
    }
}

impl PartialEq for StreamPair {
    fn eq(&self, other: &Self) -> bool {
        self.stream == other.stream
    }
}

impl Serialize for StreamPair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.stream.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StreamPair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::seeded(u64::deserialize(deserializer)?))
    }
}

/// The per-node link-reversal routing process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LraProcess {
    /// Host L3 address table, handed over with `set_ipv4`.
    ipv4: Option<Ipv4Config>,
    /// Local and broadcast address, cached on the first interface-up notification.
    iface: Option<InterfaceAddress>,
    /// The single destination towards which the DAG is maintained.
    sink: Option<Ipv4Addr>,
    /// Rank used only to stagger the bootstrap HELLO.
    index: u32,
    /// True once the bootstrap HELLO went out; false again when a reversal cascade leaves the
    /// node in a component disconnected from the sink.
    initialized: bool,
    /// Every address ever heard from. Entries are never removed, only re-oriented.
    neighbors: BTreeSet<Ipv4Addr>,
    /// Link orientation per neighbor, from the local point of view.
    link_status: BTreeMap<Ipv4Addr, LinkOrientation>,
    /// Consecutive bilateral-outbound observations per neighbor.
    cycle_counter: BTreeMap<Ipv4Addr, u32>,
    /// Outstanding probe timeouts. An entry exists iff an unanswered ACK request is in flight;
    /// removing the entry cancels the timeout (its token no longer matches).
    pending_probe: BTreeMap<Ipv4Addr, ProbeToken>,
    next_token: u64,
    next_uid: u64,
    telemetry: Telemetry,
    rng: StreamPair,
}

impl Default for LraProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl LraProcess {
    /// Create an empty process. The address is learned from `set_ipv4` +
    /// `notify_interface_up`, the sink from `initialize_node`.
    pub fn new() -> Self {
        Self {
            ipv4: None,
            iface: None,
            sink: None,
            index: 0,
            initialized: false,
            neighbors: BTreeSet::new(),
            link_status: BTreeMap::new(),
            cycle_counter: BTreeMap::new(),
            pending_probe: BTreeMap::new(),
            next_token: 0,
            next_uid: 0,
            telemetry: Telemetry::default(),
            rng: StreamPair::default(),
        }
    }

    /*
     * Host notifications
     */

    /// Hand over a snapshot of the host L3 address table.
    pub fn set_ipv4(&mut self, ipv4: Ipv4Config) {
        self.ipv4 = Some(ipv4);
    }

    /// An interface came up. The process assumes a single radio interface with index 1 and
    /// caches its first address.
    pub fn notify_interface_up(&mut self, interface: u32) {
        trace!("notify_interface_up {interface}");
        if let Some(addr) = self.ipv4.as_ref().and_then(|c| c.address(1, 0)) {
            self.iface = Some(addr);
        }
    }

    /// An interface went down. Ignored.
    pub fn notify_interface_down(&mut self, interface: u32) {
        trace!("notify_interface_down {interface}");
    }

    /// An address was added to an interface. Ignored; the cached address is not refreshed.
    pub fn notify_add_address(&mut self, interface: u32, address: InterfaceAddress) {
        trace!("notify_add_address {interface} {}", address.local);
    }

    /// An address was removed from an interface. Ignored.
    pub fn notify_remove_address(&mut self, interface: u32, address: InterfaceAddress) {
        trace!("notify_remove_address {interface} {}", address.local);
    }

    /// Learn the sink address and schedule the staggered bootstrap HELLO: after
    /// `index * 1000ms` plus up to a second of jitter, or after 1ms for the sink itself.
    pub fn initialize_node<T: Default>(&mut self, sink: Ipv4Addr, index: u32) -> Vec<Event<T>> {
        self.sink = Some(sink);
        self.index = index;
        let Some(iface) = self.iface else {
            warn!("initialize_node called before any interface came up");
            return Vec::new();
        };
        let delay = if iface.local == sink {
            SINK_HELLO_DELAY
        } else {
            SimTime::from(index) * HELLO_STAGGER + self.rng.hello.gen_range(0..HELLO_JITTER)
        };
        debug!("node {} schedules its HELLO after {delay}ms", iface.local);
        vec![Event::timer(
            T::default(),
            iface.local,
            delay,
            TimerKind::HelloStart,
        )]
    }

    /// Seed both random streams of this node and return the number of streams consumed (2).
    pub fn assign_streams(&mut self, first_stream: u64) -> u64 {
        self.rng = StreamPair::seeded(first_stream);
        2
    }

    /*
     * Accessors
     */

    /// The local unicast address, once an interface is up.
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.iface.map(|i| i.local)
    }

    /// The broadcast address of the local subnet, once an interface is up.
    pub fn broadcast_address(&self) -> Option<Ipv4Addr> {
        self.iface.map(|i| i.broadcast)
    }

    /// The sink address, once the node is initialized.
    pub fn sink(&self) -> Option<Ipv4Addr> {
        self.sink
    }

    /// The rank used to stagger the bootstrap HELLO.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether this node is the sink itself.
    pub fn is_sink(&self) -> bool {
        match self.iface {
            Some(iface) => Some(iface.local) == self.sink,
            None => false,
        }
    }

    /// Whether the node participates in routing. False before the bootstrap HELLO went out,
    /// and false again after the node found itself in a component disconnected from the sink.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// All addresses this node ever heard from.
    pub fn neighbors(&self) -> &BTreeSet<Ipv4Addr> {
        &self.neighbors
    }

    /// The orientation of the link towards `neighbor`, if the neighbor is known.
    pub fn orientation(&self, neighbor: Ipv4Addr) -> Option<LinkOrientation> {
        self.link_status.get(&neighbor).copied()
    }

    /// The full orientation table.
    pub fn link_status(&self) -> &BTreeMap<Ipv4Addr, LinkOrientation> {
        &self.link_status
    }

    /// The full cycle-observation table.
    pub fn cycle_counters(&self) -> &BTreeMap<Ipv4Addr, u32> {
        &self.cycle_counter
    }

    /// The outstanding probe timeouts.
    pub fn pending_probes(&self) -> &BTreeMap<Ipv4Addr, ProbeToken> {
        &self.pending_probe
    }

    /// How often `neighbor` was observed closing a cycle.
    pub fn cycle_count(&self, neighbor: Ipv4Addr) -> u32 {
        self.cycle_counter.get(&neighbor).copied().unwrap_or(0)
    }

    /// Whether an ACK request towards `neighbor` is outstanding.
    pub fn has_pending_probe(&self, neighbor: Ipv4Addr) -> bool {
        self.pending_probe.contains_key(&neighbor)
    }

    /// The delivery counters of this node.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// The average hop metric of all locally delivered data packets, or 0 if none arrived.
    pub fn average_hop_count(&self) -> f64 {
        self.telemetry.average_hop_count()
    }

    /*
     * Forwarding plane
     */

    /// Compute the route for a locally originated packet. Packets for the node itself are
    /// delivered locally, packets for the sink go to the elected next hop (reversing
    /// on demand if necessary), and anything else is treated as a direct-send service frame
    /// whose gateway is the destination itself. The output device is always interface 1.
    pub fn route_output<T: Default>(
        &mut self,
        header: &Ipv4Header,
    ) -> (Result<Ipv4Route, SocketError>, Vec<Event<T>>) {
        let Some(iface) = self.iface else {
            return (Err(SocketError::NoRouteToHost), Vec::new());
        };
        let dest = header.destination;

        if dest == iface.local {
            trace!("packet local delivery {} to {}", iface.local, dest);
            let route = Ipv4Route {
                source: iface.local,
                destination: dest,
                gateway: dest,
                output_device: 1,
            };
            return (Ok(route), Vec::new());
        }

        let (gateway, events) = if Some(dest) == self.sink {
            self.next_hop()
        } else {
            // service frames carry ttl 1 and go straight to their destination
            (Some(dest), Vec::new())
        };
        match gateway {
            Some(gateway) => {
                trace!(
                    "packet send from {} to {} through {}",
                    iface.local,
                    dest,
                    gateway
                );
                let route = Ipv4Route {
                    source: iface.local,
                    destination: dest,
                    gateway,
                    output_device: 1,
                };
                (Ok(route), events)
            }
            None => (Err(SocketError::NoRouteToHost), events),
        }
    }

    /// Process an arriving packet.
    ///
    /// Control payloads addressed to this node (or broadcast) are processed and *also* handed
    /// to the local-deliver callback `lcb`, so host-level tracing stays symmetrical. Data for
    /// this node is counted and delivered. Data for the sink is handed to the unicast-forward
    /// callback `ucb` with a route to the elected next hop, which is then probed. Anything
    /// else raises `NoRouteToHost` on `ecb`. The multicast callback `mcb` is accepted for
    /// interface compatibility and never invoked.
    ///
    /// Returns whether the packet was consumed, together with the events caused by it.
    #[allow(clippy::too_many_arguments)]
    pub fn route_input<T, U, M, L, E>(
        &mut self,
        packet: &Packet,
        header: &Ipv4Header,
        _idev: u32,
        mut ucb: U,
        _mcb: M,
        mut lcb: L,
        mut ecb: E,
    ) -> (bool, Vec<Event<T>>)
    where
        T: Default,
        U: FnMut(&Ipv4Route, &Packet, &Ipv4Header),
        M: FnMut(&Ipv4Route, &Packet, &Ipv4Header),
        L: FnMut(&Packet, &Ipv4Header, u32),
        E: FnMut(&Packet, &Ipv4Header, SocketError),
    {
        if !self.initialized {
            return (false, Vec::new());
        }
        let Some(iface) = self.iface else {
            return (false, Vec::new());
        };
        if header.ttl == 0 {
            return (false, Vec::new());
        }
        let origin = header.source;
        // looped-back broadcasts must not create a self-neighbor
        if origin == iface.local {
            return (false, Vec::new());
        }
        let dest = header.destination;
        let iif = 1;

        if dest == iface.local || dest == iface.broadcast {
            let (status, events) = self.recv_service_message(&packet.payload, origin);
            match status {
                RecvStatus::Error => return (false, events),
                RecvStatus::NotService => {
                    trace!("packet delivered to {} from {}", iface.local, origin);
                    self.telemetry
                        .record(f64::from(TTL_MAX.saturating_sub(header.ttl)));
                }
                RecvStatus::Service => {}
            }
            // control messages are handed up as well, so host traces stay symmetrical
            lcb(packet, header, iif);
            (true, events)
        } else if Some(dest) == self.sink {
            let (next_hop, mut events) = self.next_hop();
            if let Some(next_hop) = next_hop {
                trace!(
                    "packet forwarded from {} to {} for {} and source {}",
                    iface.local,
                    next_hop,
                    dest,
                    origin
                );
                let route = Ipv4Route {
                    source: origin,
                    destination: dest,
                    gateway: next_hop,
                    output_device: 1,
                };
                ucb(&route, packet, header);
                events.append(&mut self.send_ack_request(next_hop));
                (true, events)
            } else {
                debug!("no route found for packet at {}", iface.local);
                ecb(packet, header, SocketError::NoRouteToHost);
                (false, events)
            }
        } else {
            debug!("no route found for packet at {}", iface.local);
            ecb(packet, header, SocketError::NoRouteToHost);
            (false, Vec::new())
        }
    }

    /*
     * Link orientation
     */

    /// Orient the link towards `neighbor` inbound. Cancels any probe towards it. Unless
    /// `avoid_reverse` is set (bootstrap-time orientation), a node left without any outbound
    /// link performs a local reversal and floods a reversal notice; if even that does not
    /// produce an outbound link (all candidates suppressed), the node declares itself
    /// disconnected and stops routing.
    pub fn disable_link_to<T: Default>(
        &mut self,
        neighbor: Ipv4Addr,
        avoid_reverse: bool,
    ) -> Vec<Event<T>> {
        if let Some(local) = self.address() {
            debug!("node {local} disables link to {neighbor}");
        }
        self.neighbors.insert(neighbor);
        self.link_status.insert(neighbor, LinkOrientation::Inbound);
        self.pending_probe.remove(&neighbor);

        let mut events = Vec::new();
        if self.is_sink() || avoid_reverse {
            return events;
        }
        if !self.has_next_hop() {
            self.link_reversal();
            // notify all neighbors that their edge towards us now points inbound
            events.extend(self.broadcast_service_event(ServiceMessage::ReversalSend));
            if !self.has_next_hop() {
                // cascading reversals brought us back to zero outbound links: this is a
                // component with no connection to the sink
                self.initialized = false;
            }
        }
        events
    }

    /// Orient the link towards `neighbor` outbound and cancel any probe towards it.
    pub fn enable_link_to(&mut self, neighbor: Ipv4Addr) {
        if let Some(local) = self.address() {
            debug!("node {local} enables link to {neighbor}");
        }
        self.neighbors.insert(neighbor);
        self.link_status.insert(neighbor, LinkOrientation::Outbound);
        self.pending_probe.remove(&neighbor);
    }

    /// Record `neighbor` with an unoriented link and cancel any probe towards it.
    pub fn init_link_to(&mut self, neighbor: Ipv4Addr) {
        if let Some(local) = self.address() {
            debug!("node {local} init link to {neighbor}");
        }
        self.neighbors.insert(neighbor);
        self.link_status.insert(neighbor, LinkOrientation::Unknown);
        self.pending_probe.remove(&neighbor);
    }

    /// Flip every known neighbor link outbound. The sink never reverses.
    pub fn link_reversal(&mut self) {
        if self.is_sink() {
            return;
        }
        let broadcast = self.broadcast_address();
        let neighbors: Vec<_> = self.neighbors.iter().copied().collect();
        for neighbor in neighbors {
            if Some(neighbor) == broadcast {
                continue;
            }
            self.link_status.insert(neighbor, LinkOrientation::Outbound);
        }
    }

    /*
     * Next-hop selection
     */

    /// Elect a next hop towards the sink. If plain selection fails but neighbors exist, a
    /// reversal is performed on demand (and announced), and selection runs once more. This is
    /// deliberately a two-step with a retry bound of one, not a recursion.
    pub fn next_hop<T: Default>(&mut self) -> (Option<Ipv4Addr>, Vec<Event<T>>) {
        if let Some(next_hop) = self.candidate_next_hop() {
            return (Some(next_hop), Vec::new());
        }
        if !self.neighbors.is_empty() {
            self.link_reversal();
            let next_hop = self.candidate_next_hop();
            let events = self
                .broadcast_service_event(ServiceMessage::ReversalSend)
                .into_iter()
                .collect();
            return (next_hop, events);
        }
        (None, Vec::new())
    }

    /// Plain selection: walk the neighbors in descending address order (the sink is engineered
    /// to carry the highest address, so this biases towards it) and return the first neighbor
    /// that is outbound and not cycle-suppressed. An unoriented link is claimed on the fly.
    fn candidate_next_hop(&mut self) -> Option<Ipv4Addr> {
        if self.is_sink() {
            return None;
        }
        let broadcast = self.broadcast_address();
        let neighbors: Vec<_> = self.neighbors.iter().rev().copied().collect();
        for neighbor in neighbors {
            if Some(neighbor) == broadcast {
                continue;
            }
            let status = self
                .link_status
                .get(&neighbor)
                .copied()
                .unwrap_or(LinkOrientation::Inbound);
            // `is_sink` is unreachable here (the sink bailed out above); the guard mirrors the
            // shape of the selection rule
            if status == LinkOrientation::Outbound || self.is_sink() {
                if self.cycle_count(neighbor) < CYCLE_THRESHOLD {
                    return Some(neighbor);
                } else {
                    continue;
                }
            }
            if status == LinkOrientation::Unknown {
                self.enable_link_to(neighbor);
                return Some(neighbor);
            }
        }
        None
    }

    /// Whether plain selection (no on-demand reversal) finds a next hop. May claim an
    /// unoriented link as a side effect, exactly like [`Self::candidate_next_hop`].
    fn has_next_hop(&mut self) -> bool {
        self.candidate_next_hop().is_some()
    }

    /*
     * Control messages
     */

    /// Classify a received payload and process it if it is a control message.
    pub(crate) fn recv_service_message<T: Default>(
        &mut self,
        payload: &[u8],
        origin: Ipv4Addr,
    ) -> (RecvStatus, Vec<Event<T>>) {
        let Some(msg) = ServiceMessage::from_payload(payload) else {
            return (RecvStatus::NotService, Vec::new());
        };
        match msg {
            ServiceMessage::AckSend => {
                trace!("ACK request delivered from {origin}");
                // a probe over an edge we consider outbound means both ends point at each
                // other: a cycle is forming
                let was_outbound = self.orientation(origin) == Some(LinkOrientation::Outbound);
                let mut events = self.disable_link_to(origin, false);
                if was_outbound {
                    debug!("cycle observed towards {origin}");
                    *self.cycle_counter.entry(origin).or_insert(0) += 1;
                    return (RecvStatus::Error, events);
                }
                events.extend(self.service_event_to(origin, ServiceMessage::AckRecv));
                (RecvStatus::Service, events)
            }
            ServiceMessage::AckRecv => {
                trace!("ACK response delivered from {origin}");
                // the link is alive: cancel the pending timeout
                self.pending_probe.remove(&origin);
                self.enable_link_to(origin);
                (RecvStatus::Service, Vec::new())
            }
            ServiceMessage::HelloSend => {
                trace!("HELLO delivered from {origin}");
                let mut events = self.apply_hello_orientation(origin);
                if let Some(iface) = self.iface {
                    let jitter = self.rng.reply.gen_range(0..HELLO_JITTER);
                    events.push(Event::timer(
                        T::default(),
                        iface.local,
                        jitter,
                        TimerKind::HelloReply { to: origin },
                    ));
                }
                (RecvStatus::Service, events)
            }
            ServiceMessage::HelloRecv => {
                trace!("HELLO response delivered from {origin}");
                // no further response: this terminates the handshake
                (RecvStatus::Service, self.apply_hello_orientation(origin))
            }
            ServiceMessage::ReversalSend => {
                trace!("reversal notice delivered from {origin}");
                (RecvStatus::Service, self.disable_link_to(origin, false))
            }
        }
    }

    /// Handle one of this node's own timers.
    pub(crate) fn handle_timer<T: Default>(&mut self, kind: TimerKind) -> Vec<Event<T>> {
        match kind {
            TimerKind::HelloStart => {
                let events = self
                    .broadcast_service_event(ServiceMessage::HelloSend)
                    .into_iter()
                    .collect();
                self.initialized = true;
                events
            }
            TimerKind::HelloReply { to } => self
                .service_event_to(to, ServiceMessage::HelloRecv)
                .into_iter()
                .collect(),
            TimerKind::ProbeTimeout { neighbor, token } => {
                if self.pending_probe.get(&neighbor) != Some(&token) {
                    // cancelled or superseded
                    return Vec::new();
                }
                self.pending_probe.remove(&neighbor);
                debug!("probe towards {neighbor} timed out");
                self.disable_link_to(neighbor, false)
            }
        }
    }

    /// Tie-break rule applied to HELLO and HELLO responses: the lower address points at the
    /// higher one. The bootstrap-time disable never triggers a reversal.
    fn apply_hello_orientation<T: Default>(&mut self, origin: Ipv4Addr) -> Vec<Event<T>> {
        let Some(iface) = self.iface else {
            return Vec::new();
        };
        if iface.local < origin {
            self.enable_link_to(origin);
            Vec::new()
        } else {
            self.disable_link_to(origin, true)
        }
    }

    /// Probe `neighbor` after forwarding data through it: send an ACK request and schedule the
    /// link-down timeout, unless a probe is already outstanding.
    fn send_ack_request<T: Default>(&mut self, neighbor: Ipv4Addr) -> Vec<Event<T>> {
        if self.pending_probe.contains_key(&neighbor) {
            return Vec::new();
        }
        let mut events = Vec::new();
        events.extend(self.service_event_to(neighbor, ServiceMessage::AckSend));
        if let Some(iface) = self.iface {
            let token = ProbeToken(self.next_token);
            self.next_token += 1;
            self.pending_probe.insert(neighbor, token);
            events.push(Event::timer(
                T::default(),
                iface.local,
                PROBE_TIMEOUT,
                TimerKind::ProbeTimeout { neighbor, token },
            ));
            trace!("ACK request sent from {} to {neighbor}", iface.local);
        }
        events
    }

    /*
     * Frame construction
     */

    /// Build the transmission of a single service frame to `dst` (ttl 1, own source).
    fn service_event_to<T: Default>(
        &mut self,
        dst: Ipv4Addr,
        msg: ServiceMessage,
    ) -> Option<Event<T>> {
        let iface = self.iface?;
        let uid = self.next_uid;
        self.next_uid += 1;
        let header = Ipv4Header::new(iface.local, dst);
        Some(Event::packet(
            T::default(),
            iface.local,
            dst,
            header,
            Packet::new(uid, msg.as_bytes()),
        ))
    }

    /// Build the transmission of a service frame to the subnet broadcast address.
    fn broadcast_service_event<T: Default>(&mut self, msg: ServiceMessage) -> Option<Event<T>> {
        let dst = self.iface?.broadcast;
        self.service_event_to(dst, msg)
    }

    /*
     * Diagnostics
     */

    /// Write one line per neighbor: `self\tneighbor\torientation`, with the orientation encoded
    /// as -1 (unknown), 0 (inbound) or 1 (outbound).
    pub fn print_routing_table(&self, stream: &mut impl io::Write) -> io::Result<()> {
        let Some(iface) = self.iface else {
            return Ok(());
        };
        for neighbor in self.neighbors.iter() {
            let status = self
                .link_status
                .get(neighbor)
                .copied()
                .unwrap_or(LinkOrientation::Inbound);
            writeln!(stream, "{}\t{}\t{}", iface.local, neighbor, status)?;
        }
        Ok(())
    }
}
