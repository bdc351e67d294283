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

//! # Top-level Network module
//!
//! This module represents the ad-hoc network topology, drives the discrete-event simulation,
//! and models the wireless channel: a transmission reaches exactly the current radio neighbors
//! of the transmitter (all of them for a broadcast, the addressed one for a unicast), after a
//! fixed propagation delay. Out-of-range and blocked frames vanish silently.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::net::Ipv4Addr;

use itertools::Itertools;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    event::{Event, EventQueue, TimingQueue},
    router::{RouteOutcome, Router},
    types::{
        Ipv4Header, NetworkError, Packet, PhysicalNetwork, RouterId, SimTime, SocketError,
    },
};

static DEFAULT_STOP_AFTER: usize = 1_000_000;

/// One recorded routing action: which node did what, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Simulated time of the action (if the queue tracks time).
    pub time: Option<SimTime>,
    /// The node that acted.
    pub router: Ipv4Addr,
    /// What it did.
    pub outcome: RouteOutcome,
}

/// # Network struct
/// The struct contains the physical ad-hoc topology (radio adjacency), manages all routers, and
/// handles all events between them.
///
/// ```rust
/// use lrasim::prelude::*;
///
/// fn main() -> Result<(), NetworkError> {
///     // create an empty network.
///     let mut net = Network::default();
///
///     // add two nodes within radio range of each other.
///     let r1 = net.add_router("r1");
///     let r2 = net.add_router("r2");
///     net.add_link(r1, r2)?;
///
///     Ok(())
/// }
/// ```
///
/// ## Type arguments
///
/// The [`Network`] accepts one type attribute: the kind of [`EventQueue`] used to order the
/// events. The default [`TimingQueue`] fires events by simulated time with FIFO order among
/// ties, which is what the protocol timers (staggered HELLOs, 100ms probes) rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "Q: serde::Serialize",
    deserialize = "Q: for<'a> serde::Deserialize<'a>"
))]
pub struct Network<Q = TimingQueue> {
    pub(crate) net: PhysicalNetwork,
    pub(crate) routers: BTreeMap<RouterId, Router>,
    pub(crate) addrs: BTreeMap<Ipv4Addr, RouterId>,
    pub(crate) broadcast: Option<Ipv4Addr>,
    pub(crate) sink: Option<Ipv4Addr>,
    pub(crate) blocked: BTreeSet<(RouterId, RouterId)>,
    pub(crate) stop_after: Option<usize>,
    pub(crate) queue: Q,
    pub(crate) skip_queue: bool,
    pub(crate) next_uid: u64,
    pub(crate) trace: Vec<TraceEntry>,
}

impl Default for Network<TimingQueue> {
    fn default() -> Self {
        Self::new(TimingQueue::new())
    }
}

impl<Q> Network<Q> {
    /// Generate an empty Network
    pub fn new(queue: Q) -> Self {
        Self {
            net: PhysicalNetwork::default(),
            routers: BTreeMap::new(),
            addrs: BTreeMap::new(),
            broadcast: None,
            sink: None,
            blocked: BTreeSet::new(),
            stop_after: Some(DEFAULT_STOP_AFTER),
            queue,
            skip_queue: false,
            next_uid: 0,
            trace: Vec::new(),
        }
    }

    /// Add a new router to the network. This function returns the ID of the router.
    pub fn add_router(&mut self, name: impl Into<String>) -> RouterId {
        let router_id = self.net.add_node(());
        let router = Router::new(name.into(), router_id);
        self.routers.insert(router_id, router);
        router_id
    }

    /// Set the router name.
    pub fn set_router_name(
        &mut self,
        router: RouterId,
        name: impl Into<String>,
    ) -> Result<(), NetworkError> {
        self.routers
            .get_mut(&router)
            .ok_or(NetworkError::DeviceNotFound(router))?
            .set_name(name.into());
        Ok(())
    }

    /// Return an iterator over all router ids.
    pub fn indices(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.routers.keys().copied()
    }

    /// Return an iterator over all routers.
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.routers.values()
    }

    /// Get a reference to a router.
    pub fn get_router(&self, router: RouterId) -> Result<&Router, NetworkError> {
        self.routers
            .get(&router)
            .ok_or(NetworkError::DeviceNotFound(router))
    }

    /// Get a mutable reference to a router.
    pub(crate) fn get_router_mut(&mut self, router: RouterId) -> Result<&mut Router, NetworkError> {
        self.routers
            .get_mut(&router)
            .ok_or(NetworkError::DeviceNotFound(router))
    }

    /// Get the router owning the given address.
    pub fn get_router_by_address(&self, address: Ipv4Addr) -> Result<&Router, NetworkError> {
        let id = *self
            .addrs
            .get(&address)
            .ok_or(NetworkError::UnknownAddress(address))?;
        self.get_router(id)
    }

    /// The address assigned to the given router.
    pub fn address_of(&self, router: RouterId) -> Result<Ipv4Addr, NetworkError> {
        self.get_router(router)?
            .lra
            .address()
            .ok_or(NetworkError::AddressesNotAssigned(router))
    }

    /// The subnet broadcast address, once addresses are assigned.
    pub fn broadcast_address(&self) -> Option<Ipv4Addr> {
        self.broadcast
    }

    /// The sink address, once [`Network::initialize`] was called.
    pub fn sink_address(&self) -> Option<Ipv4Addr> {
        self.sink
    }

    /// The number of routers in the network.
    pub fn num_devices(&self) -> usize {
        self.routers.len()
    }

    /// All radio links as pairs of router ids, in ascending order.
    pub fn links(&self) -> Vec<(RouterId, RouterId)> {
        self.net
            .edge_indices()
            .filter_map(|e| self.net.edge_endpoints(e))
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
            .sorted()
            .collect()
    }

    /// Setup the network to stop simulating after `stop_after` events have been executed, and
    /// return a [`NetworkError::NoConvergence`] error. Set to `None` to disable this behavior.
    pub fn set_msg_limit(&mut self, stop_after: Option<usize>) {
        self.stop_after = stop_after;
    }

    /// Get a reference to the queue
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Get a mutable reference to the queue
    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    /// Setup the network to automatically drain the event queue after each change. This is the
    /// default behavior.
    pub fn auto_simulation(&mut self) {
        self.skip_queue = false;
    }

    /// Setup the network not to drain the event queue automatically. Events accumulate until
    /// [`Network::simulate`] or [`Network::simulate_step`] is called.
    pub fn manual_simulation(&mut self) {
        self.skip_queue = true;
    }

    /// Returns `true` if auto-simulation is enabled.
    pub fn auto_simulation_enabled(&self) -> bool {
        !self.skip_queue
    }

    /// The recorded routing actions (deliveries, forwards, drops) in order of occurrence.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Forget all recorded routing actions.
    pub fn clear_trace(&mut self) {
        self.trace.clear()
    }

    /*
     * Topology changes
     */

    /// Bring two routers into radio range of each other.
    pub fn add_link(&mut self, a: RouterId, b: RouterId) -> Result<(), NetworkError> {
        self.get_router(a)?;
        self.get_router(b)?;
        if self.net.find_edge(a, b).is_some() {
            return Err(NetworkError::LinkAlreadyExists(a, b));
        }
        self.net.add_edge(a, b, ());
        Ok(())
    }

    /// Move two routers out of radio range of each other. Frames already in flight are lost at
    /// reception time.
    pub fn remove_link(&mut self, a: RouterId, b: RouterId) -> Result<(), NetworkError> {
        let edge = self
            .net
            .find_edge(a, b)
            .ok_or(NetworkError::LinkNotFound(a, b))?;
        debug!("remove the link between {a:?} and {b:?}");
        self.net.remove_edge(edge);
        Ok(())
    }

    /// Drop every frame transmitted by `from` towards `to` (unidirectional loss). The reverse
    /// direction is unaffected.
    pub fn block_link(&mut self, from: RouterId, to: RouterId) -> Result<(), NetworkError> {
        self.get_router(from)?;
        self.get_router(to)?;
        debug!("block all frames from {from:?} to {to:?}");
        self.blocked.insert((from, to));
        Ok(())
    }

    /// Stop dropping frames transmitted by `from` towards `to`.
    pub fn unblock_link(&mut self, from: RouterId, to: RouterId) -> Result<(), NetworkError> {
        self.blocked.remove(&(from, to));
        Ok(())
    }

    /*
     * Serialization
     */

    /// Export the network (including all enqueued events) as a JSON string.
    pub fn as_json_str(&self) -> String
    where
        Q: Serialize,
    {
        serde_json::to_string(self).expect("Cannot serialize the network")
    }

    /// Import a network from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, NetworkError>
    where
        Q: for<'a> Deserialize<'a>,
    {
        serde_json::from_str(json).map_err(|e| NetworkError::JsonError(e.to_string()))
    }
}

impl<Q: EventQueue> Network<Q> {
    /// Initialize the routing protocol on every node: each node learns the sink address and
    /// schedules its staggered bootstrap HELLO (`index * 1000ms` plus jitter; 1ms for the sink
    /// itself). The index is the position of the node in id order, so with
    /// [`crate::builder::NetworkBuilder::build_addresses`] the sink should be the
    /// highest-address (last added) node.
    ///
    /// In auto-simulation mode this also runs the whole bootstrap to completion.
    pub fn initialize(&mut self, sink: RouterId) -> Result<(), NetworkError> {
        let sink_addr = self.address_of(sink)?;
        self.sink = Some(sink_addr);
        let mut events = Vec::new();
        for (index, router) in self.routers.values_mut().enumerate() {
            events.extend(router.lra.initialize_node(sink_addr, index as u32));
        }
        self.queue.push_many(events);
        self.do_queue_maybe_skip()
    }

    /// Originate a data packet at `src` towards `dst` and (in auto-simulation mode) simulate
    /// until the network is quiet again. The packet starts with a consumed hop budget of 1;
    /// every relay adds one.
    ///
    /// Returns a `NoRouteToHost` error if the source has no usable next hop even after an
    /// on-demand reversal.
    pub fn send_data(
        &mut self,
        src: RouterId,
        dst: RouterId,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), NetworkError> {
        let src_addr = self.address_of(src)?;
        let dst_addr = self.address_of(dst)?;
        let header = Ipv4Header::new(src_addr, dst_addr);
        let uid = self.next_uid;
        self.next_uid += 1;
        let packet = Packet::new(uid, payload);

        let (route, events) = self.get_router_mut(src)?.lra.route_output(&header);
        self.queue.push_many(events);
        match route {
            Ok(route) if route.destination == src_addr => {
                // the host hands the packet straight back up, no radio involved
                self.trace.push(TraceEntry {
                    time: self.queue.get_time(),
                    router: src_addr,
                    outcome: RouteOutcome::Delivered {
                        origin: src_addr,
                        uid,
                    },
                });
                self.do_queue_maybe_skip()
            }
            Ok(route) => {
                trace!("{src_addr} originates packet {uid} via {}", route.gateway);
                self.queue.push(Event::packet(
                    Q::Priority::default(),
                    src_addr,
                    route.gateway,
                    header,
                    packet,
                ));
                self.do_queue_maybe_skip()
            }
            Err(SocketError::NoRouteToHost) => {
                // still flush the reversal announcement the failed election may have caused
                self.do_queue_maybe_skip()?;
                Err(SocketError::NoRouteToHost.into())
            }
        }
    }

    /// Simulate the network behavior, given the current event queue. This function will execute
    /// all events (which may trigger new events), until either the event queue is empty (i.e.,
    /// the network is quiet), or until the maximum allowed events have been processed (which
    /// can be set by `self.set_msg_limit`).
    pub fn simulate(&mut self) -> Result<(), NetworkError> {
        let mut remaining = self.stop_after;
        while self.simulate_step()?.is_some() {
            if let Some(remaining) = remaining.as_mut() {
                if *remaining == 0 {
                    return Err(NetworkError::NoConvergence);
                }
                *remaining -= 1;
            }
        }
        Ok(())
    }

    /// Simulate the next event on the queue. In comparison to [`Network::simulate`], this
    /// function will not execute any subsequent event. Returns the processed event, or `None`
    /// if the queue was empty.
    pub fn simulate_step(&mut self) -> Result<Option<Event<Q::Priority>>, NetworkError> {
        let Some(event) = self.queue.pop() else {
            return Ok(None);
        };
        let time = self.queue.get_time();
        match &event {
            Event::Timer { node, kind, .. } => {
                trace!("timer {kind:?} fires on {node} at {time:?}");
                let node = *node;
                let router = self.router_by_addr_mut(node)?;
                let (_, events) = router.handle_event(event.clone())?;
                self.queue.push_many(events);
            }
            Event::Packet { src, dst, .. } => {
                let receivers = self.receivers_of(*src, *dst);
                let mut events = Vec::new();
                for receiver in receivers {
                    let router = self
                        .routers
                        .get_mut(&receiver)
                        .ok_or(NetworkError::DeviceNotFound(receiver))?;
                    let (outcome, mut new_events) = router.handle_event(event.clone())?;
                    events.append(&mut new_events);
                    if outcome != RouteOutcome::None {
                        if let Some(addr) = self.routers[&receiver].lra.address() {
                            self.trace.push(TraceEntry {
                                time,
                                router: addr,
                                outcome,
                            });
                        }
                    }
                }
                self.queue.push_many(events);
            }
        }
        Ok(Some(event))
    }

    /// Dump the routing table of every node (one `self\tneighbor\torientation` line per
    /// neighbor) to the given stream.
    pub fn print_routing_tables(&self, stream: &mut impl io::Write) -> io::Result<()> {
        for router in self.routers.values() {
            router.lra.print_routing_table(stream)?;
        }
        Ok(())
    }

    /// The nodes that receive a frame transmitted by `src` towards the link-level destination
    /// `dst`, applying the radio model at reception time: all current unblocked neighbors for
    /// a broadcast, the addressed neighbor (if in range and unblocked) for a unicast. The
    /// receivers are sorted by address, which keeps broadcast processing deterministic.
    fn receivers_of(&self, src: Ipv4Addr, dst: Ipv4Addr) -> Vec<RouterId> {
        let Some(src_id) = self.addrs.get(&src).copied() else {
            return Vec::new();
        };
        if Some(dst) == self.broadcast {
            self.net
                .neighbors(src_id)
                .filter(|n| !self.blocked.contains(&(src_id, *n)))
                .map(|n| (self.routers[&n].lra.address(), n))
                .sorted()
                .map(|(_, n)| n)
                .collect()
        } else {
            let Some(dst_id) = self.addrs.get(&dst).copied() else {
                return Vec::new();
            };
            if self.net.find_edge(src_id, dst_id).is_some()
                && !self.blocked.contains(&(src_id, dst_id))
            {
                vec![dst_id]
            } else {
                trace!("frame from {src} to {dst} lost (out of range or blocked)");
                Vec::new()
            }
        }
    }

    fn router_by_addr_mut(&mut self, address: Ipv4Addr) -> Result<&mut Router, NetworkError> {
        let id = *self
            .addrs
            .get(&address)
            .ok_or(NetworkError::UnknownAddress(address))?;
        self.get_router_mut(id)
    }

    pub(crate) fn do_queue_maybe_skip(&mut self) -> Result<(), NetworkError> {
        if self.skip_queue {
            return Ok(());
        }
        self.simulate()
    }
}
