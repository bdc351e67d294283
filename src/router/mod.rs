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

//! Module defining a single network node: the host stack glue around the routing process.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::{
    event::Event,
    types::{DeviceError, Ipv4Route, RouterId, TTL_MAX},
};

mod lra_process;

pub use lra_process::{
    LraProcess, RecvStatus, CYCLE_THRESHOLD, HELLO_JITTER, HELLO_STAGGER, PROBE_TIMEOUT,
    SINK_HELLO_DELAY,
};

/// The outcome of a handled event: what happened to the frame (if it was one), and the events
/// that must be enqueued.
pub(crate) type EventOutcome<T> = (RouteOutcome, Vec<Event<T>>);

/// What a router did with a frame handed to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteOutcome {
    /// The event was not a frame, or caused no reportable action.
    None,
    /// The frame was delivered to the local host stack.
    Delivered {
        /// The originating node.
        origin: Ipv4Addr,
        /// Packet id.
        uid: u64,
    },
    /// The frame was relayed towards the sink.
    Forwarded {
        /// The elected next hop.
        next_hop: Ipv4Addr,
        /// Packet id.
        uid: u64,
    },
    /// Next-hop selection failed; the frame was reported on the error callback.
    NoRoute {
        /// Packet id.
        uid: u64,
    },
    /// The frame was dropped silently (node not initialized, expired hop budget, looped-back
    /// frame, or a suppressed control message).
    Dropped {
        /// Packet id.
        uid: u64,
    },
}

/// A single node of the ad-hoc network: a name, a graph id, and the routing process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    /// Name of the router
    name: String,
    /// ID of the router
    router_id: RouterId,
    /// The link-reversal routing process
    pub lra: LraProcess,
}

impl Router {
    pub(crate) fn new(name: String, router_id: RouterId) -> Router {
        Router {
            name,
            router_id,
            lra: LraProcess::new(),
        }
    }

    /// Return the idx of the Router
    pub fn router_id(&self) -> RouterId {
        self.router_id
    }

    /// Return the name of the Router
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Set the name of the router.
    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// handle an `Event`. Timers go straight to the routing process. Frames go through
    /// `route_input`; a unicast-forward decision is turned back into a transmission here, with
    /// the host-side hop accounting applied (bump the consumed budget, drop the frame once it
    /// exceeds [`TTL_MAX`]).
    pub(crate) fn handle_event<T: Default>(
        &mut self,
        event: Event<T>,
    ) -> Result<EventOutcome<T>, DeviceError> {
        let Some(local) = self.lra.address() else {
            return Err(DeviceError::NotConfigured(self.router_id));
        };
        match event {
            Event::Timer { node, kind, .. } if node == local => {
                Ok((RouteOutcome::None, self.lra.handle_timer(kind)))
            }
            Event::Packet {
                dst,
                header,
                packet,
                ..
            } if dst == local || Some(dst) == self.lra.broadcast_address() => {
                let mut forwards: Vec<Ipv4Route> = Vec::new();
                let mut delivered = false;
                let mut no_route = false;
                let (_, mut events) = self.lra.route_input(
                    &packet,
                    &header,
                    1,
                    |route, _, _| forwards.push(*route),
                    |_, _, _| (),
                    |_, _, _| delivered = true,
                    |_, _, _| no_route = true,
                );

                let mut outcome = if delivered {
                    RouteOutcome::Delivered {
                        origin: header.source,
                        uid: packet.uid,
                    }
                } else if no_route {
                    RouteOutcome::NoRoute { uid: packet.uid }
                } else {
                    RouteOutcome::Dropped { uid: packet.uid }
                };

                for route in forwards {
                    let ttl = header.ttl.saturating_add(1);
                    if ttl > TTL_MAX {
                        log::debug!("hop budget of packet {} exhausted at {local}", packet.uid);
                        outcome = RouteOutcome::Dropped { uid: packet.uid };
                        continue;
                    }
                    let mut fwd_header = header;
                    fwd_header.ttl = ttl;
                    outcome = RouteOutcome::Forwarded {
                        next_hop: route.gateway,
                        uid: packet.uid,
                    };
                    events.push(Event::packet(
                        T::default(),
                        local,
                        route.gateway,
                        fwd_header,
                        packet.clone(),
                    ));
                }

                Ok((outcome, events))
            }
            e => Err(DeviceError::WrongRouter(local, e.router())),
        }
    }
}
