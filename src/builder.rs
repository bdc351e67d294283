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

//! Module for generating default network setups: address assignment, random streams, and
//! simple test topologies.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::debug;

use crate::{
    network::Network,
    types::{InterfaceAddress, Ipv4Config, NetworkError, RouterId},
};

/// Trait for generating default network setups quickly.
pub trait NetworkBuilder {
    /// Assign one address per router, consecutively from the host range of `base`, in router-id
    /// order. The last added router carries the highest address; make that one the sink.
    /// Every node receives its L3 snapshot and the interface-up notification, which makes it
    /// cache its local and broadcast address. Returns the assigned addresses in router-id
    /// order.
    fn build_addresses(&mut self, base: Ipv4Net) -> Result<Vec<Ipv4Addr>, NetworkError>;

    /// Seed the random streams of every router, consecutively starting at `first_stream`, in
    /// router-id order. Returns the number of streams consumed (two per router).
    fn build_streams(&mut self, first_stream: u64) -> u64;

    /// Add `n` routers named `node-0` to `node-(n-1)`, connected in a line in that order.
    /// Returns the new router ids.
    fn build_line(&mut self, n: usize) -> Result<Vec<RouterId>, NetworkError>;
}

impl<Q> NetworkBuilder for Network<Q> {
    fn build_addresses(&mut self, base: Ipv4Net) -> Result<Vec<Ipv4Addr>, NetworkError> {
        let broadcast = base.broadcast();
        let mut hosts = base.hosts();
        let mut assigned = Vec::with_capacity(self.routers.len());
        self.addrs.clear();
        self.broadcast = Some(broadcast);
        for (id, router) in self.routers.iter_mut() {
            let local = hosts.next().ok_or(NetworkError::AddressPoolExhausted)?;
            debug!("assign {local} to {:?} ({})", id, router.name());
            router.lra.set_ipv4(Ipv4Config::with_radio_address(InterfaceAddress {
                local,
                broadcast,
            }));
            router.lra.notify_interface_up(1);
            self.addrs.insert(local, *id);
            assigned.push(local);
        }
        Ok(assigned)
    }

    fn build_streams(&mut self, first_stream: u64) -> u64 {
        let mut consumed = 0;
        for router in self.routers.values_mut() {
            consumed += router.lra.assign_streams(first_stream + consumed);
        }
        consumed
    }

    fn build_line(&mut self, n: usize) -> Result<Vec<RouterId>, NetworkError> {
        let ids: Vec<RouterId> = (0..n).map(|i| self.add_router(format!("node-{i}"))).collect();
        for (a, b) in ids.iter().zip(ids.iter().skip(1)) {
            self.add_link(*a, *b)?;
        }
        Ok(ids)
    }
}
