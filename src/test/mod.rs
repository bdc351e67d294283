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

use std::net::Ipv4Addr;

use crate::{network::Network, types::LinkOrientation};

/// Construct an address in `10.0.0.0/8`.
fn ip(host: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, host)
}

/// The broadcast address of `10.0.0.0/8`.
fn bcast() -> Ipv4Addr {
    Ipv4Addr::new(10, 255, 255, 255)
}

/// Assert the universal per-node invariants that must hold at every event boundary: no node
/// lists itself or the broadcast address as a neighbor, every orientation / cycle / probe table
/// key is a known neighbor, and the sink never orients a link outbound.
fn assert_node_invariants<Q>(net: &Network<Q>) {
    let broadcast = net.broadcast_address();
    let sink = net.sink_address();
    for router in net.routers() {
        let lra = &router.lra;
        let Some(local) = lra.address() else {
            continue;
        };
        assert!(
            !lra.neighbors().contains(&local),
            "{local} lists itself as a neighbor"
        );
        if let Some(broadcast) = broadcast {
            assert!(
                !lra.neighbors().contains(&broadcast),
                "{local} lists the broadcast address as a neighbor"
            );
        }
        for key in lra.link_status().keys() {
            assert!(lra.neighbors().contains(key), "{local}: stray link status");
        }
        for key in lra.cycle_counters().keys() {
            assert!(lra.neighbors().contains(key), "{local}: stray cycle counter");
        }
        for key in lra.pending_probes().keys() {
            assert!(lra.neighbors().contains(key), "{local}: stray pending probe");
        }
        if Some(local) == sink {
            assert!(
                !lra
                    .link_status()
                    .values()
                    .any(|o| *o == LinkOrientation::Outbound),
                "the sink holds an outbound link"
            );
        }
    }
}

mod test_message;
mod test_router;
