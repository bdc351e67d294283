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

//! Per-node delivery counters.

use serde::{Deserialize, Serialize};

/// Accumulators for the running average hop count of locally delivered data packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Sum of the hop metric over all delivered data packets.
    pub hop_sum: f64,
    /// Number of delivered data packets.
    pub packets_received: u64,
}

impl Telemetry {
    /// Record the delivery of one data packet with the given hop metric.
    pub fn record(&mut self, hops: f64) {
        self.hop_sum += hops;
        self.packets_received += 1;
    }

    /// The average hop metric, or 0 if nothing was delivered yet.
    pub fn average_hop_count(&self) -> f64 {
        if self.packets_received == 0 {
            return 0.0;
        }
        self.hop_sum / self.packets_received as f64
    }
}
