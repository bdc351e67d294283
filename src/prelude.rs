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

//! Convenience re-export of common members

pub use crate::builder::NetworkBuilder;
pub use crate::event::{Event, EventQueue, TimerKind, TimingQueue};
pub use crate::message::ServiceMessage;
pub use crate::network::{Network, TraceEntry};
pub use crate::router::{LraProcess, RouteOutcome, Router};
pub use crate::telemetry::Telemetry;
pub use crate::types::{
    InterfaceAddress, Ipv4Config, Ipv4Header, Ipv4Route, LinkOrientation, NetworkError, Packet,
    RouterId, SimTime, SocketError, TTL_MAX,
};
