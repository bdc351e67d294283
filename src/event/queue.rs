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

//! Module containing the definitions for the event queues.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::types::SimTime;

use super::Event;

/// Interface of an event queue.
///
/// *Note*: A custom `EventQueue` implementation is allowed to drop events that are pushed into
/// the queue. This filtering can be done in `push` or `pop`. In case it is done in `pop`, then
/// the functions `peek`, `len`, and `is_empty` are not required to apply the filter, but can
/// overestimate the queue.
pub trait EventQueue {
    /// Type of the priority.
    type Priority: Default + FmtPriority + Clone;

    /// Enqueue a new event.
    fn push(&mut self, event: Event<Self::Priority>);

    /// Enqueue multiple events at once.
    fn push_many(&mut self, events: Vec<Event<Self::Priority>>) {
        events.into_iter().for_each(|e| self.push(e))
    }

    /// Pop the next event.
    fn pop(&mut self) -> Option<Event<Self::Priority>>;

    /// peek the next event.
    ///
    /// *Note*: `Self::peek` is allowed to return an event that is actually not returned by
    /// `Self::pop`. You must, however, maintain the invariant that `Self::peek` **cannot**
    /// return `None` while `Self::pop` returns `Some(e)`.
    fn peek(&self) -> Option<&Event<Self::Priority>>;

    /// Get the number of enqueued events
    ///
    /// *Note*: `Self::len` is allowed to overapproximate the number of events that are actually
    /// returned by `Self::pop`. You must, however, maintain the invariant that `Self::len`
    /// **cannot** return 0 while `Self::pop` returns `Some(e)`.
    fn len(&self) -> usize;

    /// Return `True` if no event is enqueued.
    ///
    /// *Note*: `Self::is_empty` is allowed to return `false`, even through `Self::pop` will
    /// return `None`. This function, however, is not allowed to return `true` while `Self::pop`
    /// returns `Some(e)`.
    fn is_empty(&self) -> bool {
        self.peek().is_none()
    }

    /// Remove all events from the queue.
    fn clear(&mut self);

    /// Get the current time of the queue in simulated milliseconds.
    fn get_time(&self) -> Option<SimTime>;
}

/// Display type for Priority
pub trait FmtPriority {
    /// Display the priority
    fn fmt(&self) -> String;
}

impl FmtPriority for SimTime {
    fn fmt(&self) -> String {
        format!("(time: {self}ms)")
    }
}

impl FmtPriority for () {
    fn fmt(&self) -> String {
        String::new()
    }
}

/// Time-ordered event queue.
///
/// Every pushed event is stamped with `now + event.delay()`. Events fire in order of their
/// stamp; events with the same stamp fire in FIFO order of insertion (guaranteed by a
/// monotonically increasing sequence number in the key).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingQueue {
    #[serde_as(as = "Vec<(_, _)>")]
    events: BTreeMap<(SimTime, u64), Event<SimTime>>,
    seq: u64,
    now: SimTime,
}

impl Default for TimingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingQueue {
    /// Create a new empty event queue starting at time zero.
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            seq: 0,
            now: 0,
        }
    }
}

impl EventQueue for TimingQueue {
    type Priority = SimTime;

    fn push(&mut self, mut event: Event<Self::Priority>) {
        let fire = self.now + event.delay();
        *event.priority_mut() = fire;
        self.events.insert((fire, self.seq), event);
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<Event<Self::Priority>> {
        let ((fire, _), event) = self.events.pop_first()?;
        self.now = fire;
        Some(event)
    }

    fn peek(&self) -> Option<&Event<Self::Priority>> {
        self.events.first_key_value().map(|(_, e)| e)
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn clear(&mut self) {
        self.events.clear()
    }

    fn get_time(&self) -> Option<SimTime> {
        Some(self.now)
    }
}
