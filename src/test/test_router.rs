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

//! Unit tests of the routing process, without a network around it.

use crate::event::{Event, TimerKind};
use crate::message::ServiceMessage;
use crate::router::{LraProcess, RecvStatus};
use crate::types::{
    InterfaceAddress, Ipv4Config, Ipv4Header, Ipv4Route, LinkOrientation, Packet, SocketError,
};

use super::{bcast, ip};

/// A process with a configured interface, not yet bootstrapped.
fn process(host: u8) -> LraProcess {
    let mut p = LraProcess::new();
    p.set_ipv4(Ipv4Config::with_radio_address(InterfaceAddress {
        local: ip(host),
        broadcast: bcast(),
    }));
    p.notify_interface_up(1);
    p
}

/// A process that has sent its bootstrap HELLO and participates in routing.
fn bootstrapped(host: u8, sink: u8, index: u32) -> LraProcess {
    let mut p = process(host);
    let events: Vec<Event<()>> = p.initialize_node(ip(sink), index);
    assert_eq!(events.len(), 1);
    let hello: Vec<Event<()>> = p.handle_timer(TimerKind::HelloStart);
    assert_eq!(hello.len(), 1);
    assert!(p.is_initialized());
    p
}

/// Feed a frame into `route_input` and collect what the callbacks saw.
#[allow(clippy::type_complexity)]
fn input(
    p: &mut LraProcess,
    payload: &[u8],
    header: &Ipv4Header,
) -> (bool, Vec<Event<()>>, Option<Ipv4Route>, bool, bool) {
    let mut forwarded = None;
    let mut delivered = false;
    let mut no_route = false;
    let packet = Packet::new(0, payload.to_vec());
    let (consumed, events) = p.route_input(
        &packet,
        header,
        1,
        |route, _, _| forwarded = Some(*route),
        |_, _, _| (),
        |_, _, _| delivered = true,
        |_, _, _| no_route = true,
    );
    (consumed, events, forwarded, delivered, no_route)
}

fn probe_timeout_of(events: &[Event<()>]) -> TimerKind {
    events
        .iter()
        .find_map(|e| match e {
            Event::Timer {
                kind: kind @ TimerKind::ProbeTimeout { .. },
                ..
            } => Some(*kind),
            _ => None,
        })
        .expect("no probe timeout scheduled")
}

fn is_service_frame(event: &Event<()>, msg: ServiceMessage) -> bool {
    matches!(event, Event::Packet { packet, .. } if packet.payload == msg.as_bytes())
}

#[test]
fn hello_tie_break() {
    // the lower address points at the higher one
    let mut a = bootstrapped(1, 3, 0);
    let (status, events) =
        a.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(2));
    assert_eq!(status, RecvStatus::Service);
    assert_eq!(a.orientation(ip(2)), Some(LinkOrientation::Outbound));
    // a HELLO schedules the jittered response
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Event::Timer {
            kind: TimerKind::HelloReply { to },
            ..
        } if to == ip(2)
    ));

    let mut b = bootstrapped(2, 3, 1);
    let (status, events) =
        b.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(1));
    assert_eq!(status, RecvStatus::Service);
    assert_eq!(b.orientation(ip(1)), Some(LinkOrientation::Inbound));
    // the bootstrap-time disable must not demote the node
    assert!(b.is_initialized());
    assert_eq!(events.len(), 1);
}

#[test]
fn hello_response_terminates_the_handshake() {
    // a HELLO response orients the link but never triggers a further response
    let mut a = bootstrapped(1, 3, 0);
    let (status, events) =
        a.recv_service_message::<()>(ServiceMessage::HelloRecv.as_bytes(), ip(2));
    assert_eq!(status, RecvStatus::Service);
    assert_eq!(a.orientation(ip(2)), Some(LinkOrientation::Outbound));
    assert!(events.is_empty());

    let mut b = bootstrapped(2, 3, 1);
    let (_, events) = b.recv_service_message::<()>(ServiceMessage::HelloRecv.as_bytes(), ip(1));
    assert_eq!(b.orientation(ip(1)), Some(LinkOrientation::Inbound));
    assert!(events.is_empty());
}

#[test]
fn enable_disable_enable_is_clean() {
    let mut p = bootstrapped(1, 3, 0);
    p.enable_link_to(ip(2));
    let _: Vec<Event<()>> = p.disable_link_to(ip(2), true);
    p.enable_link_to(ip(2));
    assert_eq!(p.orientation(ip(2)), Some(LinkOrientation::Outbound));
    assert!(p.pending_probes().is_empty());
}

#[test]
fn reversal_flips_every_neighbor() {
    let mut p = bootstrapped(1, 9, 0);
    let _: Vec<Event<()>> = p.disable_link_to(ip(2), true);
    p.init_link_to(ip(4));
    p.enable_link_to(ip(5));
    p.link_reversal();
    for (neighbor, orientation) in p.link_status() {
        assert_eq!(
            *orientation,
            LinkOrientation::Outbound,
            "{neighbor} not outbound after reversal"
        );
    }
}

#[test]
fn sink_never_elects_a_next_hop() {
    let mut s = bootstrapped(3, 3, 2);
    assert!(s.is_sink());
    let _ = s.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(1));
    let _ = s.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(2));
    assert_eq!(s.orientation(ip(1)), Some(LinkOrientation::Inbound));
    assert_eq!(s.orientation(ip(2)), Some(LinkOrientation::Inbound));

    let (hop, events) = s.next_hop::<()>();
    assert_eq!(hop, None);
    // the on-demand path still floods the (pointless) reversal notice, like the original
    assert_eq!(events.len(), 1);
    assert!(is_service_frame(&events[0], ServiceMessage::ReversalSend));
    // but the sink itself never flips a link outbound
    assert_eq!(s.orientation(ip(1)), Some(LinkOrientation::Inbound));
    assert_eq!(s.orientation(ip(2)), Some(LinkOrientation::Inbound));
}

#[test]
fn forwarding_arms_a_probe() {
    let mut a = bootstrapped(2, 9, 0);
    let _ = a.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(5));
    let header = Ipv4Header::new(ip(1), ip(9));
    let (consumed, events, forwarded, _, _) = input(&mut a, b"some data", &header);
    assert!(consumed);
    let route = forwarded.expect("data for the sink must be forwarded");
    assert_eq!(route.gateway, ip(5));
    assert_eq!(route.source, ip(1));
    assert_eq!(route.output_device, 1);
    assert!(a.has_pending_probe(ip(5)));
    assert!(events
        .iter()
        .any(|e| is_service_frame(e, ServiceMessage::AckSend)));
    probe_timeout_of(&events);
}

#[test]
fn probe_response_cancels_the_timeout() {
    let mut a = bootstrapped(2, 9, 0);
    let _ = a.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(5));
    let header = Ipv4Header::new(ip(1), ip(9));
    let (_, events, _, _, _) = input(&mut a, b"some data", &header);
    let timeout = probe_timeout_of(&events);

    let (status, _) = a.recv_service_message::<()>(ServiceMessage::AckRecv.as_bytes(), ip(5));
    assert_eq!(status, RecvStatus::Service);
    assert!(!a.has_pending_probe(ip(5)));
    assert_eq!(a.orientation(ip(5)), Some(LinkOrientation::Outbound));

    // the cancelled timeout fires as a no-op
    let events: Vec<Event<()>> = a.handle_timer(timeout);
    assert!(events.is_empty());
    assert_eq!(a.orientation(ip(5)), Some(LinkOrientation::Outbound));
    assert!(a.is_initialized());
}

#[test]
fn probe_timeout_declares_the_link_down() {
    let mut a = bootstrapped(2, 9, 0);
    let _ = a.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(5));
    let header = Ipv4Header::new(ip(1), ip(9));
    let (_, events, _, _, _) = input(&mut a, b"some data", &header);
    let timeout = probe_timeout_of(&events);

    let events: Vec<Event<()>> = a.handle_timer(timeout);
    // the disable leaves no outbound link, so the node reverses: the dead neighbor is
    // outbound again and the reversal is flooded
    assert_eq!(a.orientation(ip(5)), Some(LinkOrientation::Outbound));
    assert!(events
        .iter()
        .any(|e| is_service_frame(e, ServiceMessage::ReversalSend)));
    assert!(!a.has_pending_probe(ip(5)));
    assert!(a.is_initialized());
}

#[test]
fn no_duplicate_probe_while_pending() {
    let mut a = bootstrapped(2, 9, 0);
    let _ = a.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(5));
    let header = Ipv4Header::new(ip(1), ip(9));
    let (_, first, _, _, _) = input(&mut a, b"data 1", &header);
    assert!(!first.is_empty());
    let (consumed, second, forwarded, _, _) = input(&mut a, b"data 2", &header);
    assert!(consumed);
    assert!(forwarded.is_some());
    // forwarded again, but no second ACK request and no second timer
    assert!(second.is_empty());
}

#[test]
fn cycle_suppression() {
    let mut a = bootstrapped(1, 9, 0);
    let _ = a.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(2));
    assert_eq!(a.orientation(ip(2)), Some(LinkOrientation::Outbound));

    for round in 1..=3u32 {
        let (status, events) =
            a.recv_service_message::<()>(ServiceMessage::AckSend.as_bytes(), ip(2));
        assert_eq!(status, RecvStatus::Error);
        assert_eq!(a.cycle_count(ip(2)), round);
        // no ACK response goes out on a detected cycle
        assert!(!events
            .iter()
            .any(|e| is_service_frame(e, ServiceMessage::AckRecv)));
        // the disable emptied the outbound set, so the reversal restored the link
        assert_eq!(a.orientation(ip(2)), Some(LinkOrientation::Outbound));
        assert!(a.is_initialized());
    }

    // three observations permanently exclude the neighbor
    let (hop, _) = a.next_hop::<()>();
    assert_eq!(hop, None);

    // the next bilateral observation finds no usable fallback: the node is a component
    // disconnected from the sink and stops routing
    let (status, _) = a.recv_service_message::<()>(ServiceMessage::AckSend.as_bytes(), ip(2));
    assert_eq!(status, RecvStatus::Error);
    assert!(!a.is_initialized());
}

#[test]
fn ack_over_inbound_link_is_answered() {
    let mut b = bootstrapped(5, 9, 0);
    let _ = b.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(2));
    let _ = b.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(7));
    assert_eq!(b.orientation(ip(2)), Some(LinkOrientation::Inbound));
    assert_eq!(b.orientation(ip(7)), Some(LinkOrientation::Outbound));
    let (status, events) = b.recv_service_message::<()>(ServiceMessage::AckSend.as_bytes(), ip(2));
    assert_eq!(status, RecvStatus::Service);
    assert_eq!(events.len(), 1);
    assert!(is_service_frame(&events[0], ServiceMessage::AckRecv));
    assert_eq!(b.cycle_count(ip(2)), 0);
}

#[test]
fn looped_back_hello_is_ignored() {
    let mut p = bootstrapped(1, 3, 0);
    let header = Ipv4Header::new(ip(1), bcast());
    let (consumed, events, _, delivered, _) =
        input(&mut p, ServiceMessage::HelloSend.as_bytes(), &header);
    assert!(!consumed);
    assert!(!delivered);
    assert!(events.is_empty());
    assert!(p.neighbors().is_empty());
    assert!(p.link_status().is_empty());
}

#[test]
fn packets_are_dropped_before_bootstrap() {
    let mut p = process(1);
    let header = Ipv4Header::new(ip(2), ip(1));
    let (consumed, events, _, delivered, _) = input(&mut p, b"data", &header);
    assert!(!consumed);
    assert!(!delivered);
    assert!(events.is_empty());
    assert_eq!(p.telemetry().packets_received, 0);
}

#[test]
fn expired_packets_are_dropped() {
    let mut p = bootstrapped(1, 3, 0);
    let mut header = Ipv4Header::new(ip(2), ip(1));
    header.ttl = 0;
    let (consumed, _, _, delivered, _) = input(&mut p, b"data", &header);
    assert!(!consumed);
    assert!(!delivered);
    assert_eq!(p.telemetry().packets_received, 0);
}

#[test]
fn route_output_branches() {
    let mut p = bootstrapped(2, 9, 0);

    // to self: local delivery on interface 1
    let (route, events) = p.route_output::<()>(&Ipv4Header::new(ip(2), ip(2)));
    let route = route.unwrap();
    assert_eq!(route.gateway, ip(2));
    assert_eq!(route.output_device, 1);
    assert!(events.is_empty());

    // neither self nor sink: a direct-send service frame, gateway is the destination
    let (route, _) = p.route_output::<()>(&Ipv4Header::new(ip(2), ip(7)));
    assert_eq!(route.unwrap().gateway, ip(7));

    // to the sink without any neighbor: no route
    let (route, events) = p.route_output::<()>(&Ipv4Header::new(ip(2), ip(9)));
    assert_eq!(route, Err(SocketError::NoRouteToHost));
    assert!(events.is_empty());

    // to the sink once a neighbor is oriented
    let _ = p.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(5));
    let (route, _) = p.route_output::<()>(&Ipv4Header::new(ip(2), ip(9)));
    assert_eq!(route.unwrap().gateway, ip(5));
}

#[test]
fn service_frames_are_also_delivered_locally() {
    let mut p = bootstrapped(2, 9, 0);
    let header = Ipv4Header::new(ip(4), bcast());
    let (consumed, _, _, delivered, _) =
        input(&mut p, ServiceMessage::HelloSend.as_bytes(), &header);
    assert!(consumed);
    assert!(delivered);
    // control traffic is not data: the hop accumulators stay untouched
    assert_eq!(p.telemetry().packets_received, 0);

    // except when a cycle is detected: the frame is consumed without local delivery
    p.enable_link_to(ip(4));
    let header = Ipv4Header::new(ip(4), ip(2));
    let (consumed, _, _, delivered, _) =
        input(&mut p, ServiceMessage::AckSend.as_bytes(), &header);
    assert!(!consumed);
    assert!(!delivered);
}

#[test]
fn reversal_notice_cascades_only_when_needed() {
    let mut p = bootstrapped(1, 9, 0);
    let _ = p.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(4));
    let _ = p.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(5));

    // a reversal of one neighbor leaves the other outbound: no cascade
    let (_, events) =
        p.recv_service_message::<()>(ServiceMessage::ReversalSend.as_bytes(), ip(4));
    assert_eq!(p.orientation(ip(4)), Some(LinkOrientation::Inbound));
    assert!(events.is_empty());

    // losing the last outbound link reverses and floods
    let (_, events) =
        p.recv_service_message::<()>(ServiceMessage::ReversalSend.as_bytes(), ip(5));
    assert_eq!(events.len(), 1);
    assert!(is_service_frame(&events[0], ServiceMessage::ReversalSend));
    assert_eq!(p.orientation(ip(4)), Some(LinkOrientation::Outbound));
    assert_eq!(p.orientation(ip(5)), Some(LinkOrientation::Outbound));
}

#[test]
fn hop_metric_accumulates() {
    let mut sink = bootstrapped(9, 9, 3);
    let mut header = Ipv4Header::new(ip(1), ip(9));
    header.ttl = 2;
    let (consumed, _, _, delivered, _) = input(&mut sink, b"data", &header);
    assert!(consumed);
    assert!(delivered);
    header.ttl = 3;
    let _ = input(&mut sink, b"data", &header);
    assert_eq!(sink.telemetry().packets_received, 2);
    assert_eq!(sink.telemetry().hop_sum, 123.0);
    assert_eq!(sink.average_hop_count(), 61.5);
}

#[test]
fn unknown_links_are_claimed_on_selection() {
    let mut p = bootstrapped(1, 9, 0);
    p.init_link_to(ip(4));
    assert_eq!(p.orientation(ip(4)), Some(LinkOrientation::Unknown));
    let (hop, events) = p.next_hop::<()>();
    assert_eq!(hop, Some(ip(4)));
    assert!(events.is_empty());
    assert_eq!(p.orientation(ip(4)), Some(LinkOrientation::Outbound));
}

#[test]
fn selection_prefers_the_highest_address() {
    let mut p = bootstrapped(1, 9, 0);
    p.enable_link_to(ip(3));
    p.enable_link_to(ip(7));
    p.enable_link_to(ip(5));
    let (hop, _) = p.next_hop::<()>();
    assert_eq!(hop, Some(ip(7)));
}

#[test]
fn data_for_other_destinations_is_refused() {
    let mut p = bootstrapped(2, 9, 0);
    let header = Ipv4Header::new(ip(1), ip(6));
    let (consumed, _, forwarded, _, no_route) = input(&mut p, b"data", &header);
    assert!(!consumed);
    assert!(forwarded.is_none());
    assert!(no_route);
}

#[test]
fn assign_streams_is_deterministic() {
    let mut a = process(1);
    let mut b = process(1);
    assert_eq!(a.assign_streams(7), 2);
    assert_eq!(b.assign_streams(7), 2);
    let ea: Vec<Event<()>> = a.initialize_node(ip(9), 2);
    let eb: Vec<Event<()>> = b.initialize_node(ip(9), 2);
    assert_eq!(ea, eb);
}

#[test]
fn routing_table_dump() {
    let mut p = bootstrapped(1, 9, 0);
    let _ = p.recv_service_message::<()>(ServiceMessage::HelloSend.as_bytes(), ip(2));
    p.init_link_to(ip(4));
    let mut out = Vec::new();
    p.print_routing_table(&mut out).unwrap();
    let table = String::from_utf8(out).unwrap();
    pretty_assertions::assert_eq!(table, "10.0.0.1\t10.0.0.2\t1\n10.0.0.1\t10.0.0.4\t-1\n");
}
