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

use crate::message::*;

#[test]
fn classify_service_payloads() {
    assert_eq!(
        ServiceMessage::from_payload(b"LRA_HELLO_SEND_MESSAGE"),
        Some(ServiceMessage::HelloSend)
    );
    assert_eq!(
        ServiceMessage::from_payload(b"LRA_HELLO_RECV_MESSAGE"),
        Some(ServiceMessage::HelloRecv)
    );
    assert_eq!(
        ServiceMessage::from_payload(b"LRA_ACK_SEND_MESSAGE"),
        Some(ServiceMessage::AckSend)
    );
    assert_eq!(
        ServiceMessage::from_payload(b"LRA_ACK_RECV_MESSAGE"),
        Some(ServiceMessage::AckRecv)
    );
    assert_eq!(
        ServiceMessage::from_payload(b"LRA_REVERSAL_SEND_MESSAGE"),
        Some(ServiceMessage::ReversalSend)
    );
}

#[test]
fn classification_is_exact() {
    // anything that is not byte-for-byte one of the five tokens is data
    assert_eq!(ServiceMessage::from_payload(b""), None);
    assert_eq!(ServiceMessage::from_payload(b"hello world"), None);
    assert_eq!(ServiceMessage::from_payload(b"LRA_HELLO_SEND"), None);
    assert_eq!(ServiceMessage::from_payload(b"LRA_HELLO_SEND_MESSAGE "), None);
    assert_eq!(ServiceMessage::from_payload(b"lra_hello_send_message"), None);
    // a trailing NUL is not part of the token
    assert_eq!(ServiceMessage::from_payload(b"LRA_ACK_SEND_MESSAGE\0"), None);
}

#[test]
fn wire_representation() {
    assert_eq!(ServiceMessage::HelloSend.as_str(), HELLO_SEND_MESSAGE);
    assert_eq!(ServiceMessage::AckRecv.as_bytes(), ACK_RECV_MESSAGE.as_bytes());
    assert_eq!(
        ServiceMessage::ReversalSend.to_string(),
        "LRA_REVERSAL_SEND_MESSAGE"
    );
}
